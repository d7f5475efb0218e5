//! Payment API handlers
//!
//! Listing, renewal of expired payments and the settlement webhook.
//! The webhook verifies an HMAC signature over the raw body before
//! any JSON parsing.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use tracing::warn;

use super::dto::{
    CheckoutWebhookPayload, PaymentDto, RedirectMessageDto, SessionRedirectQuery,
    WebhookOutcomeDto,
};
use crate::application::services::{PaymentService, SettlementOutcome};
use crate::domain::DomainError;
use crate::infrastructure::crypto::webhook::verify_signature;
use crate::interfaces::http::common::{ApiError, ApiResponse};
use crate::interfaces::http::middleware::AuthenticatedUser;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Clone)]
pub struct PaymentHandlerState {
    pub payments: Arc<PaymentService>,
    pub webhook_secret: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "Payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments visible to the caller", body = ApiResponse<Vec<PaymentDto>>)
    )
)]
pub async fn list_payments(
    State(state): State<PaymentHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<PaymentDto>>>, ApiError> {
    let payments = state.payments.list(auth.actor()).await?;
    Ok(Json(ApiResponse::success(
        payments.into_iter().map(PaymentDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "Payments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment details", body = ApiResponse<PaymentDto>),
        (status = 404, description = "Payment not found or not visible")
    )
)]
pub async fn get_payment(
    State(state): State<PaymentHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let payment = state.payments.get(id, auth.actor()).await?;
    Ok(Json(ApiResponse::success(PaymentDto::from(payment))))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/renew",
    tag = "Payments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Expired payment id")),
    responses(
        (status = 200, description = "Fresh pending payment with a new session", body = ApiResponse<PaymentDto>),
        (status = 400, description = "Payment is not expired"),
        (status = 404, description = "Payment not found or not visible")
    )
)]
pub async fn renew_payment(
    State(state): State<PaymentHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PaymentDto>>, ApiError> {
    let payment = state.payments.renew(id, auth.actor()).await?;
    Ok(Json(ApiResponse::success(PaymentDto::from(payment))))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    tag = "Payments",
    request_body = CheckoutWebhookPayload,
    responses(
        (status = 200, description = "Settlement processed", body = ApiResponse<WebhookOutcomeDto>),
        (status = 400, description = "Missing or invalid signature, or malformed payload"),
        (status = 404, description = "Unknown session id")
    )
)]
pub async fn checkout_webhook(
    State(state): State<PaymentHandlerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<WebhookOutcomeDto>>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError(DomainError::Validation(
                "Missing webhook signature".to_string(),
            ))
        })?;

    if !verify_signature(&state.webhook_secret, &body, signature) {
        warn!("Rejected settlement webhook with bad signature");
        return Err(ApiError(DomainError::Validation(
            "Invalid webhook signature".to_string(),
        )));
    }

    let payload: CheckoutWebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError(DomainError::Validation(format!("Malformed payload: {}", e))))?;

    let outcome = state
        .payments
        .handle_session_completed(&payload.session_id, Utc::now().date_naive())
        .await?;

    let outcome = match outcome {
        SettlementOutcome::Settled => "settled",
        SettlementOutcome::Replayed => "replayed",
    };
    Ok(Json(ApiResponse::success(WebhookOutcomeDto {
        outcome: outcome.to_string(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/success",
    tag = "Payments",
    params(SessionRedirectQuery),
    responses(
        (status = 200, description = "Landing page after a completed checkout", body = ApiResponse<RedirectMessageDto>)
    )
)]
pub async fn payment_success(
    Query(query): Query<SessionRedirectQuery>,
) -> (StatusCode, Json<ApiResponse<RedirectMessageDto>>) {
    // Informational only; settlement itself arrives via the webhook.
    let message = match query.session_id {
        Some(session_id) => format!("Payment for session {} received; thank you.", session_id),
        None => "Payment received; thank you.".to_string(),
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(RedirectMessageDto { message })),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/cancel",
    tag = "Payments",
    responses(
        (status = 200, description = "Landing page after an abandoned checkout", body = ApiResponse<RedirectMessageDto>)
    )
)]
pub async fn payment_cancel() -> (StatusCode, Json<ApiResponse<RedirectMessageDto>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(RedirectMessageDto {
            message: "Payment was cancelled; the charge remains pending.".to_string(),
        })),
    )
}
