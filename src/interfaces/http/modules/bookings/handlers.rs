//! Booking lifecycle API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use super::dto::{BookingDto, BookingListQuery, CreateBookingRequest};
use crate::application::services::{BookingService, CreateBooking};
use crate::domain::booking::{Booking, BookingFilter, BookingStatus};
use crate::domain::room::RoomType;
use crate::domain::{DomainError, RepositoryProvider};
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::payments::PaymentDto;

#[derive(Clone)]
pub struct BookingHandlerState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub bookings: Arc<BookingService>,
}

/// Strict status parse for filters; the lenient repository-side parse
/// would silently turn typos into a Cancelled filter.
fn parse_status(raw: &str) -> Result<BookingStatus, ApiError> {
    for status in [
        BookingStatus::Booked,
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
    ] {
        if raw == status.as_str() {
            return Ok(status);
        }
    }
    Err(ApiError(DomainError::Validation(format!(
        "Unknown booking status: {}",
        raw
    ))))
}

async fn to_dto(repos: &dyn RepositoryProvider, booking: Booking) -> Result<BookingDto, ApiError> {
    let room = repos.rooms().find_by_id(booking.room_id).await?;
    let user = repos.users().find_by_id(booking.user_id).await?;
    let payments = repos.payments().list_for_booking(booking.id).await?;

    let (room_number, room_type) = room
        .map(|r| (r.number, r.room_type.as_str().to_string()))
        .unwrap_or_default();

    Ok(BookingDto {
        id: booking.id,
        room_id: booking.room_id,
        room_number,
        room_type,
        user_id: booking.user_id,
        user_email: user.map(|u| u.email).unwrap_or_default(),
        check_in_date: booking.check_in_date,
        check_out_date: booking.check_out_date,
        actual_check_out_date: booking.actual_check_out_date,
        status: booking.status.as_str().to_string(),
        price_per_night: booking.price_per_night,
        total_nights: booking.nights(),
        total_price: booking.total_price(),
        created_at: booking.created_at.to_rfc3339(),
        payments: payments.into_iter().map(PaymentDto::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<BookingDto>),
        (status = 400, description = "Invalid dates, room unavailable or pending payment exists"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn create_booking(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), ApiError> {
    let booking = state
        .bookings
        .create(
            auth.actor(),
            CreateBooking {
                room_id: request.room_id,
                check_in_date: request.check_in_date,
                check_out_date: request.check_out_date,
            },
            Utc::now().date_naive(),
        )
        .await?;

    let dto = to_dto(state.repos.as_ref(), booking).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings visible to the caller", body = ApiResponse<Vec<BookingDto>>)
    )
)]
pub async fn list_bookings(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Vec<BookingDto>>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let room_type = query
        .room_type
        .as_deref()
        .map(|raw| {
            RoomType::from_str(raw).ok_or_else(|| {
                ApiError(DomainError::Validation(format!(
                    "Unknown room type: {}",
                    raw
                )))
            })
        })
        .transpose()?;

    let filter = BookingFilter {
        user_id: query.user_id,
        room_id: query.room_id,
        status,
        from_date: query.from_date,
        to_date: query.to_date,
        room_type,
    };

    let bookings = state.bookings.list(auth.actor(), filter).await?;
    let mut dtos = Vec::with_capacity(bookings.len());
    for booking in bookings {
        dtos.push(to_dto(state.repos.as_ref(), booking).await?);
    }
    Ok(Json(ApiResponse::success(dtos)))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found or not visible")
    )
)]
pub async fn get_booking(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state.bookings.get(auth.actor(), id).await?;
    let dto = to_dto(state.repos.as_ref(), booking).await?;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/check-in",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Check-in accepted, stay charge queued", body = ApiResponse<BookingDto>),
        (status = 400, description = "Outside the stay window or wrong status"),
        (status = 404, description = "Booking not found or not visible")
    )
)]
pub async fn check_in(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state
        .bookings
        .check_in(auth.actor(), id, Utc::now().date_naive())
        .await?;
    let dto = to_dto(state.repos.as_ref(), booking).await?;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Cancelled, or cancellation fee queued", body = ApiResponse<BookingDto>),
        (status = 400, description = "Not cancellable"),
        (status = 404, description = "Booking not found or not visible")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state
        .bookings
        .cancel(auth.actor(), id, Utc::now().date_naive())
        .await?;
    let dto = to_dto(state.repos.as_ref(), booking).await?;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/check-out",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Completed, or overstay fee queued", body = ApiResponse<BookingDto>),
        (status = 400, description = "Booking is not active"),
        (status = 404, description = "Booking not found or not visible")
    )
)]
pub async fn check_out(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state
        .bookings
        .check_out(auth.actor(), id, Utc::now().date_naive())
        .await?;
    let dto = to_dto(state.repos.as_ref(), booking).await?;
    Ok(Json(ApiResponse::success(dto)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/no-show",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking flagged as no-show", body = ApiResponse<BookingDto>),
        (status = 400, description = "Not a no-show candidate"),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn mark_no_show(
    State(state): State<BookingHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state
        .bookings
        .mark_no_show(auth.actor(), id, Utc::now().date_naive())
        .await?;
    let dto = to_dto(state.repos.as_ref(), booking).await?;
    Ok(Json(ApiResponse::success(dto)))
}
