//! Shared API plumbing: response envelope, error mapping, validation

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard response envelope for every REST endpoint.
///
/// On success: `{"success": true, "data": {...}}`,
/// on failure: `{"success": false, "error": "description"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub success: bool,
    /// Payload; `null` on error
    pub data: Option<T>,
    /// Error description; `null` on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty response for operations without return data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}

/// Domain error wrapper that renders as an enveloped HTTP response.
///
/// Handlers return `Result<Json<ApiResponse<T>>, ApiError>` and use
/// `?` on service calls.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Validation(msg) if msg.starts_with("Database error:") => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        };
        let body = ApiResponse::<()>::error(self.0.to_string());
        (status, Json(body)).into_response()
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError(DomainError::NotFound {
            entity: "Booking",
            field: "id",
            value: "7".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn guard_failure_maps_to_400() {
        let err = ApiError(DomainError::Validation(
            "Check-in date cannot be in the past.".to_string(),
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn db_failure_maps_to_500() {
        let err = ApiError(DomainError::Validation(
            "Database error: connection closed".to_string(),
        ));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
