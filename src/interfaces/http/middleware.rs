//! Authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::user::Actor;
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims};
use crate::interfaces::http::common::ApiResponse;

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

/// Authentication state for the middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Authenticated user information extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub is_staff: bool,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Option<Self> {
        Some(Self {
            user_id: claims.sub.parse().ok()?,
            email: claims.email,
            is_staff: claims.is_staff,
        })
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_staff: self.is_staff,
        }
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(&auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => {
            if claims.is_expired() {
                return auth_error_response(AuthError::ExpiredToken);
            }
            let Some(user) = AuthenticatedUser::from_claims(claims) else {
                return auth_error_response(AuthError::InvalidToken);
            };
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(_) => auth_error_response(AuthError::InvalidToken),
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingToken => "Missing authorization token",
        AuthError::InvalidToken => "Invalid authorization token",
        AuthError::ExpiredToken => "Token has expired",
    };
    let body = ApiResponse::<()>::error(message);
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
