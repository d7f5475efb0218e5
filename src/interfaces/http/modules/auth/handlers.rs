//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use crate::domain::user::User;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub jwt_config: JwtConfig,
}

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn internal_error(message: impl std::fmt::Display) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(message.to_string())),
    )
}

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_staff: user.is_staff,
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserInfo>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), HandlerError> {
    let existing = state
        .repos
        .users()
        .find_by_email(&request.email)
        .await
        .map_err(internal_error)?;
    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::error("Email is already registered")),
        ));
    }

    let password_hash = hash_password(&request.password).map_err(internal_error)?;

    // Self-registration always creates a guest account; staff flags
    // are assigned out of band.
    let user = state
        .repos
        .users()
        .save(User::new(
            request.email,
            request.first_name,
            request.last_name,
            password_hash,
            false,
        ))
        .await
        .map_err(internal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user_info(&user))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, HandlerError> {
    let invalid_credentials = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid credentials")),
        )
    };

    let user = state
        .repos
        .users()
        .find_by_email(&request.email)
        .await
        .map_err(internal_error)?
        .ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&request.password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        return Err(invalid_credentials());
    }

    let token = create_token(user.id, &user.email, user.is_staff, &state.jwt_config)
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_config.expiration_hours * 3600,
        user: user_info(&user),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserInfo>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UserInfo>>, HandlerError> {
    let user = state
        .repos
        .users()
        .find_by_id(auth.user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("User not found")),
            )
        })?;

    Ok(Json(ApiResponse::success(user_info(&user))))
}
