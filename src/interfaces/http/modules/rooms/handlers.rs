//! Room management API handlers
//!
//! Listing and fetching rooms is open to any authenticated user;
//! create, update and delete are staff-only.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;

use super::dto::{CreateRoomRequest, RoomDto, UpdateRoomRequest};
use crate::domain::room::{Room, RoomType};
use crate::domain::{DomainError, RepositoryProvider};
use crate::interfaces::http::common::{ApiError, ApiResponse, EmptyData, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct RoomHandlerState {
    pub repos: Arc<dyn RepositoryProvider>,
}

fn require_staff(auth: &AuthenticatedUser) -> Result<(), ApiError> {
    if auth.is_staff {
        Ok(())
    } else {
        Err(ApiError(DomainError::Forbidden(
            "Only staff can manage rooms.".to_string(),
        )))
    }
}

fn parse_room_type(raw: &str) -> Result<RoomType, ApiError> {
    RoomType::from_str(raw).ok_or_else(|| {
        ApiError(DomainError::Validation(format!(
            "Unknown room type: {}",
            raw
        )))
    })
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price <= Decimal::ZERO {
        return Err(ApiError(DomainError::Validation(
            "Price per night must be positive.".to_string(),
        )));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All rooms", body = ApiResponse<Vec<RoomDto>>)
    )
)]
pub async fn list_rooms(
    State(state): State<RoomHandlerState>,
) -> Result<Json<ApiResponse<Vec<RoomDto>>>, ApiError> {
    let rooms = state.repos.rooms().list().await?;
    Ok(Json(ApiResponse::success(
        rooms.into_iter().map(RoomDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room details", body = ApiResponse<RoomDto>),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room(
    State(state): State<RoomHandlerState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RoomDto>>, ApiError> {
    let room = state
        .repos
        .rooms()
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "Room",
            field: "id",
            value: id.to_string(),
        })?;
    Ok(Json(ApiResponse::success(RoomDto::from(room))))
}

#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = ApiResponse<RoomDto>),
        (status = 403, description = "Not staff"),
        (status = 409, description = "Room number already exists")
    )
)]
pub async fn create_room(
    State(state): State<RoomHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomDto>>), ApiError> {
    require_staff(&auth)?;
    let room_type = parse_room_type(&request.room_type)?;
    validate_price(request.price_per_night)?;

    if state
        .repos
        .rooms()
        .find_by_number(&request.number)
        .await?
        .is_some()
    {
        return Err(ApiError(DomainError::Conflict(format!(
            "room number {}",
            request.number
        ))));
    }

    let room = state
        .repos
        .rooms()
        .save(Room::new(
            request.number,
            room_type,
            request.price_per_night,
            request.capacity,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RoomDto::from(room))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Room id")),
    request_body = UpdateRoomRequest,
    responses(
        (status = 200, description = "Room updated", body = ApiResponse<RoomDto>),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn update_room(
    State(state): State<RoomHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateRoomRequest>,
) -> Result<Json<ApiResponse<RoomDto>>, ApiError> {
    require_staff(&auth)?;

    let mut room = state
        .repos
        .rooms()
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "Room",
            field: "id",
            value: id.to_string(),
        })?;

    if let Some(raw) = &request.room_type {
        room.room_type = parse_room_type(raw)?;
    }
    if let Some(price) = request.price_per_night {
        validate_price(price)?;
        // Existing bookings keep their snapshotted price.
        room.price_per_night = price;
    }
    if let Some(capacity) = request.capacity {
        room.capacity = capacity;
    }

    state.repos.rooms().update(&room).await?;
    Ok(Json(ApiResponse::success(RoomDto::from(room))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room deleted", body = ApiResponse<EmptyData>),
        (status = 403, description = "Not staff"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn delete_room(
    State(state): State<RoomHandlerState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EmptyData>>, ApiError> {
    require_staff(&auth)?;
    state.repos.rooms().delete(id).await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
