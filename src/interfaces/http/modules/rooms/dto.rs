//! Room DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::room::Room;

/// Room details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDto {
    pub id: i64,
    pub number: String,
    /// Single, Double or Suite
    pub room_type: String,
    #[schema(value_type = String, example = "100.00")]
    pub price_per_night: Decimal,
    pub capacity: i32,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            number: room.number,
            room_type: room.room_type.as_str().to_string(),
            price_per_night: room.price_per_night,
            capacity: room.capacity,
        }
    }
}

/// Request to create a room
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 20))]
    pub number: String,
    /// Single, Double or Suite (case-insensitive)
    pub room_type: String,
    #[schema(value_type = String, example = "100.00")]
    pub price_per_night: Decimal,
    #[validate(range(min = 1, max = 10))]
    pub capacity: i32,
}

/// Request to update a room; omitted fields keep their values
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoomRequest {
    /// Single, Double or Suite (case-insensitive)
    pub room_type: Option<String>,
    #[schema(value_type = Option<String>, example = "120.00")]
    pub price_per_night: Option<Decimal>,
    #[validate(range(min = 1, max = 10))]
    pub capacity: Option<i32>,
}
