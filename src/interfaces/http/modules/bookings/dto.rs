//! Booking DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::interfaces::http::modules::payments::PaymentDto;

/// Request to create a booking
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub room_id: i64,
    /// First night of the stay (ISO 8601 date)
    #[schema(value_type = String, example = "2026-09-03")]
    pub check_in_date: NaiveDate,
    /// Day of departure, exclusive (ISO 8601 date)
    #[schema(value_type = String, example = "2026-09-05")]
    pub check_out_date: NaiveDate,
}

/// Booking list filters. `user_id` and unfiltered listing are
/// staff-only; guests always see just their own bookings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingListQuery {
    pub user_id: Option<i64>,
    pub room_id: Option<i64>,
    /// Booked, Active, Completed, Cancelled or No show
    pub status: Option<String>,
    /// Bookings with check-in on or after this date
    pub from_date: Option<NaiveDate>,
    /// Bookings with check-out on or before this date
    pub to_date: Option<NaiveDate>,
    /// Single, Double or Suite
    pub room_type: Option<String>,
}

/// Booking details with room, guest and payment context
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDto {
    pub id: i64,
    pub room_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub user_id: i64,
    pub user_email: String,
    #[schema(value_type = String, example = "2026-09-03")]
    pub check_in_date: NaiveDate,
    #[schema(value_type = String, example = "2026-09-05")]
    pub check_out_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub actual_check_out_date: Option<NaiveDate>,
    /// Booked, Active, Completed, Cancelled or No show
    pub status: String,
    #[schema(value_type = String, example = "100.00")]
    pub price_per_night: Decimal,
    pub total_nights: i64,
    #[schema(value_type = String, example = "200.00")]
    pub total_price: Decimal,
    pub created_at: String,
    pub payments: Vec<PaymentDto>,
}
