//! Booking repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{Booking, BookingStatus};
use crate::domain::room::RoomType;
use crate::domain::DomainResult;

/// Filters for listing bookings. `user_id` is forced to the caller's
/// own id for non-staff actors before it reaches the repository.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<i64>,
    pub room_id: Option<i64>,
    pub status: Option<BookingStatus>,
    /// Bookings with `check_in_date >= from_date`
    pub from_date: Option<NaiveDate>,
    /// Bookings with `check_out_date <= to_date`
    pub to_date: Option<NaiveDate>,
    pub room_type: Option<RoomType>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking, returning it with its assigned id.
    async fn save(&self, booking: Booking) -> DomainResult<Booking>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>>;

    async fn update(&self, booking: &Booking) -> DomainResult<()>;

    /// Bookings on the room with status Booked or Active whose
    /// `[check_in, check_out)` interval intersects the given one.
    async fn find_overlapping(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> DomainResult<Vec<Booking>>;

    async fn list(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>>;

    /// Booked bookings whose check-in date is before `today`.
    async fn find_no_show_candidates(&self, today: NaiveDate) -> DomainResult<Vec<Booking>>;
}
