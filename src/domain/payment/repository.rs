//! Payment repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Payment, PaymentType};
use crate::domain::DomainResult;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new payment, returning it with its assigned id.
    async fn save(&self, payment: Payment) -> DomainResult<Payment>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Payment>>;

    async fn update(&self, payment: &Payment) -> DomainResult<()>;

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Payment>>;

    /// The Pending or Paid payment for this (booking, type), if any.
    /// Expired payments are ignored: a replacement may be created.
    async fn find_open_for_booking(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> DomainResult<Option<Payment>>;

    async fn list_for_booking(&self, booking_id: i64) -> DomainResult<Vec<Payment>>;

    /// All payments, optionally restricted to one user's bookings.
    async fn list(&self, user_id: Option<i64>) -> DomainResult<Vec<Payment>>;

    /// Whether any booking of this user has a Pending payment.
    async fn user_has_pending(&self, user_id: i64) -> DomainResult<bool>;

    /// Pending payments created before the cutoff.
    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Payment>>;
}
