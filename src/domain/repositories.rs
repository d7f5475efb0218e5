//! Unified repository access for use-case services

use crate::domain::booking::BookingRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::room::RoomRepository;
use crate::domain::user::UserRepository;

/// Per-aggregate repository accessors behind one provider.
///
/// Services hold an `Arc<dyn RepositoryProvider>` so the same code
/// runs against SeaORM in production and the in-memory provider in
/// tests.
pub trait RepositoryProvider: Send + Sync {
    fn bookings(&self) -> &dyn BookingRepository;

    fn payments(&self) -> &dyn PaymentRepository;

    fn rooms(&self) -> &dyn RoomRepository;

    fn users(&self) -> &dyn UserRepository;
}
