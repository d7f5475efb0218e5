//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::room::RoomRepository;
use crate::domain::user::UserRepository;

use super::booking_repository::SeaOrmBookingRepository;
use super::payment_repository::SeaOrmPaymentRepository;
use super::room_repository::SeaOrmRoomRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let booking = repos.bookings().find_by_id(1).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    bookings: SeaOrmBookingRepository,
    payments: SeaOrmPaymentRepository,
    rooms: SeaOrmRoomRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            bookings: SeaOrmBookingRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db.clone()),
            rooms: SeaOrmRoomRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn rooms(&self) -> &dyn RoomRepository {
        &self.rooms
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}
