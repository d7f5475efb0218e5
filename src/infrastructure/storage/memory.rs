//! In-memory repository provider for development and testing

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;

use crate::domain::booking::{Booking, BookingFilter, BookingRepository};
use crate::domain::payment::{Payment, PaymentRepository, PaymentStatus, PaymentType};
use crate::domain::room::{Room, RoomRepository};
use crate::domain::user::{User, UserRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

struct Store {
    bookings: DashMap<i64, Booking>,
    payments: DashMap<i64, Payment>,
    rooms: DashMap<i64, Room>,
    users: DashMap<i64, User>,
    booking_counter: AtomicI64,
    payment_counter: AtomicI64,
    room_counter: AtomicI64,
    user_counter: AtomicI64,
}

impl Store {
    fn new() -> Self {
        Self {
            bookings: DashMap::new(),
            payments: DashMap::new(),
            rooms: DashMap::new(),
            users: DashMap::new(),
            booking_counter: AtomicI64::new(1),
            payment_counter: AtomicI64::new(1),
            room_counter: AtomicI64::new(1),
            user_counter: AtomicI64::new(1),
        }
    }
}

fn not_found(entity: &'static str, id: i64) -> DomainError {
    DomainError::NotFound {
        entity,
        field: "id",
        value: id.to_string(),
    }
}

// ── Booking repository ──────────────────────────────────────────

struct InMemoryBookingRepository {
    store: Arc<Store>,
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save(&self, mut b: Booking) -> DomainResult<Booking> {
        b.id = self.store.booking_counter.fetch_add(1, Ordering::SeqCst);
        self.store.bookings.insert(b.id, b.clone());
        Ok(b)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>> {
        Ok(self.store.bookings.get(&id).map(|b| b.clone()))
    }

    async fn update(&self, b: &Booking) -> DomainResult<()> {
        if !self.store.bookings.contains_key(&b.id) {
            return Err(not_found("Booking", b.id));
        }
        self.store.bookings.insert(b.id, b.clone());
        Ok(())
    }

    async fn find_overlapping(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> DomainResult<Vec<Booking>> {
        Ok(self
            .store
            .bookings
            .iter()
            .filter(|b| {
                b.room_id == room_id
                    && b.blocks_availability()
                    && b.overlaps(check_in, check_out)
            })
            .map(|b| b.clone())
            .collect())
    }

    async fn list(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        let mut result: Vec<Booking> = self
            .store
            .bookings
            .iter()
            .filter(|b| {
                filter.user_id.map_or(true, |u| b.user_id == u)
                    && filter.room_id.map_or(true, |r| b.room_id == r)
                    && filter.status.map_or(true, |s| b.status == s)
                    && filter.from_date.map_or(true, |d| b.check_in_date >= d)
                    && filter.to_date.map_or(true, |d| b.check_out_date <= d)
                    && filter.room_type.map_or(true, |t| {
                        self.store
                            .rooms
                            .get(&b.room_id)
                            .map_or(false, |room| room.room_type == t)
                    })
            })
            .map(|b| b.clone())
            .collect();
        result.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(result)
    }

    async fn find_no_show_candidates(&self, today: NaiveDate) -> DomainResult<Vec<Booking>> {
        let mut result: Vec<Booking> = self
            .store
            .bookings
            .iter()
            .filter(|b| {
                b.status == crate::domain::booking::BookingStatus::Booked
                    && b.check_in_date < today
            })
            .map(|b| b.clone())
            .collect();
        result.sort_by_key(|b| b.id);
        Ok(result)
    }
}

// ── Payment repository ──────────────────────────────────────────

struct InMemoryPaymentRepository {
    store: Arc<Store>,
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn save(&self, mut p: Payment) -> DomainResult<Payment> {
        p.id = self.store.payment_counter.fetch_add(1, Ordering::SeqCst);
        self.store.payments.insert(p.id, p.clone());
        Ok(p)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Payment>> {
        Ok(self.store.payments.get(&id).map(|p| p.clone()))
    }

    async fn update(&self, p: &Payment) -> DomainResult<()> {
        if !self.store.payments.contains_key(&p.id) {
            return Err(not_found("Payment", p.id));
        }
        self.store.payments.insert(p.id, p.clone());
        Ok(())
    }

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Payment>> {
        Ok(self
            .store
            .payments
            .iter()
            .find(|p| p.session_id.as_deref() == Some(session_id))
            .map(|p| p.clone()))
    }

    async fn find_open_for_booking(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> DomainResult<Option<Payment>> {
        Ok(self
            .store
            .payments
            .iter()
            .filter(|p| {
                p.booking_id == booking_id
                    && p.payment_type == payment_type
                    && p.blocks_new_charge()
            })
            .map(|p| p.clone())
            .max_by_key(|p| p.id))
    }

    async fn list_for_booking(&self, booking_id: i64) -> DomainResult<Vec<Payment>> {
        let mut result: Vec<Payment> = self
            .store
            .payments
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .map(|p| p.clone())
            .collect();
        result.sort_by_key(|p| p.id);
        Ok(result)
    }

    async fn list(&self, user_id: Option<i64>) -> DomainResult<Vec<Payment>> {
        let mut result: Vec<Payment> = self
            .store
            .payments
            .iter()
            .filter(|p| {
                user_id.map_or(true, |u| {
                    self.store
                        .bookings
                        .get(&p.booking_id)
                        .map_or(false, |b| b.user_id == u)
                })
            })
            .map(|p| p.clone())
            .collect();
        result.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(result)
    }

    async fn user_has_pending(&self, user_id: i64) -> DomainResult<bool> {
        Ok(self.store.payments.iter().any(|p| {
            p.status == PaymentStatus::Pending
                && self
                    .store
                    .bookings
                    .get(&p.booking_id)
                    .map_or(false, |b| b.user_id == user_id)
        }))
    }

    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Payment>> {
        let mut result: Vec<Payment> = self
            .store
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending && p.created_at < cutoff)
            .map(|p| p.clone())
            .collect();
        result.sort_by_key(|p| p.id);
        Ok(result)
    }
}

// ── Room repository ─────────────────────────────────────────────

struct InMemoryRoomRepository {
    store: Arc<Store>,
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn save(&self, mut r: Room) -> DomainResult<Room> {
        r.id = self.store.room_counter.fetch_add(1, Ordering::SeqCst);
        self.store.rooms.insert(r.id, r.clone());
        Ok(r)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Room>> {
        Ok(self.store.rooms.get(&id).map(|r| r.clone()))
    }

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<Room>> {
        Ok(self
            .store
            .rooms
            .iter()
            .find(|r| r.number == number)
            .map(|r| r.clone()))
    }

    async fn list(&self) -> DomainResult<Vec<Room>> {
        let mut result: Vec<Room> = self.store.rooms.iter().map(|r| r.clone()).collect();
        result.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(result)
    }

    async fn update(&self, r: &Room) -> DomainResult<()> {
        if !self.store.rooms.contains_key(&r.id) {
            return Err(not_found("Room", r.id));
        }
        self.store.rooms.insert(r.id, r.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        if self.store.rooms.remove(&id).is_none() {
            return Err(not_found("Room", id));
        }
        Ok(())
    }
}

// ── User repository ─────────────────────────────────────────────

struct InMemoryUserRepository {
    store: Arc<Store>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, mut u: User) -> DomainResult<User> {
        u.id = self.store.user_counter.fetch_add(1, Ordering::SeqCst);
        self.store.users.insert(u.id, u.clone());
        Ok(u)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        Ok(self.store.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .store
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.store.users.len() as u64)
    }
}

// ── Provider ────────────────────────────────────────────────────

/// All four repositories over shared in-process maps. No persistence;
/// meant for tests and local development.
pub struct InMemoryRepositoryProvider {
    bookings: InMemoryBookingRepository,
    payments: InMemoryPaymentRepository,
    rooms: InMemoryRoomRepository,
    users: InMemoryUserRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let store = Arc::new(Store::new());
        Self {
            bookings: InMemoryBookingRepository {
                store: Arc::clone(&store),
            },
            payments: InMemoryPaymentRepository {
                store: Arc::clone(&store),
            },
            rooms: InMemoryRoomRepository {
                store: Arc::clone(&store),
            },
            users: InMemoryUserRepository { store },
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
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
