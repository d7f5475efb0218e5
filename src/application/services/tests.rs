//! Service-level tests over the in-memory repository provider

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::{mpsc, Barrier};

use super::bookings::{BookingService, CreateBooking};
use super::charge_worker::{ChargeQueue, ChargeRequest};
use super::payments::{PaymentService, SettlementOutcome};
use crate::application::ports::{
    CheckoutSession, CheckoutSessionProvider, NotificationSink, NotifyError, ProviderError,
};
use crate::domain::booking::{Booking, BookingFilter, BookingRepository, BookingStatus};
use crate::domain::payment::{Payment, PaymentRepository, PaymentStatus, PaymentType};
use crate::domain::room::{Room, RoomRepository, RoomType};
use crate::domain::user::{Actor, UserRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::infrastructure::storage::InMemoryRepositoryProvider;
use crate::shared::KeyedLocks;

const STAFF: Actor = Actor {
    user_id: 1,
    is_staff: true,
};
const GUEST: Actor = Actor {
    user_id: 2,
    is_staff: false,
};
const OTHER_GUEST: Actor = Actor {
    user_id: 3,
    is_staff: false,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct StubCheckoutProvider {
    calls: AtomicU32,
}

impl StubCheckoutProvider {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CheckoutSessionProvider for StubCheckoutProvider {
    async fn create_session(
        &self,
        _amount: Decimal,
        _label: &str,
    ) -> Result<CheckoutSession, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CheckoutSession {
            session_id: format!("cs_test_{}", n),
            session_url: format!("http://pay.test/cs_test_{}", n),
        })
    }
}

struct FailingCheckoutProvider;

#[async_trait]
impl CheckoutSessionProvider for FailingCheckoutProvider {
    async fn create_session(
        &self,
        _amount: Decimal,
        _label: &str,
    ) -> Result<CheckoutSession, ProviderError> {
        Err(ProviderError::Unavailable("stub outage".to_string()))
    }
}

struct NullNotifier;

#[async_trait]
impl NotificationSink for NullNotifier {
    async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

struct Harness {
    repos: Arc<InMemoryRepositoryProvider>,
    bookings: BookingService,
    payments: Arc<PaymentService>,
    charge_rx: mpsc::UnboundedReceiver<ChargeRequest>,
}

fn harness() -> Harness {
    let repos = Arc::new(InMemoryRepositoryProvider::new());
    let locks = KeyedLocks::new();
    let payments = Arc::new(PaymentService::new(
        repos.clone() as Arc<dyn RepositoryProvider>,
        Arc::new(StubCheckoutProvider::new()),
        locks.clone(),
        24,
    ));
    let (queue, charge_rx) = ChargeQueue::new();
    let bookings = BookingService::new(
        repos.clone() as Arc<dyn RepositoryProvider>,
        queue,
        Arc::new(NullNotifier),
        locks,
    );
    Harness {
        repos,
        bookings,
        payments,
        charge_rx,
    }
}

async fn add_room(h: &Harness) -> Room {
    h.repos
        .rooms()
        .save(Room::new("101", RoomType::Double, dec!(100), 2))
        .await
        .unwrap()
}

async fn book(h: &Harness, room_id: i64, from: NaiveDate, to: NaiveDate) -> Booking {
    h.bookings
        .create(
            GUEST,
            CreateBooking {
                room_id,
                check_in_date: from,
                check_out_date: to,
            },
            from - Duration::days(1),
        )
        .await
        .unwrap()
}

/// Drive one charge-worker step by hand: consume the queued request
/// and run the ledger against the stub provider.
async fn settle_next_charge(h: &mut Harness, today: NaiveDate) -> SettlementOutcome {
    let request = h.charge_rx.try_recv().expect("expected a queued charge");
    let booking = h
        .repos
        .bookings()
        .find_by_id(request.booking_id)
        .await
        .unwrap()
        .unwrap();
    let payment = h
        .payments
        .get_or_create_pending(&booking, request.payment_type)
        .await
        .unwrap();
    let payment = h.payments.ensure_session(payment).await.unwrap();
    h.payments
        .handle_session_completed(payment.session_id.as_deref().unwrap(), today)
        .await
        .unwrap()
}

// ── Creation and availability ───────────────────────────────────

#[tokio::test]
async fn create_snapshots_room_price() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    assert_eq!(booking.status, BookingStatus::Booked);
    assert_eq!(booking.price_per_night, dec!(100));
    assert_eq!(booking.total_price(), dec!(200));
}

#[tokio::test]
async fn overlapping_booking_is_rejected() {
    let h = harness();
    let room = add_room(&h).await;
    book(&h, room.id, date(2026, 9, 3), date(2026, 9, 6)).await;

    let result = h
        .bookings
        .create(
            OTHER_GUEST,
            CreateBooking {
                room_id: room.id,
                check_in_date: date(2026, 9, 5),
                check_out_date: date(2026, 9, 8),
            },
            date(2026, 9, 1),
        )
        .await;

    assert!(matches!(
        result,
        Err(DomainError::Validation(msg)) if msg == "Room is not available for selected dates."
    ));
}

#[tokio::test]
async fn back_to_back_bookings_are_accepted() {
    let h = harness();
    let room = add_room(&h).await;
    book(&h, room.id, date(2026, 9, 3), date(2026, 9, 6)).await;

    // Departure day equals arrival day: no collision.
    let result = h
        .bookings
        .create(
            OTHER_GUEST,
            CreateBooking {
                room_id: room.id,
                check_in_date: date(2026, 9, 6),
                check_out_date: date(2026, 9, 8),
            },
            date(2026, 9, 1),
        )
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn cancelled_booking_frees_the_room() {
    let h = harness();
    let room = add_room(&h).await;
    let mut booking = book(&h, room.id, date(2026, 9, 10), date(2026, 9, 12)).await;

    booking = h
        .bookings
        .cancel(GUEST, booking.id, date(2026, 9, 1))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let result = h
        .bookings
        .create(
            OTHER_GUEST,
            CreateBooking {
                room_id: room.id,
                check_in_date: date(2026, 9, 10),
                check_out_date: date(2026, 9, 12),
            },
            date(2026, 9, 1),
        )
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn pending_payment_blocks_new_booking() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    // Check in and leave the stay charge pending.
    h.bookings
        .check_in(GUEST, booking.id, date(2026, 9, 3))
        .await
        .unwrap();
    let request = h.charge_rx.try_recv().unwrap();
    let booking = h
        .repos
        .bookings()
        .find_by_id(request.booking_id)
        .await
        .unwrap()
        .unwrap();
    h.payments
        .get_or_create_pending(&booking, request.payment_type)
        .await
        .unwrap();

    let result = h
        .bookings
        .create(
            GUEST,
            CreateBooking {
                room_id: room.id,
                check_in_date: date(2026, 10, 1),
                check_out_date: date(2026, 10, 3),
            },
            date(2026, 9, 4),
        )
        .await;
    assert!(matches!(
        result,
        Err(DomainError::Validation(msg))
            if msg == "You cannot create a new booking while you have a pending payment."
    ));

    // A different guest is unaffected.
    let result = h
        .bookings
        .create(
            OTHER_GUEST,
            CreateBooking {
                room_id: room.id,
                check_in_date: date(2026, 10, 1),
                check_out_date: date(2026, 10, 3),
            },
            date(2026, 9, 4),
        )
        .await;
    assert!(result.is_ok());
}

// ── Check-in and settlement ─────────────────────────────────────

#[tokio::test]
async fn check_in_is_gated_on_settlement() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let after = h
        .bookings
        .check_in(GUEST, booking.id, date(2026, 9, 3))
        .await
        .unwrap();
    // Status does not advance until the charge settles.
    assert_eq!(after.status, BookingStatus::Booked);

    let outcome = settle_next_charge(&mut h, date(2026, 9, 3)).await;
    assert_eq!(outcome, SettlementOutcome::Settled);

    let settled = h
        .repos
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, BookingStatus::Active);

    let payments = h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_type, PaymentType::Booking);
    assert_eq!(payments[0].money_to_pay, dec!(200));
}

#[tokio::test]
async fn settlement_replay_is_harmless() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    h.bookings
        .check_in(GUEST, booking.id, date(2026, 9, 3))
        .await
        .unwrap();
    settle_next_charge(&mut h, date(2026, 9, 3)).await;

    let payment = &h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap()[0];
    let replay = h
        .payments
        .handle_session_completed(payment.session_id.as_deref().unwrap(), date(2026, 9, 4))
        .await
        .unwrap();
    assert_eq!(replay, SettlementOutcome::Replayed);

    let payments = h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Paid);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = harness();
    let result = h
        .payments
        .handle_session_completed("cs_unknown", date(2026, 9, 3))
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn repeated_check_in_does_not_duplicate_charge() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    h.bookings
        .check_in(GUEST, booking.id, date(2026, 9, 3))
        .await
        .unwrap();
    settle_next_charge(&mut h, date(2026, 9, 3)).await;

    // Second check-in attempt: booking is Active, guard rejects it.
    let result = h
        .bookings
        .check_in(GUEST, booking.id, date(2026, 9, 4))
        .await;
    assert!(result.is_err());
    assert!(h.charge_rx.try_recv().is_err());
}

#[tokio::test]
async fn get_or_create_pending_is_idempotent() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let first = h
        .payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    let second = h
        .payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test(start_paused = true)]
async fn provider_outage_leaves_payment_pending_without_session() {
    let repos = Arc::new(InMemoryRepositoryProvider::new());
    let payments = PaymentService::new(
        repos.clone() as Arc<dyn RepositoryProvider>,
        Arc::new(FailingCheckoutProvider),
        KeyedLocks::new(),
        24,
    );
    let room = repos
        .rooms()
        .save(Room::new("101", RoomType::Double, dec!(100), 2))
        .await
        .unwrap();
    let booking = repos
        .bookings()
        .save(Booking::new(
            room.id,
            GUEST.user_id,
            date(2026, 9, 3),
            date(2026, 9, 5),
            room.price_per_night,
        ))
        .await
        .unwrap();

    let payment = payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    assert!(payments.ensure_session(payment).await.is_err());

    let stored = &repos.payments().list_for_booking(booking.id).await.unwrap()[0];
    assert_eq!(stored.status, PaymentStatus::Pending);
    assert!(stored.session_id.is_none());
}

// ── Cancellation ────────────────────────────────────────────────

#[tokio::test]
async fn early_cancellation_is_free_and_immediate() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 10), date(2026, 9, 12)).await;

    let after = h
        .bookings
        .cancel(GUEST, booking.id, date(2026, 9, 1))
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Cancelled);
    assert!(h.charge_rx.try_recv().is_err());
}

#[tokio::test]
async fn late_cancellation_is_gated_on_the_fee() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 10), date(2026, 9, 12)).await;

    // One day ahead: exactly 24 hours, not more, so the fee applies.
    let after = h
        .bookings
        .cancel(GUEST, booking.id, date(2026, 9, 9))
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Booked);

    let outcome = settle_next_charge(&mut h, date(2026, 9, 9)).await;
    assert_eq!(outcome, SettlementOutcome::Settled);

    let settled = h
        .repos
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, BookingStatus::Cancelled);

    let payments = h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap();
    assert_eq!(payments[0].payment_type, PaymentType::CancellationFee);
    // Half of the two-night total.
    assert_eq!(payments[0].money_to_pay, dec!(100));
}

// ── Check-out and overstay ──────────────────────────────────────

#[tokio::test]
async fn on_time_check_out_completes() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    h.bookings
        .check_in(GUEST, booking.id, date(2026, 9, 3))
        .await
        .unwrap();
    settle_next_charge(&mut h, date(2026, 9, 3)).await;

    let after = h
        .bookings
        .check_out(GUEST, booking.id, date(2026, 9, 5))
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Completed);
    assert_eq!(after.actual_check_out_date, Some(date(2026, 9, 5)));
    assert!(h.charge_rx.try_recv().is_err());
}

#[tokio::test]
async fn overstay_check_out_is_gated_on_the_fee() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    h.bookings
        .check_in(GUEST, booking.id, date(2026, 9, 3))
        .await
        .unwrap();
    settle_next_charge(&mut h, date(2026, 9, 3)).await;

    // Two days past the scheduled check-out.
    let after = h
        .bookings
        .check_out(GUEST, booking.id, date(2026, 9, 7))
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Active);
    assert_eq!(after.actual_check_out_date, Some(date(2026, 9, 7)));

    let outcome = settle_next_charge(&mut h, date(2026, 9, 7)).await;
    assert_eq!(outcome, SettlementOutcome::Settled);

    let settled = h
        .repos
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, BookingStatus::Completed);
    assert_eq!(settled.actual_check_out_date, Some(date(2026, 9, 7)));

    let payments = h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap();
    let overstay = payments
        .iter()
        .find(|p| p.payment_type == PaymentType::OverstayFee)
        .unwrap();
    // 2 extra nights at 1.5 x 100.
    assert_eq!(overstay.money_to_pay, dec!(300.0));
}

// ── No-show ─────────────────────────────────────────────────────

#[tokio::test]
async fn no_show_sweep_flags_once() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let flagged = h.bookings.sweep_no_shows(date(2026, 9, 4)).await.unwrap();
    assert_eq!(flagged, 1);
    let flagged_again = h.bookings.sweep_no_shows(date(2026, 9, 4)).await.unwrap();
    assert_eq!(flagged_again, 0);

    let stored = h
        .repos
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::NoShow);
}

#[tokio::test]
async fn no_show_check_in_pays_the_penalty_rate() {
    let mut h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    h.bookings
        .mark_no_show(STAFF, booking.id, date(2026, 9, 4))
        .await
        .unwrap();

    // Late arrival within the stay window.
    h.bookings
        .check_in(GUEST, booking.id, date(2026, 9, 4))
        .await
        .unwrap();
    let outcome = settle_next_charge(&mut h, date(2026, 9, 4)).await;
    assert_eq!(outcome, SettlementOutcome::Settled);

    let settled = h
        .repos
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, BookingStatus::Active);

    let payments = h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap();
    assert_eq!(payments[0].payment_type, PaymentType::NoShowFee);
    // 1.2 x the two-night total.
    assert_eq!(payments[0].money_to_pay, dec!(240.0));
}

#[tokio::test]
async fn only_staff_can_mark_no_show() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let result = h
        .bookings
        .mark_no_show(GUEST, booking.id, date(2026, 9, 4))
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

// ── Visibility ──────────────────────────────────────────────────

#[tokio::test]
async fn foreign_booking_reads_as_not_found() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let result = h.bookings.get(OTHER_GUEST, booking.id).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    assert!(h.bookings.get(STAFF, booking.id).await.is_ok());
    assert!(h.bookings.get(GUEST, booking.id).await.is_ok());
}

#[tokio::test]
async fn guests_only_list_their_own_bookings() {
    let h = harness();
    let room = add_room(&h).await;
    book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    // A guest asking for someone else's bookings still gets their own.
    let listed = h
        .bookings
        .list(
            OTHER_GUEST,
            BookingFilter {
                user_id: Some(GUEST.user_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(listed.is_empty());

    let staff_view = h
        .bookings
        .list(
            STAFF,
            BookingFilter {
                user_id: Some(GUEST.user_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(staff_view.len(), 1);
}

// ── Payment expiry and renewal ──────────────────────────────────

#[tokio::test]
async fn expiry_sweep_only_touches_old_pending_payments() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    h.payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();

    let now = Utc::now();
    // Fresh payment: nothing to expire.
    assert_eq!(h.payments.sweep_expired(now).await.unwrap(), 0);
    // Two days on: past the 24h window.
    let later = now + Duration::days(2);
    assert_eq!(h.payments.sweep_expired(later).await.unwrap(), 1);
    assert_eq!(h.payments.sweep_expired(later).await.unwrap(), 0);

    let stored = &h
        .repos
        .payments()
        .list_for_booking(booking.id)
        .await
        .unwrap()[0];
    assert_eq!(stored.status, PaymentStatus::Expired);
}

#[tokio::test]
async fn renewal_replaces_an_expired_payment() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let payment = h
        .payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    let later = Utc::now() + Duration::days(2);
    h.payments.sweep_expired(later).await.unwrap();

    let renewed = h.payments.renew(payment.id, GUEST).await.unwrap();
    assert_ne!(renewed.id, payment.id);
    assert_eq!(renewed.status, PaymentStatus::Pending);
    assert!(renewed.session_id.is_some());

    // The old record stays expired.
    let old = h
        .repos
        .payments()
        .find_by_id(payment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old.status, PaymentStatus::Expired);
}

// ── Settlement serialization and sweep isolation ────────────────

/// Repository wrapper with failure injection and call tracing, for
/// exercising the paths a plain in-memory store cannot reach.
struct InstrumentedProvider {
    inner: Arc<InMemoryRepositoryProvider>,
    bookings: InstrumentedBookings,
    payments: InstrumentedPayments,
}

struct InstrumentedBookings {
    inner: Arc<InMemoryRepositoryProvider>,
    fail_update_for: Option<i64>,
    update_calls: AtomicU32,
}

struct InstrumentedPayments {
    inner: Arc<InMemoryRepositoryProvider>,
    /// When set, the first two session lookups rendezvous here, so two
    /// concurrent settlement deliveries both read before either locks.
    session_read_gate: Option<Arc<Barrier>>,
    session_reads: AtomicU32,
}

impl InstrumentedProvider {
    fn new(fail_update_for: Option<i64>, session_read_gate: Option<Arc<Barrier>>) -> Arc<Self> {
        let inner = Arc::new(InMemoryRepositoryProvider::new());
        Arc::new(Self {
            bookings: InstrumentedBookings {
                inner: Arc::clone(&inner),
                fail_update_for,
                update_calls: AtomicU32::new(0),
            },
            payments: InstrumentedPayments {
                inner: Arc::clone(&inner),
                session_read_gate,
                session_reads: AtomicU32::new(0),
            },
            inner,
        })
    }
}

impl RepositoryProvider for InstrumentedProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn rooms(&self) -> &dyn RoomRepository {
        self.inner.rooms()
    }

    fn users(&self) -> &dyn UserRepository {
        self.inner.users()
    }
}

#[async_trait]
impl BookingRepository for InstrumentedBookings {
    async fn save(&self, b: Booking) -> DomainResult<Booking> {
        self.inner.bookings().save(b).await
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Booking>> {
        self.inner.bookings().find_by_id(id).await
    }

    async fn update(&self, b: &Booking) -> DomainResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update_for == Some(b.id) {
            return Err(DomainError::Validation(
                "Database error: connection lost".to_string(),
            ));
        }
        self.inner.bookings().update(b).await
    }

    async fn find_overlapping(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> DomainResult<Vec<Booking>> {
        self.inner
            .bookings()
            .find_overlapping(room_id, check_in, check_out)
            .await
    }

    async fn list(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        self.inner.bookings().list(filter).await
    }

    async fn find_no_show_candidates(&self, today: NaiveDate) -> DomainResult<Vec<Booking>> {
        self.inner.bookings().find_no_show_candidates(today).await
    }
}

#[async_trait]
impl PaymentRepository for InstrumentedPayments {
    async fn save(&self, p: Payment) -> DomainResult<Payment> {
        self.inner.payments().save(p).await
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Payment>> {
        self.inner.payments().find_by_id(id).await
    }

    async fn update(&self, p: &Payment) -> DomainResult<()> {
        self.inner.payments().update(p).await
    }

    async fn find_by_session_id(&self, session_id: &str) -> DomainResult<Option<Payment>> {
        if let Some(gate) = &self.session_read_gate {
            if self.session_reads.fetch_add(1, Ordering::SeqCst) < 2 {
                gate.wait().await;
            }
        }
        self.inner.payments().find_by_session_id(session_id).await
    }

    async fn find_open_for_booking(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> DomainResult<Option<Payment>> {
        self.inner
            .payments()
            .find_open_for_booking(booking_id, payment_type)
            .await
    }

    async fn list_for_booking(&self, booking_id: i64) -> DomainResult<Vec<Payment>> {
        self.inner.payments().list_for_booking(booking_id).await
    }

    async fn list(&self, user_id: Option<i64>) -> DomainResult<Vec<Payment>> {
        self.inner.payments().list(user_id).await
    }

    async fn user_has_pending(&self, user_id: i64) -> DomainResult<bool> {
        self.inner.payments().user_has_pending(user_id).await
    }

    async fn find_stale_pending(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Payment>> {
        self.inner.payments().find_stale_pending(cutoff).await
    }
}

#[tokio::test]
async fn settlement_with_nothing_to_cascade_skips_the_booking_write() {
    let repos = InstrumentedProvider::new(None, None);
    let payments = PaymentService::new(
        repos.clone() as Arc<dyn RepositoryProvider>,
        Arc::new(StubCheckoutProvider::new()),
        KeyedLocks::new(),
        24,
    );

    let room = repos
        .inner
        .rooms()
        .save(Room::new("101", RoomType::Double, dec!(100), 2))
        .await
        .unwrap();
    let booking = repos
        .inner
        .bookings()
        .save(Booking::new(
            room.id,
            GUEST.user_id,
            date(2026, 9, 3),
            date(2026, 9, 5),
            room.price_per_night,
        ))
        .await
        .unwrap();

    // Activate the booking through a normal stay-charge settlement.
    let payment = payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    let payment = payments.ensure_session(payment).await.unwrap();
    payments
        .handle_session_completed(payment.session_id.as_deref().unwrap(), date(2026, 9, 3))
        .await
        .unwrap();
    let writes = repos.bookings.update_calls.load(Ordering::SeqCst);

    // A second payable charge settling against the already Active
    // booking has no cascade work left.
    let mut extra = repos
        .inner
        .payments()
        .save(Payment::new(booking.id, PaymentType::Booking, dec!(200)))
        .await
        .unwrap();
    extra.attach_session(
        "cs_extra".to_string(),
        "http://pay.test/cs_extra".to_string(),
    );
    repos.inner.payments().update(&extra).await.unwrap();

    let outcome = payments
        .handle_session_completed("cs_extra", date(2026, 9, 4))
        .await
        .unwrap();
    assert_eq!(outcome, SettlementOutcome::Settled);

    // No stale snapshot written back: booking untouched.
    assert_eq!(repos.bookings.update_calls.load(Ordering::SeqCst), writes);
    let stored = repos
        .inner
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::Active);
    assert!(stored.actual_check_out_date.is_none());
}

#[tokio::test]
async fn concurrent_deliveries_of_one_session_settle_exactly_once() {
    // Both deliveries read the payment before either takes the
    // booking lock; the re-read under the lock must turn the loser
    // into a replay.
    let gate = Arc::new(Barrier::new(2));
    let repos = InstrumentedProvider::new(None, Some(gate));
    let payments = Arc::new(PaymentService::new(
        repos.clone() as Arc<dyn RepositoryProvider>,
        Arc::new(StubCheckoutProvider::new()),
        KeyedLocks::new(),
        24,
    ));

    let room = repos
        .inner
        .rooms()
        .save(Room::new("101", RoomType::Double, dec!(100), 2))
        .await
        .unwrap();
    let booking = repos
        .inner
        .bookings()
        .save(Booking::new(
            room.id,
            GUEST.user_id,
            date(2026, 9, 3),
            date(2026, 9, 5),
            room.price_per_night,
        ))
        .await
        .unwrap();
    let payment = payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    let payment = payments.ensure_session(payment).await.unwrap();
    let session = payment.session_id.clone().unwrap();

    let first = tokio::spawn({
        let payments = payments.clone();
        let session = session.clone();
        async move {
            payments
                .handle_session_completed(&session, date(2026, 9, 3))
                .await
                .unwrap()
        }
    });
    let second = tokio::spawn({
        let payments = payments.clone();
        async move {
            payments
                .handle_session_completed(&session, date(2026, 9, 3))
                .await
                .unwrap()
        }
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let settled = outcomes
        .iter()
        .filter(|o| **o == SettlementOutcome::Settled)
        .count();
    assert_eq!(settled, 1, "exactly one delivery settles: {:?}", outcomes);

    let stored = repos
        .inner
        .bookings()
        .find_by_id(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::Active);
    assert_eq!(
        repos.inner.payments().list_for_booking(booking.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn no_show_sweep_survives_a_failing_candidate() {
    // First candidate's write fails; the sweep must still flag the
    // second one.
    let repos = InstrumentedProvider::new(Some(1), None);
    let (queue, _charge_rx) = ChargeQueue::new();
    let bookings = BookingService::new(
        repos.clone() as Arc<dyn RepositoryProvider>,
        queue,
        Arc::new(NullNotifier),
        KeyedLocks::new(),
    );

    let room = repos
        .inner
        .rooms()
        .save(Room::new("101", RoomType::Double, dec!(100), 2))
        .await
        .unwrap();
    let first = repos
        .inner
        .bookings()
        .save(Booking::new(
            room.id,
            GUEST.user_id,
            date(2026, 9, 2),
            date(2026, 9, 5),
            room.price_per_night,
        ))
        .await
        .unwrap();
    assert_eq!(first.id, 1);
    let second = repos
        .inner
        .bookings()
        .save(Booking::new(
            room.id,
            OTHER_GUEST.user_id,
            date(2026, 9, 3),
            date(2026, 9, 5),
            room.price_per_night,
        ))
        .await
        .unwrap();

    let flagged = bookings.sweep_no_shows(date(2026, 9, 4)).await.unwrap();
    assert_eq!(flagged, 1);

    let first = repos
        .inner
        .bookings()
        .find_by_id(first.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.status, BookingStatus::Booked);
    let second = repos
        .inner
        .bookings()
        .find_by_id(second.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status, BookingStatus::NoShow);
}

#[tokio::test]
async fn pending_payment_cannot_be_renewed() {
    let h = harness();
    let room = add_room(&h).await;
    let booking = book(&h, room.id, date(2026, 9, 3), date(2026, 9, 5)).await;

    let payment = h
        .payments
        .get_or_create_pending(&booking, PaymentType::Booking)
        .await
        .unwrap();
    let result = h.payments.renew(payment.id, GUEST).await;
    assert!(matches!(
        result,
        Err(DomainError::Validation(msg)) if msg == "Only expired payments can be renewed."
    ));
}
