//! Booking lifecycle orchestration
//!
//! Coordinates availability checks, the booking state machine, the
//! deferred charge queue and operational notifications. Per-room
//! locks serialize availability check + insert; per-booking locks
//! serialize lifecycle transitions.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::charge_worker::{ChargeQueue, ChargeRequest};
use crate::application::ports::NotificationSink;
use crate::domain::booking::{
    Booking, BookingFilter, CancellationOutcome, CheckOutOutcome,
};
use crate::domain::payment::PaymentType;
use crate::domain::user::Actor;
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::{retry_with_backoff, KeyedLocks, RetryConfig};

/// Input for creating a booking.
#[derive(Debug, Clone, Copy)]
pub struct CreateBooking {
    pub room_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    charges: ChargeQueue,
    notifier: Arc<dyn NotificationSink>,
    /// Shared with the payment service: the settlement cascade is a
    /// booking transition and takes the same per-booking lock.
    booking_locks: KeyedLocks,
    room_locks: KeyedLocks,
}

impl BookingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        charges: ChargeQueue,
        notifier: Arc<dyn NotificationSink>,
        booking_locks: KeyedLocks,
    ) -> Self {
        Self {
            repos,
            charges,
            notifier,
            booking_locks,
            room_locks: KeyedLocks::new(),
        }
    }

    /// Create a booking for the actor.
    ///
    /// Rejected when the actor has any pending payment, when the dates
    /// are invalid, or when the room already has a Booked or Active
    /// booking overlapping the half-open `[check_in, check_out)`
    /// interval. The overlap check and insert run under the room lock,
    /// so two concurrent requests for the same room cannot both pass.
    pub async fn create(
        &self,
        actor: Actor,
        request: CreateBooking,
        today: NaiveDate,
    ) -> DomainResult<Booking> {
        if self.repos.payments().user_has_pending(actor.user_id).await? {
            return Err(DomainError::Validation(
                "You cannot create a new booking while you have a pending payment.".to_string(),
            ));
        }

        Booking::validate_dates(request.check_in_date, request.check_out_date, today)?;

        let Some(room) = self.repos.rooms().find_by_id(request.room_id).await? else {
            return Err(DomainError::NotFound {
                entity: "Room",
                field: "id",
                value: request.room_id.to_string(),
            });
        };

        let _room_guard = self.lock_room(room.id).await;

        let overlapping = self
            .repos
            .bookings()
            .find_overlapping(room.id, request.check_in_date, request.check_out_date)
            .await?;
        if !overlapping.is_empty() {
            return Err(DomainError::Validation(
                "Room is not available for selected dates.".to_string(),
            ));
        }

        let booking = self
            .repos
            .bookings()
            .save(Booking::new(
                room.id,
                actor.user_id,
                request.check_in_date,
                request.check_out_date,
                room.price_per_night,
            ))
            .await?;

        info!(
            booking_id = booking.id,
            room_id = room.id,
            user_id = actor.user_id,
            check_in = %booking.check_in_date,
            check_out = %booking.check_out_date,
            "Booking created"
        );

        self.notify_detached(format!(
            "New booking #{} for room {}: {} to {}, {} per night",
            booking.id,
            room.number,
            booking.check_in_date,
            booking.check_out_date,
            booking.price_per_night
        ));

        Ok(booking)
    }

    /// Check a guest in. The status stays Booked (or No show) until the
    /// stay charge settles; this only validates the window and queues
    /// the charge. A No show booking checked in pays the no-show rate.
    pub async fn check_in(&self, actor: Actor, booking_id: i64, today: NaiveDate) -> DomainResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let booking = self.fetch_visible(actor, booking_id).await?;

        let charge_type = booking.check_in(today)?;
        self.enqueue_charge_if_needed(booking.id, charge_type).await?;

        info!(booking_id, payment_type = %charge_type, "Check-in accepted, charge queued");
        Ok(booking)
    }

    /// Cancel a Booked booking. More than 24 hours ahead of check-in
    /// the cancellation is immediate and free; otherwise the booking
    /// stays Booked and a cancellation fee is queued. It becomes
    /// Cancelled when that fee settles.
    pub async fn cancel(&self, actor: Actor, booking_id: i64, today: NaiveDate) -> DomainResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch_visible(actor, booking_id).await?;

        match booking.cancel(today)? {
            CancellationOutcome::Cancelled => {
                self.repos.bookings().update(&booking).await?;
                info!(booking_id, "Booking cancelled free of charge");
            }
            CancellationOutcome::FeeRequired => {
                self.enqueue_charge_if_needed(booking.id, PaymentType::CancellationFee)
                    .await?;
                info!(booking_id, "Late cancellation, fee queued");
            }
        }

        Ok(booking)
    }

    /// Check a guest out of an Active booking. On-time check-out
    /// completes immediately. Past the scheduled date the booking
    /// stays Active with the actual check-out date recorded, and the
    /// overstay fee is queued; settlement completes it.
    pub async fn check_out(&self, actor: Actor, booking_id: i64, today: NaiveDate) -> DomainResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch_visible(actor, booking_id).await?;

        let outcome = booking.check_out(today)?;
        self.repos.bookings().update(&booking).await?;

        match outcome {
            CheckOutOutcome::Completed => {
                info!(booking_id, "Booking completed");
            }
            CheckOutOutcome::OverstayFeeDue => {
                self.enqueue_charge_if_needed(booking.id, PaymentType::OverstayFee)
                    .await?;
                info!(booking_id, "Overstay detected, fee queued");
            }
        }

        Ok(booking)
    }

    /// Staff-only: flag a Booked booking whose check-in date has
    /// passed as a no-show.
    pub async fn mark_no_show(&self, actor: Actor, booking_id: i64, today: NaiveDate) -> DomainResult<Booking> {
        if !actor.is_staff {
            return Err(DomainError::Forbidden(
                "Only staff can mark bookings as no-show.".to_string(),
            ));
        }

        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch_visible(actor, booking_id).await?;

        booking.mark_no_show(today)?;
        self.repos.bookings().update(&booking).await?;

        info!(booking_id, "Booking marked as no-show");
        self.notify_detached(format!("Booking #{} marked as no-show", booking.id));

        Ok(booking)
    }

    pub async fn get(&self, actor: Actor, booking_id: i64) -> DomainResult<Booking> {
        self.fetch_visible(actor, booking_id).await
    }

    /// List bookings. Non-staff callers always see only their own,
    /// regardless of the filter they pass.
    pub async fn list(&self, actor: Actor, mut filter: BookingFilter) -> DomainResult<Vec<Booking>> {
        if !actor.is_staff {
            filter.user_id = Some(actor.user_id);
        }
        self.repos.bookings().list(&filter).await
    }

    /// Flag every Booked booking whose check-in date has passed as a
    /// no-show. Each booking is a unit of work: one failure is logged
    /// and skipped, the rest proceed. Returns the number flagged.
    /// Already-flagged bookings are no longer candidates, so a rerun
    /// finds nothing new.
    pub async fn sweep_no_shows(&self, today: NaiveDate) -> DomainResult<usize> {
        let candidates = self.repos.bookings().find_no_show_candidates(today).await?;

        let mut flagged = 0;
        for candidate in candidates {
            let _guard = self.lock_booking(candidate.id).await;

            // Re-read under the lock; a concurrent check-in or cancel
            // may have moved the booking on. Any failure here skips
            // this candidate only, the rest of the sweep proceeds.
            let mut booking = match self.repos.bookings().find_by_id(candidate.id).await {
                Ok(Some(booking)) => booking,
                Ok(None) => continue,
                Err(e) => {
                    warn!(booking_id = candidate.id, error = %e, "Skipped no-show candidate");
                    continue;
                }
            };
            if let Err(e) = booking.mark_no_show(today) {
                warn!(booking_id = booking.id, error = %e, "Skipped no-show candidate");
                continue;
            }
            if let Err(e) = self.repos.bookings().update(&booking).await {
                warn!(booking_id = booking.id, error = %e, "Skipped no-show candidate");
                continue;
            }
            flagged += 1;
            self.notify_detached(format!("Booking #{} marked as no-show", booking.id));
        }

        if flagged > 0 {
            info!(count = flagged, "No-show sweep flagged bookings");
        }
        Ok(flagged)
    }

    /// Queue a deferred charge unless a Pending-with-session or Paid
    /// payment of this type already exists. A session-less Pending
    /// payment (an earlier provider failure) is requeued so the worker
    /// can attach a session.
    async fn enqueue_charge_if_needed(
        &self,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> DomainResult<()> {
        let open = self
            .repos
            .payments()
            .find_open_for_booking(booking_id, payment_type)
            .await?;

        if open.map_or(true, |p| !p.has_session()) {
            self.charges.enqueue(ChargeRequest {
                booking_id,
                payment_type,
            });
        }
        Ok(())
    }

    /// Resolve a booking the actor may see; hidden bookings surface as
    /// not-found, never forbidden.
    async fn fetch_visible(&self, actor: Actor, booking_id: i64) -> DomainResult<Booking> {
        match self.repos.bookings().find_by_id(booking_id).await? {
            Some(booking) if actor.can_view_booking(&booking) => Ok(booking),
            _ => Err(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: booking_id.to_string(),
            }),
        }
    }

    async fn lock_booking(&self, booking_id: i64) -> crate::shared::locks::KeyedGuard {
        self.booking_locks.acquire(booking_id).await
    }

    async fn lock_room(&self, room_id: i64) -> crate::shared::locks::KeyedGuard {
        self.room_locks.acquire(room_id).await
    }

    /// Fire-and-forget notification with bounded retry. Failures are
    /// logged and never reach the caller.
    fn notify_detached(&self, message: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let result = retry_with_backoff(
                RetryConfig::default(),
                || notifier.notify(&message),
                |_| true,
                "send_notification",
            )
            .await;
            if let Err(e) = result {
                error!(error = %e, "Notification dropped after retries");
            }
        });
    }
}
