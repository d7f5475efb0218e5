//! Payment ledger and settlement handling
//!
//! Owns the idempotent charge ledger (`get_or_create_pending`),
//! checkout session attachment, webhook settlement with its booking
//! cascade, renewal of expired payments and the expiry sweep step.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::application::ports::{CheckoutSessionProvider, ProviderError};
use crate::domain::booking::Booking;
use crate::domain::payment::{Payment, PaymentStatus, PaymentType};
use crate::domain::user::Actor;
use crate::domain::{pricing, DomainError, DomainResult, RepositoryProvider};
use crate::shared::{retry_with_backoff, KeyedLocks, RetryConfig};

/// Result of a settlement callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Payment marked Paid and the booking cascade applied
    Settled,
    /// Duplicate webhook delivery; nothing changed
    Replayed,
}

pub struct PaymentService {
    repos: Arc<dyn RepositoryProvider>,
    provider: Arc<dyn CheckoutSessionProvider>,
    /// Same lock map the booking service uses; the settlement cascade
    /// must not interleave with a lifecycle transition.
    booking_locks: KeyedLocks,
    /// Hours a Pending payment may wait for settlement before the
    /// sweep expires it.
    expiry_hours: i64,
}

impl PaymentService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        provider: Arc<dyn CheckoutSessionProvider>,
        booking_locks: KeyedLocks,
        expiry_hours: i64,
    ) -> Self {
        Self {
            repos,
            provider,
            booking_locks,
            expiry_hours,
        }
    }

    /// Idempotent charge creation: an existing Pending or Paid payment
    /// for this (booking, type) is returned unchanged; otherwise the
    /// policy engine computes the amount and a Pending record is
    /// inserted. Expired payments never block a replacement.
    pub async fn get_or_create_pending(
        &self,
        booking: &Booking,
        payment_type: PaymentType,
    ) -> DomainResult<Payment> {
        if let Some(existing) = self
            .repos
            .payments()
            .find_open_for_booking(booking.id, payment_type)
            .await?
        {
            return Ok(existing);
        }

        let amount = pricing::amount_owed(booking, payment_type);
        let payment = self
            .repos
            .payments()
            .save(Payment::new(booking.id, payment_type, amount))
            .await?;

        info!(
            booking_id = booking.id,
            payment_id = payment.id,
            payment_type = %payment_type,
            amount = %amount,
            "Pending payment created"
        );

        Ok(payment)
    }

    /// Ask the checkout provider for a payable session and persist its
    /// reference. No-op if the payment already carries a session.
    /// Provider failures leave the payment Pending without a session,
    /// so a later retry or manual renewal can finish the job.
    pub async fn ensure_session(&self, mut payment: Payment) -> DomainResult<Payment> {
        if payment.has_session() {
            return Ok(payment);
        }

        let label = format!(
            "{} payment for booking #{}",
            payment.payment_type, payment.booking_id
        );

        let session = retry_with_backoff(
            RetryConfig::default(),
            || self.provider.create_session(payment.money_to_pay, &label),
            ProviderError::is_transient,
            "create_checkout_session",
        )
        .await
        .map_err(|e| DomainError::Validation(format!("Checkout session creation failed: {}", e)))?;

        payment.attach_session(session.session_id, session.session_url);
        self.repos.payments().update(&payment).await?;

        info!(
            payment_id = payment.id,
            session_id = payment.session_id.as_deref().unwrap_or(""),
            "Checkout session attached"
        );

        Ok(payment)
    }

    /// Settlement callback from the checkout provider. Unknown session
    /// ids map to not-found; replays are a harmless no-op. Settling a
    /// payment cascades the booking forward: a cancellation fee
    /// finalizes Cancelled, a booking / no-show fee activates the
    /// stay, an overstay fee completes it.
    ///
    /// The cascade is a booking transition, so it runs under the same
    /// per-booking lock as check-in, cancel and check-out. The payment
    /// is re-read under the lock: of two concurrent deliveries for one
    /// session, exactly one settles, the other replays.
    pub async fn handle_session_completed(
        &self,
        session_id: &str,
        today: NaiveDate,
    ) -> DomainResult<SettlementOutcome> {
        let Some(payment) = self.repos.payments().find_by_session_id(session_id).await? else {
            return Err(DomainError::NotFound {
                entity: "Payment",
                field: "session_id",
                value: session_id.to_string(),
            });
        };

        let _guard = self.booking_locks.acquire(payment.booking_id).await;

        let Some(mut payment) = self.repos.payments().find_by_session_id(session_id).await? else {
            return Err(DomainError::NotFound {
                entity: "Payment",
                field: "session_id",
                value: session_id.to_string(),
            });
        };

        if payment.status == PaymentStatus::Paid {
            info!(payment_id = payment.id, "Settlement replay ignored");
            return Ok(SettlementOutcome::Replayed);
        }

        payment.mark_paid()?;
        self.repos.payments().update(&payment).await?;

        match self.repos.bookings().find_by_id(payment.booking_id).await? {
            Some(mut booking) => {
                if booking.apply_settlement(payment.payment_type, today) {
                    self.repos.bookings().update(&booking).await?;
                }
                info!(
                    payment_id = payment.id,
                    booking_id = booking.id,
                    payment_type = %payment.payment_type,
                    status = %booking.status,
                    "Payment settled, booking advanced"
                );
            }
            None => {
                warn!(
                    payment_id = payment.id,
                    booking_id = payment.booking_id,
                    "Payment settled but its booking is gone"
                );
            }
        }

        Ok(SettlementOutcome::Settled)
    }

    /// Replace an expired payment with a fresh Pending one carrying a
    /// new checkout session. The expired record stays Expired.
    pub async fn renew(&self, payment_id: i64, actor: Actor) -> DomainResult<Payment> {
        let payment = self.fetch_visible(payment_id, actor).await?;

        if payment.status != PaymentStatus::Expired {
            return Err(DomainError::Validation(
                "Only expired payments can be renewed.".to_string(),
            ));
        }

        let Some(booking) = self.repos.bookings().find_by_id(payment.booking_id).await? else {
            return Err(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: payment.booking_id.to_string(),
            });
        };

        let replacement = self
            .get_or_create_pending(&booking, payment.payment_type)
            .await?;
        self.ensure_session(replacement).await
    }

    pub async fn get(&self, payment_id: i64, actor: Actor) -> DomainResult<Payment> {
        self.fetch_visible(payment_id, actor).await
    }

    pub async fn list(&self, actor: Actor) -> DomainResult<Vec<Payment>> {
        let user_id = (!actor.is_staff).then_some(actor.user_id);
        self.repos.payments().list(user_id).await
    }

    /// Expire Pending payments older than the expiry window. Returns
    /// the number of payments expired; re-running finds nothing twice.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let cutoff = now - Duration::hours(self.expiry_hours);
        let stale = self.repos.payments().find_stale_pending(cutoff).await?;

        let mut expired = 0;
        for mut payment in stale {
            match payment.mark_expired() {
                Ok(()) => {
                    self.repos.payments().update(&payment).await?;
                    expired += 1;
                }
                Err(e) => warn!(payment_id = payment.id, error = %e, "Skipped stale payment"),
            }
        }

        if expired > 0 {
            info!(count = expired, "Expired stale pending payments");
        }
        Ok(expired)
    }

    /// Resolve a payment the actor is allowed to see; hidden payments
    /// surface as not-found rather than forbidden.
    async fn fetch_visible(&self, payment_id: i64, actor: Actor) -> DomainResult<Payment> {
        let not_found = || DomainError::NotFound {
            entity: "Payment",
            field: "id",
            value: payment_id.to_string(),
        };

        let Some(payment) = self.repos.payments().find_by_id(payment_id).await? else {
            return Err(not_found());
        };

        if actor.is_staff {
            return Ok(payment);
        }

        match self.repos.bookings().find_by_id(payment.booking_id).await? {
            Some(booking) if actor.can_view_payment(&payment, &booking) => Ok(payment),
            _ => Err(not_found()),
        }
    }
}
