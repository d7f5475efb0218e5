//! Booking domain entity and its state machine
//!
//! Every transition is guarded by a source-state check and a date
//! check against the caller's wall-clock date. Transitions that owe
//! money do not advance the state themselves: the state moves forward
//! when the corresponding payment settles (see the webhook cascade in
//! `application::services::payments`).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::payment::PaymentType;
use crate::domain::{DomainError, DomainResult};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    /// Reserved, not yet checked in
    Booked,
    /// Guest is in the room
    Active,
    /// Checked out (terminal)
    Completed,
    /// Cancelled before check-in (terminal)
    Cancelled,
    /// Check-in date passed unused; late check-in can still recover it
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "Booked",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No show",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Booked" => Self::Booked,
            "Active" => Self::Active,
            "Completed" => Self::Completed,
            "Cancelled" => Self::Cancelled,
            "No show" => Self::NoShow,
            _ => Self::Cancelled,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationOutcome {
    /// More than 24h before check-in: cancelled immediately, free of charge
    Cancelled,
    /// Less than 24h before check-in: a cancellation fee must settle
    /// before the booking becomes Cancelled
    FeeRequired,
}

/// Outcome of a check-out request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutOutcome {
    /// On time: booking is Completed
    Completed,
    /// Past the scheduled check-out date: an overstay fee must settle
    /// before the booking becomes Completed
    OverstayFeeDue,
}

/// A reservation of one room for a guest over a date range.
///
/// `price_per_night` is a snapshot taken at creation time and is
/// immune to later room price changes.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: i64,
    pub room_id: i64,
    pub user_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub actual_check_out_date: Option<NaiveDate>,
    pub status: BookingStatus,
    pub price_per_night: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        room_id: i64,
        user_id: i64,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
        price_per_night: Decimal,
    ) -> Self {
        Self {
            id: 0,
            room_id,
            user_id,
            check_in_date,
            check_out_date,
            actual_check_out_date: None,
            status: BookingStatus::Booked,
            price_per_night,
            created_at: Utc::now(),
        }
    }

    /// Creation-time date guards: no past check-in, no inverted range.
    pub fn validate_dates(
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
        today: NaiveDate,
    ) -> DomainResult<()> {
        if check_in_date < today {
            return Err(DomainError::Validation(
                "Check-in date cannot be in the past.".to_string(),
            ));
        }
        if check_out_date <= check_in_date {
            return Err(DomainError::Validation(
                "Check-out date must be after check-in date.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days()
    }

    pub fn total_price(&self) -> Decimal {
        self.price_per_night * Decimal::from(self.nights())
    }

    /// Whether this booking still holds the room against other bookings.
    pub fn blocks_availability(&self) -> bool {
        matches!(self.status, BookingStatus::Booked | BookingStatus::Active)
    }

    /// `[check_in, check_out)` interval intersection.
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in_date < check_out && self.check_out_date > check_in
    }

    /// Check-in: allowed for Booked and NoShow bookings within the stay
    /// window. Returns the charge type owed; the status advances to
    /// Active only once that charge settles.
    pub fn check_in(&self, today: NaiveDate) -> DomainResult<PaymentType> {
        if !matches!(self.status, BookingStatus::Booked | BookingStatus::NoShow) {
            return Err(DomainError::Validation(
                "Check-in is allowed only for BOOKED or NO_SHOW bookings.".to_string(),
            ));
        }
        if today < self.check_in_date {
            return Err(DomainError::Validation("Too early to check in.".to_string()));
        }
        if today >= self.check_out_date {
            return Err(DomainError::Validation(
                "Check-in is not possible after check-out date.".to_string(),
            ));
        }

        Ok(if self.status == BookingStatus::NoShow {
            PaymentType::NoShowFee
        } else {
            PaymentType::Booking
        })
    }

    /// Cancellation: allowed for Booked bookings before the check-in
    /// date. Free when more than 24h out; otherwise the booking stays
    /// Booked until the cancellation fee settles.
    pub fn cancel(&mut self, today: NaiveDate) -> DomainResult<CancellationOutcome> {
        if self.status != BookingStatus::Booked {
            return Err(DomainError::Validation(
                "Only BOOKED bookings can be cancelled.".to_string(),
            ));
        }
        if today >= self.check_in_date {
            return Err(DomainError::Validation(
                "Cancellation is allowed only before check-in date.".to_string(),
            ));
        }

        let hours_to_checkin = (self.check_in_date - today).num_days() * 24;
        if hours_to_checkin > 24 {
            self.status = BookingStatus::Cancelled;
            Ok(CancellationOutcome::Cancelled)
        } else {
            Ok(CancellationOutcome::FeeRequired)
        }
    }

    /// Check-out: allowed for Active bookings only. An on-time
    /// check-out completes the booking; an overstay records the real
    /// departure date and leaves the booking Active until the fee
    /// settles.
    pub fn check_out(&mut self, today: NaiveDate) -> DomainResult<CheckOutOutcome> {
        if self.status != BookingStatus::Active {
            return Err(DomainError::Validation(
                "Only ACTIVE bookings can be checked out.".to_string(),
            ));
        }

        if today > self.check_out_date {
            self.actual_check_out_date = Some(today);
            Ok(CheckOutOutcome::OverstayFeeDue)
        } else {
            self.status = BookingStatus::Completed;
            self.actual_check_out_date = Some(today);
            Ok(CheckOutOutcome::Completed)
        }
    }

    /// No-show: Booked bookings whose check-in date passed unused.
    /// The fee is deferred until the guest turns up for a late check-in.
    pub fn mark_no_show(&mut self, today: NaiveDate) -> DomainResult<()> {
        if self.status != BookingStatus::Booked {
            return Err(DomainError::Validation(
                "Only BOOKED bookings can be marked as NO_SHOW.".to_string(),
            ));
        }
        if self.check_in_date >= today {
            return Err(DomainError::Validation(
                "Check-in date has not passed yet.".to_string(),
            ));
        }

        self.status = BookingStatus::NoShow;
        Ok(())
    }

    /// Advance the booking after a payment of the given type settled.
    /// Settlement is what moves payment-gated transitions forward.
    /// Returns whether the booking changed, so callers can skip the
    /// write-back for a cascade that found nothing to do.
    pub fn apply_settlement(&mut self, payment_type: PaymentType, today: NaiveDate) -> bool {
        match payment_type {
            PaymentType::CancellationFee => {
                if self.status == BookingStatus::Booked {
                    self.status = BookingStatus::Cancelled;
                    return true;
                }
            }
            PaymentType::Booking | PaymentType::NoShowFee => {
                if matches!(self.status, BookingStatus::Booked | BookingStatus::NoShow) {
                    self.status = BookingStatus::Active;
                    return true;
                }
            }
            PaymentType::OverstayFee => {
                if self.status == BookingStatus::Active {
                    self.status = BookingStatus::Completed;
                    if self.actual_check_out_date.is_none() {
                        self.actual_check_out_date = Some(today);
                    }
                    return true;
                }
            }
        }
        false
    }
}

// ── Tests ──────────────────────────────────────────────────────
