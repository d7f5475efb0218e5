//! Payment domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{DomainError, DomainResult};

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Awaiting settlement via the checkout provider
    Pending,
    /// Settled by a confirmed checkout session
    Paid,
    /// Timed out without settlement
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Expired => "Expired",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Paid" => Self::Paid,
            "Expired" => Self::Expired,
            _ => Self::Expired,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a monetary obligation tied to a booking event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentType {
    /// The stay itself, charged at check-in
    Booking,
    /// Late cancellation (less than 24h before check-in)
    CancellationFee,
    /// Penalty charged at late check-in after a no-show
    NoShowFee,
    /// Checked out past the scheduled check-out date
    OverstayFee,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "Booking",
            Self::CancellationFee => "Cancellation fee",
            Self::NoShowFee => "No show fee",
            Self::OverstayFee => "Overstay fee",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Booking" => Self::Booking,
            "Cancellation fee" => Self::CancellationFee,
            "No show fee" => Self::NoShowFee,
            "Overstay fee" => Self::OverstayFee,
            _ => Self::Booking,
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single charge owed for a booking.
///
/// `money_to_pay` is computed once at creation and never changes.
/// The session fields stay empty until the checkout provider has
/// issued a payable session for this charge.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub money_to_pay: Decimal,
    pub session_id: Option<String>,
    pub session_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(booking_id: i64, payment_type: PaymentType, money_to_pay: Decimal) -> Self {
        Self {
            id: 0,
            booking_id,
            payment_type,
            status: PaymentStatus::Pending,
            money_to_pay,
            session_id: None,
            session_url: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this payment still counts against new charges of the
    /// same type. Expired payments do not block a replacement.
    pub fn blocks_new_charge(&self) -> bool {
        matches!(self.status, PaymentStatus::Pending | PaymentStatus::Paid)
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    /// Attach the checkout provider's session reference.
    pub fn attach_session(&mut self, session_id: String, session_url: String) {
        self.session_id = Some(session_id);
        self.session_url = Some(session_url);
    }

    /// One-way transition to Paid. Replayed settlements are a no-op;
    /// an expired payment can never become paid.
    pub fn mark_paid(&mut self) -> DomainResult<()> {
        match self.status {
            PaymentStatus::Paid => Ok(()),
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Paid;
                Ok(())
            }
            PaymentStatus::Expired => Err(DomainError::Validation(
                "Cannot mark an expired payment as paid.".to_string(),
            )),
        }
    }

    /// One-way transition to Expired. A paid payment never expires.
    pub fn mark_expired(&mut self) -> DomainResult<()> {
        match self.status {
            PaymentStatus::Expired => Ok(()),
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Expired;
                Ok(())
            }
            PaymentStatus::Paid => Err(DomainError::Validation(
                "Cannot expire a paid payment.".to_string(),
            )),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_payment() -> Payment {
        Payment::new(1, PaymentType::Booking, dec!(200.00))
    }

    #[test]
    fn new_payment_is_pending_without_session() {
        let p = sample_payment();
        assert_eq!(p.status, PaymentStatus::Pending);
        assert!(!p.has_session());
        assert!(p.blocks_new_charge());
        assert_eq!(p.money_to_pay, dec!(200.00));
    }

    #[test]
    fn mark_paid_is_idempotent() {
        let mut p = sample_payment();
        p.mark_paid().unwrap();
        assert_eq!(p.status, PaymentStatus::Paid);
        p.mark_paid().unwrap();
        assert_eq!(p.status, PaymentStatus::Paid);
    }

    #[test]
    fn expired_payment_cannot_be_paid() {
        let mut p = sample_payment();
        p.mark_expired().unwrap();
        assert!(p.mark_paid().is_err());
        assert_eq!(p.status, PaymentStatus::Expired);
    }

    #[test]
    fn paid_payment_cannot_expire() {
        let mut p = sample_payment();
        p.mark_paid().unwrap();
        assert!(p.mark_expired().is_err());
        assert_eq!(p.status, PaymentStatus::Paid);
    }

    #[test]
    fn expired_payment_does_not_block_new_charge() {
        let mut p = sample_payment();
        p.mark_expired().unwrap();
        assert!(!p.blocks_new_charge());
    }

    #[test]
    fn attach_session_sets_both_fields() {
        let mut p = sample_payment();
        p.attach_session("cs_123".into(), "https://pay.example/cs_123".into());
        assert!(p.has_session());
        assert_eq!(p.session_id.as_deref(), Some("cs_123"));
    }

    #[test]
    fn status_display_roundtrip() {
        for status in &[
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Expired,
        ] {
            assert_eq!(&PaymentStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn type_display_roundtrip() {
        for ty in &[
            PaymentType::Booking,
            PaymentType::CancellationFee,
            PaymentType::NoShowFee,
            PaymentType::OverstayFee,
        ] {
            assert_eq!(&PaymentType::from_str(ty.as_str()), ty);
        }
    }
}
