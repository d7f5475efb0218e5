//! User domain entity

use chrono::{DateTime, Utc};

use crate::domain::booking::Booking;
use crate::domain::payment::Payment;

/// A registered guest or staff member.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password_hash: impl Into<String>,
        is_staff: bool,
    ) -> Self {
        Self {
            id: 0,
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            password_hash: password_hash.into(),
            is_staff,
            created_at: Utc::now(),
        }
    }
}

/// The authenticated caller of a use case. Regular users see only
/// their own bookings and payments; staff see everything.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i64,
    pub is_staff: bool,
}

impl Actor {
    pub fn can_view_booking(&self, booking: &Booking) -> bool {
        self.is_staff || booking.user_id == self.user_id
    }

    pub fn can_view_payment(&self, payment: &Payment, booking: &Booking) -> bool {
        debug_assert_eq!(payment.booking_id, booking.id);
        self.is_staff || booking.user_id == self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn staff_sees_all_bookings() {
        let booking = Booking::new(
            1,
            42,
            NaiveDate::from_ymd_opt(2026, 9, 3).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 5).unwrap(),
            dec!(100),
        );
        let staff = Actor { user_id: 1, is_staff: true };
        let owner = Actor { user_id: 42, is_staff: false };
        let other = Actor { user_id: 7, is_staff: false };

        assert!(staff.can_view_booking(&booking));
        assert!(owner.can_view_booking(&booking));
        assert!(!other.can_view_booking(&booking));
    }
}
