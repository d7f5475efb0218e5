//! Charge policy engine
//!
//! Pure computation of the amount owed for a booking and charge type.
//! All arithmetic is exact decimal; conversion to minor currency units
//! happens only at the checkout provider boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::booking::Booking;
use crate::domain::payment::PaymentType;

const CANCELLATION_RATE: Decimal = dec!(0.5);
const NO_SHOW_RATE: Decimal = dec!(1.2);
const OVERSTAY_RATE: Decimal = dec!(1.5);

/// Amount owed for a charge of the given type against this booking.
pub fn amount_owed(booking: &Booking, payment_type: PaymentType) -> Decimal {
    let stay_price = booking.price_per_night * Decimal::from(booking.nights());

    match payment_type {
        PaymentType::Booking => stay_price,
        PaymentType::CancellationFee => stay_price * CANCELLATION_RATE,
        PaymentType::NoShowFee => stay_price * NO_SHOW_RATE,
        PaymentType::OverstayFee => {
            let overstay_days = booking
                .actual_check_out_date
                .map(|actual| (actual - booking.check_out_date).num_days().max(0))
                .unwrap_or(0);
            Decimal::from(overstay_days) * booking.price_per_night * OVERSTAY_RATE
        }
    }
}

/// Round to 2 decimal places and express in minor currency units
/// (cents). Returns `None` if the amount does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount.round_dp(2) * dec!(100)).to_i64()
}

// ── Tests ──────────────────────────────────────────────────────
