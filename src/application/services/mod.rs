pub mod bookings;
pub mod charge_worker;
pub mod payments;
pub mod sweeps;

#[cfg(test)]
mod tests;

pub use bookings::{BookingService, CreateBooking};
pub use charge_worker::{start_charge_worker, ChargeQueue, ChargeRequest};
pub use payments::{PaymentService, SettlementOutcome};
pub use sweeps::{start_no_show_sweep, start_payment_expiry_sweep};
