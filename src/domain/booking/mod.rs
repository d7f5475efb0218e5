pub mod model;
pub mod repository;

pub use model::{Booking, BookingStatus, CancellationOutcome, CheckOutOutcome};
pub use repository::{BookingFilter, BookingRepository};
