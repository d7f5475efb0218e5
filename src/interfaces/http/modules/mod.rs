pub mod auth;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod rooms;
