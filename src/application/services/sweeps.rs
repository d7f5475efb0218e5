//! Background sweep tasks
//!
//! Periodic no-show flagging and pending-payment expiry. Both steps
//! are idempotent, so overlapping or repeated runs are harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::bookings::BookingService;
use super::payments::PaymentService;
use crate::shared::ShutdownSignal;

/// Spawn the periodic no-show sweep.
pub fn start_no_show_sweep(
    bookings: Arc<BookingService>,
    interval_secs: u64,
    shutdown: ShutdownSignal,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        info!(interval_secs, "No-show sweep started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let today = Utc::now().date_naive();
                    match bookings.sweep_no_shows(today).await {
                        Ok(0) => {}
                        Ok(count) => info!(count, "No-show sweep pass done"),
                        Err(e) => warn!(error = %e, "No-show sweep pass failed"),
                    }
                }
                _ = shutdown.wait() => {
                    info!("No-show sweep shutting down");
                    break;
                }
            }
        }
    })
}

/// Spawn the periodic pending-payment expiry sweep.
pub fn start_payment_expiry_sweep(
    payments: Arc<PaymentService>,
    interval_secs: u64,
    shutdown: ShutdownSignal,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        info!(interval_secs, "Payment expiry sweep started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match payments.sweep_expired(Utc::now()).await {
                        Ok(0) => {}
                        Ok(count) => info!(count, "Payment expiry pass done"),
                        Err(e) => warn!(error = %e, "Payment expiry pass failed"),
                    }
                }
                _ = shutdown.wait() => {
                    info!("Payment expiry sweep shutting down");
                    break;
                }
            }
        }
    })
}
