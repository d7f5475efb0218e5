//! Deferred charge worker
//!
//! Lifecycle transitions enqueue charge requests instead of calling
//! the checkout provider inline, so a slow or failing provider never
//! blocks a check-in or cancellation response. The worker drains the
//! queue, re-reads the booking and runs the idempotent ledger step.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::payments::PaymentService;
use crate::domain::payment::{PaymentStatus, PaymentType};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::{retry_with_backoff, RetryConfig, ShutdownSignal};

/// A charge that should exist for a booking. Requests are safe to
/// duplicate: processing is keyed on (booking, type) in the ledger.
#[derive(Debug, Clone, Copy)]
pub struct ChargeRequest {
    pub booking_id: i64,
    pub payment_type: PaymentType,
}

/// Cloneable handle for enqueueing charge requests.
#[derive(Clone)]
pub struct ChargeQueue {
    sender: mpsc::UnboundedSender<ChargeRequest>,
}

impl ChargeQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChargeRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, request: ChargeRequest) {
        if self.sender.send(request).is_err() {
            warn!(
                booking_id = request.booking_id,
                "Charge worker is gone; dropping charge request"
            );
        }
    }
}

/// Spawn the background task that processes charge requests until the
/// queue closes or shutdown is signalled.
pub fn start_charge_worker(
    repos: Arc<dyn RepositoryProvider>,
    payments: Arc<PaymentService>,
    mut receiver: mpsc::UnboundedReceiver<ChargeRequest>,
    shutdown: ShutdownSignal,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!("Charge worker started");
        loop {
            tokio::select! {
                maybe_request = receiver.recv() => {
                    let Some(request) = maybe_request else { break };
                    let result = retry_with_backoff(
                        RetryConfig::default(),
                        || process_charge(repos.as_ref(), &payments, request),
                        DomainError::is_transient,
                        "process_charge",
                    )
                    .await;
                    if let Err(e) = result {
                        warn!(
                            booking_id = request.booking_id,
                            payment_type = %request.payment_type,
                            error = %e,
                            "Charge request failed; payment stays pending without a session"
                        );
                    }
                }
                _ = shutdown.wait() => {
                    info!("Charge worker shutting down");
                    break;
                }
            }
        }
    })
}

async fn process_charge(
    repos: &dyn RepositoryProvider,
    payments: &PaymentService,
    request: ChargeRequest,
) -> DomainResult<()> {
    // Re-read at processing time; the booking may be gone by now.
    let Some(booking) = repos.bookings().find_by_id(request.booking_id).await? else {
        debug!(
            booking_id = request.booking_id,
            "Booking vanished before charge processing"
        );
        return Ok(());
    };

    let payment = payments
        .get_or_create_pending(&booking, request.payment_type)
        .await?;

    if payment.status == PaymentStatus::Paid || payment.has_session() {
        debug!(payment_id = payment.id, "Charge already settled or payable");
        return Ok(());
    }

    payments.ensure_session(payment).await?;
    Ok(())
}
