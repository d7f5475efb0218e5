//! Outbound ports for external collaborators
//!
//! [`CheckoutSessionProvider`] decouples the payment ledger from the
//! concrete payment processor; [`NotificationSink`] decouples the
//! orchestrator from the notification transport. Production wiring
//! lives in `infrastructure::checkout` and `infrastructure::notifier`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// A provider-hosted payable session for one charge.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub session_url: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Checkout provider unavailable: {0}")]
    Unavailable(String),

    #[error("Amount {0} not representable in minor currency units")]
    InvalidAmount(Decimal),
}

impl ProviderError {
    /// Availability problems are worth retrying; bad amounts are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Port for creating payable sessions with the payment processor.
#[async_trait]
pub trait CheckoutSessionProvider: Send + Sync {
    async fn create_session(
        &self,
        amount: Decimal,
        label: &str,
    ) -> Result<CheckoutSession, ProviderError>;
}

#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Port for fire-and-forget operational notifications.
///
/// Delivery failures are retried with backoff and then logged; they
/// never propagate to the triggering request.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}
