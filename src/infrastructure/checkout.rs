//! Development checkout session provider
//!
//! Stands in for a hosted payment processor: mints a unique session id
//! and a payable URL under the configured base. The settlement webhook
//! closes the loop, so the whole lifecycle is exercisable locally.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{CheckoutSession, CheckoutSessionProvider, ProviderError};
use crate::domain::pricing;

pub struct DevCheckoutProvider {
    base_url: String,
}

impl DevCheckoutProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CheckoutSessionProvider for DevCheckoutProvider {
    async fn create_session(
        &self,
        amount: Decimal,
        label: &str,
    ) -> Result<CheckoutSession, ProviderError> {
        // Real processors take amounts in minor units; reject anything
        // that cannot be represented that way.
        let minor_units =
            pricing::to_minor_units(amount).ok_or(ProviderError::InvalidAmount(amount))?;
        if minor_units < 0 {
            return Err(ProviderError::InvalidAmount(amount));
        }

        let session_id = format!("cs_{}", Uuid::new_v4().simple());
        let session_url = format!("{}/pay/{}", self.base_url.trim_end_matches('/'), session_id);

        debug!(session_id, amount = %amount, label, "Checkout session created");

        Ok(CheckoutSession {
            session_id,
            session_url,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn sessions_are_unique_and_under_base_url() {
        let provider = DevCheckoutProvider::new("http://localhost:8080");
        let a = provider
            .create_session(dec!(100.00), "Booking payment for booking #1")
            .await
            .unwrap();
        let b = provider
            .create_session(dec!(100.00), "Booking payment for booking #1")
            .await
            .unwrap();

        assert_ne!(a.session_id, b.session_id);
        assert!(a.session_url.starts_with("http://localhost:8080/pay/cs_"));
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let provider = DevCheckoutProvider::new("http://localhost:8080");
        let result = provider.create_session(dec!(-5), "bad").await;
        assert!(matches!(result, Err(ProviderError::InvalidAmount(_))));
    }
}
