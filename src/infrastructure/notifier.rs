//! Log-backed notification sink
//!
//! Operational notifications (new bookings, no-shows) land in the
//! service log. Swapping in an email or chat transport only means
//! implementing [`NotificationSink`] somewhere else.

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{NotificationSink, NotifyError};

pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "notifications", "{}", message);
        Ok(())
    }
}
