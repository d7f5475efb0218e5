//! Graceful shutdown handling
//!
//! One shared signal coordinates the HTTP server, the charge worker
//! and the periodic sweeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

/// Shutdown signal that can be cloned and shared across tasks
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            info!("Shutdown signal triggered");
            let _ = self.sender.send(());
        }
    }

    pub async fn wait(&self) {
        if self.is_triggered() {
            return;
        }
        let mut rx = self.subscribe();
        let _ = rx.recv().await;
    }

    /// Spawn a task that triggers the signal on SIGTERM or SIGINT.
    pub fn listen_for_os_signals(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal as unix_signal, SignalKind};

                let mut sigterm = unix_signal(SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler");
                let mut sigint = unix_signal(SignalKind::interrupt())
                    .expect("Failed to install SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM signal"),
                    _ = sigint.recv() => info!("Received SIGINT signal (Ctrl+C)"),
                }
            }

            #[cfg(not(unix))]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");
                info!("Received Ctrl+C signal");
            }

            signal.trigger();
        });
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_after_trigger() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        signal.trigger();
        assert!(signal.is_triggered());
        // must not hang even though trigger happened before wait
        signal.wait().await;
    }

    #[tokio::test]
    async fn trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
    }
}
