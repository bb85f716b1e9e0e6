// ABOUTME: Cooperative cancellation shared by every pipeline in a run.
// ABOUTME: Tripped by Ctrl-C or the deploy timeout; observed up to verification.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal is tripped.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so this only returns once tripped.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Trip the signal after `timeout`.
    pub fn cancel_after(&self, timeout: Duration) {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::warn!("deploy timeout of {:?} reached, cancelling", timeout);
            signal.cancel();
        });
    }

    /// Trip the signal on Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling deployments not yet cut over");
                signal.cancel();
            }
        });
    }
}
