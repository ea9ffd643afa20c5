use nr_core::{Error, Result};
use std::future::Future;
use tokio::sync::watch;

/// Create a connected trigger/signal pair. The signal is cloneable and
/// fires once the trigger is pulled or dropped.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, ShutdownSignal { receiver })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // No receivers left means nothing to stop
        let _ = self.sender.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown is requested.
    pub async fn triggered(&mut self) {
        while !*self.receiver.borrow_and_update() {
            if self.receiver.changed().await.is_err() {
                // Trigger dropped
                return;
            }
        }
    }

    /// Run `fut` unless shutdown fires first, in which case the future is
    /// dropped and `Error::Cancelled` returned.
    pub async fn guard<F, T>(&mut self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_triggered() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.triggered() => Err(Error::Cancelled),
            result = fut => result,
        }
    }

    /// Sleep for `duration`, returning early with `Error::Cancelled` on shutdown.
    pub async fn sleep(&mut self, duration: std::time::Duration) -> Result<()> {
        self.guard(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}
