//! Explicit stop signal for periodic synchronization.
//!
//! A [`StopHandle`] flips a watch channel; every [`StopSignal`] clone sees it.
//! Dropping all handles without calling `stop` never stops the loop.

use crate::error::{SyncError, SyncResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Requests that a running periodic loop stop.
#[derive(Clone, Debug)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed at every suspension point of a pass and of the periodic loop.
#[derive(Clone, Debug)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Creates a connected handle/signal pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop has been requested.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Every handle is gone; nobody can stop us any more.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Runs `fut` unless stop is requested first, in which case `fut` is
    /// dropped and [`SyncError::Stopped`] is returned.
    pub async fn guard<F: Future>(&self, fut: F) -> SyncResult<F::Output> {
        if self.is_stopped() {
            return Err(SyncError::Stopped);
        }
        tokio::select! {
            biased;
            _ = self.stopped() => Err(SyncError::Stopped),
            out = fut => Ok(out),
        }
    }
}
