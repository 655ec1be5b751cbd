//! Periodic driver shared by both synchronizers.
//!
//! `Idle -> Running(pass) -> Sleeping(interval) -> Running(pass) -> ...`
//!
//! The loop ends on the first failed pass (the error is returned) or when
//! its [`StopSignal`] fires (returns `Ok`). Pass N, including its ledger
//! save, always completes before pass N+1 starts.

use crate::error::{SyncError, SyncResult};
use crate::stop::StopSignal;
use crate::types::PassSummary;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info};

/// A target that can be brought up to date with one pass.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Human-readable target, used in logs.
    fn describe(&self) -> String;

    /// Runs one pass, abandoning it with [`SyncError::Stopped`] if `stop`
    /// fires while the pass is waiting on the network or on downloads.
    async fn run_pass(&self, stop: &StopSignal) -> SyncResult<PassSummary>;

    /// Runs one pass to completion.
    async fn synchronize_once(&self) -> SyncResult<PassSummary> {
        self.run_pass(&StopSignal::never()).await
    }
}

/// Runs `sync` then sleeps `interval`, forever.
///
/// Returns `Ok(())` once `stop` fires, or the first pass error.
pub async fn run_periodic<S>(sync: &S, interval: Duration, stop: StopSignal) -> SyncResult<()>
where
    S: Synchronizer + ?Sized,
{
    let target = sync.describe();
    info!("periodic sync started for {target} (every {interval:?})");

    loop {
        if stop.is_stopped() {
            break;
        }

        match sync.run_pass(&stop).await {
            Ok(summary) => {
                debug!(
                    "pass for {target} done: {} listed, {} downloaded ({} bytes)",
                    summary.listed, summary.downloaded, summary.bytes
                );
            }
            Err(SyncError::Stopped) => break,
            Err(e) => {
                error!("sync pass for {target} failed, stopping: {e}");
                return Err(e);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.stopped() => break,
        }
    }

    info!("periodic sync for {target} stopped");
    Ok(())
}
