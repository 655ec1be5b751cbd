//! Records produced by synchronization passes.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// One completed download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadReport {
    /// Remote locator, e.g. `s3://bucket/key`.
    pub locator: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub local_path: PathBuf,
    pub elapsed: Duration,
}

/// Receives a [`DownloadReport`] for every successful download.
///
/// Container passes call observers from concurrent downloads, in no
/// particular order.
pub trait DownloadObserver: Send + Sync {
    fn on_download(&self, report: &DownloadReport);
}

impl<F> DownloadObserver for F
where
    F: Fn(&DownloadReport) + Send + Sync,
{
    fn on_download(&self, report: &DownloadReport) {
        (self)(report)
    }
}

/// Counts for one finished pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Objects seen in the remote listing (or 1 for a single-object pass).
    pub listed: usize,
    pub downloaded: usize,
    pub bytes: u64,
}

impl PassSummary {
    pub(crate) fn record_download(&mut self, bytes: u64) {
        self.downloaded += 1;
        self.bytes += bytes;
    }
}
