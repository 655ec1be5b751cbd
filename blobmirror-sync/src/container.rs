//! Mirrors a whole container to a local directory tree.
//!
//! Each pass walks the remote listing page by page. Within a page every
//! object is checked against the shared ledger and changed objects are
//! downloaded concurrently; the ledger is saved once the page's downloads
//! have all finished, before the next page is requested. A crash therefore
//! loses at most one page of recorded fingerprints.
//!
//! The listing page size equals the download parallelism, so one page is
//! exactly one batch of concurrent downloads.

use crate::error::{SyncError, SyncResult};
use crate::ledger::FingerprintLedger;
use crate::scheduler::Synchronizer;
use crate::stop::StopSignal;
use crate::types::{DownloadObserver, DownloadReport, PassSummary};
use async_trait::async_trait;
use blobmirror_store::{is_scratch_name, ObjectStore, RemoteObject};
use futures::FutureExt;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Ledger file kept at the root of the destination directory.
pub const LEDGER_FILE_NAME: &str = "BlobEtags.json";

/// Default number of concurrent downloads (and listing page size).
pub const DEFAULT_PARALLELISM: usize = 5;

/// Keeps every object of a container mirrored under a local directory.
pub struct ContainerSynchronizer {
    store: Arc<dyn ObjectStore>,
    container: String,
    destination: PathBuf,
    parallelism: usize,
    observer: Option<Arc<dyn DownloadObserver>>,
}

impl ContainerSynchronizer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        container: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> SyncResult<Self> {
        let container = container.into();
        let destination = destination.into();

        if container.trim().is_empty() {
            return Err(SyncError::InvalidArgument("container is empty".into()));
        }
        if destination.as_os_str().is_empty() {
            return Err(SyncError::InvalidArgument("destination directory is empty".into()));
        }

        Ok(Self {
            store,
            container,
            destination,
            parallelism: DEFAULT_PARALLELISM,
            observer: None,
        })
    }

    /// Sets download parallelism, which is also the listing page size.
    pub fn with_parallelism(mut self, parallelism: usize) -> SyncResult<Self> {
        if parallelism == 0 {
            return Err(SyncError::InvalidArgument("parallelism must be at least 1".into()));
        }
        self.parallelism = parallelism;
        Ok(self)
    }

    pub fn with_observer(mut self, observer: impl DownloadObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.destination.join(LEDGER_FILE_NAME)
    }

    /// Local path for an object, or `None` if the name cannot be mirrored
    /// inside the destination directory. The ledger file and the reserved
    /// scratch namespace are never handed out.
    pub fn local_path_for(&self, name: &str) -> Option<PathBuf> {
        let relative = safe_relative_path(name)?;
        if relative == Path::new(LEDGER_FILE_NAME) {
            return None;
        }
        Some(self.destination.join(relative))
    }

    /// Checks one listed object and downloads it if its etag changed.
    /// Returns the bytes written, or `None` if nothing was downloaded.
    async fn sync_object(
        &self,
        ledger: &FingerprintLedger,
        object: &RemoteObject,
    ) -> SyncResult<Option<u64>> {
        let Some(local_path) = self.local_path_for(&object.name) else {
            if object.name.ends_with('/') {
                debug!("skipping directory marker {}", object.name);
            } else {
                warn!(
                    "skipping {}: name cannot be mirrored under {}",
                    object.name,
                    self.destination.display()
                );
            }
            return Ok(None);
        };

        if !ledger.is_new_and_update(&object.name, &object.etag)? {
            return Ok(None);
        }

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let started = Instant::now();
        let bytes = self
            .store
            .download_to(&self.container, &object.name, &local_path)
            .await?;

        let report = DownloadReport {
            locator: object.locator.clone(),
            last_modified: object.last_modified,
            size_bytes: bytes,
            local_path,
            elapsed: started.elapsed(),
        };
        debug!("downloaded {} ({bytes} bytes in {:?})", report.locator, report.elapsed);
        if let Some(observer) = &self.observer {
            observer.on_download(&report);
        }
        Ok(Some(bytes))
    }
}

/// Converts an object name into a relative path made only of normal
/// components: no root, no `.`/`..`, no empty or scratch segments.
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.starts_with('/') {
        return None;
    }

    let mut path = PathBuf::new();
    for segment in name.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || is_scratch_name(segment) {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => path.push(segment),
            _ => return None,
        }
    }
    Some(path)
}

#[async_trait]
impl Synchronizer for ContainerSynchronizer {
    fn describe(&self) -> String {
        format!("{} -> {}", self.container, self.destination.display())
    }

    async fn run_pass(&self, stop: &StopSignal) -> SyncResult<PassSummary> {
        tokio::fs::create_dir_all(&self.destination).await?;
        let ledger_path = self.ledger_path();
        let ledger = FingerprintLedger::load(&ledger_path).await?;

        let mut summary = PassSummary::default();
        let mut continuation: Option<String> = None;
        let mut page_number = 0usize;

        loop {
            let page = stop
                .guard(self.store.list_page(
                    &self.container,
                    continuation.as_deref(),
                    self.parallelism,
                ))
                .await??;
            page_number += 1;
            summary.listed += page.objects.len();

            let ledger_ref = &ledger;
            let object_futures: Vec<_> = page
                .objects
                .iter()
                .map(|object| self.sync_object(ledger_ref, object).boxed())
                .collect();
            let downloads = stream::iter(object_futures)
                .buffer_unordered(self.parallelism)
                .try_collect::<Vec<_>>();

            let results = stop.guard(downloads).await??;
            for bytes in results.into_iter().flatten() {
                summary.record_download(bytes);
            }

            ledger.save(&ledger_path).await?;
            debug!(
                "page {page_number} of {} done ({} objects)",
                self.container,
                page.objects.len()
            );

            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        if summary.downloaded > 0 {
            info!(
                "{}: downloaded {} of {} objects ({} bytes)",
                self.describe(),
                summary.downloaded,
                summary.listed,
                summary.bytes
            );
        }
        Ok(summary)
    }
}
