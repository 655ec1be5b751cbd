//! Mirrors a single remote object to a single local file.

use crate::error::{SyncError, SyncResult};
use crate::ledger::FingerprintLedger;
use crate::scheduler::Synchronizer;
use crate::stop::StopSignal;
use crate::types::{DownloadObserver, DownloadReport, PassSummary};
use async_trait::async_trait;
use blobmirror_store::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Suffix of the per-object ledger file written next to the destination.
pub const OBJECT_LEDGER_SUFFIX: &str = "BlobEtags.json";

/// Keeps one named remote object mirrored to one local file.
pub struct ObjectSynchronizer {
    store: Arc<dyn ObjectStore>,
    container: String,
    object_name: String,
    destination: PathBuf,
    ledger_path: PathBuf,
    observer: Option<Arc<dyn DownloadObserver>>,
}

impl ObjectSynchronizer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        container: impl Into<String>,
        object_name: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> SyncResult<Self> {
        let container = container.into();
        let object_name = object_name.into();
        let destination = destination.into();

        if container.trim().is_empty() {
            return Err(SyncError::InvalidArgument("container is empty".into()));
        }
        if object_name.trim().is_empty() {
            return Err(SyncError::InvalidArgument("object name is empty".into()));
        }
        if destination.as_os_str().is_empty() || destination.file_name().is_none() {
            return Err(SyncError::InvalidArgument(format!(
                "destination {} is not a file path",
                destination.display()
            )));
        }

        let ledger_path = object_ledger_path(&destination, &object_name);
        Ok(Self {
            store,
            container,
            object_name,
            destination,
            ledger_path,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: impl DownloadObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// `<destination dir>/<object name>BlobEtags.json`, with path separators in
/// the object name flattened so the ledger stays beside the destination.
pub fn object_ledger_path(destination: &Path, object_name: &str) -> PathBuf {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let flat: String = object_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    dir.join(format!("{flat}{OBJECT_LEDGER_SUFFIX}"))
}

#[async_trait]
impl Synchronizer for ObjectSynchronizer {
    fn describe(&self) -> String {
        format!("{}/{} -> {}", self.container, self.object_name, self.destination.display())
    }

    async fn run_pass(&self, stop: &StopSignal) -> SyncResult<PassSummary> {
        let ledger = FingerprintLedger::load(&self.ledger_path).await?;
        let mut summary = PassSummary {
            listed: 1,
            ..PassSummary::default()
        };

        let remote = stop
            .guard(self.store.head(&self.container, &self.object_name))
            .await??;

        if ledger.is_new_and_update(&self.object_name, &remote.etag)? {
            if let Some(parent) = self.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }

            let started = Instant::now();
            let bytes = stop
                .guard(
                    self.store
                        .download_to(&self.container, &self.object_name, &self.destination),
                )
                .await??;

            let report = DownloadReport {
                locator: remote.locator,
                last_modified: remote.last_modified,
                size_bytes: bytes,
                local_path: self.destination.clone(),
                elapsed: started.elapsed(),
            };
            debug!("downloaded {} ({bytes} bytes in {:?})", report.locator, report.elapsed);
            if let Some(observer) = &self.observer {
                observer.on_download(&report);
            }
            summary.record_download(bytes);
            info!("{} updated", self.describe());
        } else {
            debug!("{} unchanged (etag {})", self.object_name, remote.etag);
        }

        // Saved even when unchanged, matching the container path.
        ledger.save(&self.ledger_path).await?;
        Ok(summary)
    }
}
