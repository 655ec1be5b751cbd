//! Mirror configuration.

use crate::container::{ContainerSynchronizer, DEFAULT_PARALLELISM};
use crate::error::{SyncError, SyncResult};
use crate::object::ObjectSynchronizer;
use crate::scheduler::Synchronizer;
use crate::types::DownloadObserver;
use blobmirror_store::{ConnectionInfo, ObjectStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for one mirror target.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Connection descriptor, e.g. `Region=us-east-1;Endpoint=http://localhost:9000`.
    pub connection: String,

    /// Bucket / container to mirror.
    pub container: String,

    /// Mirror only this object. `None` mirrors the whole container.
    pub object_name: Option<String>,

    /// Destination file (single object) or directory (container).
    pub destination: PathBuf,

    /// Concurrent downloads and listing page size (container mode).
    pub parallelism: usize,

    /// Delay between passes (seconds).
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            connection: "Region=us-east-1".to_string(),
            container: String::new(),
            object_name: None,
            destination: PathBuf::from("mirror"),
            parallelism: DEFAULT_PARALLELISM,
            interval_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            SyncError::InvalidArgument(format!("config {} is invalid: {e}", path.display()))
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn connection_info(&self) -> SyncResult<ConnectionInfo> {
        Ok(self.connection.parse()?)
    }

    pub fn validate(&self) -> SyncResult<()> {
        self.connection_info()?;
        if self.container.trim().is_empty() {
            return Err(SyncError::InvalidArgument("container is required".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(SyncError::InvalidArgument("destination is required".into()));
        }
        if self.parallelism == 0 {
            return Err(SyncError::InvalidArgument("parallelism must be at least 1".into()));
        }
        if self.interval_secs == 0 {
            return Err(SyncError::InvalidArgument("interval_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Builds the synchronizer this config describes on top of `store`.
    pub fn build(
        &self,
        store: Arc<dyn ObjectStore>,
        observer: impl DownloadObserver + 'static,
    ) -> SyncResult<Box<dyn Synchronizer>> {
        self.validate()?;
        match &self.object_name {
            Some(object_name) => Ok(Box::new(
                ObjectSynchronizer::new(store, &self.container, object_name, &self.destination)?
                    .with_observer(observer),
            )),
            None => Ok(Box::new(
                ContainerSynchronizer::new(store, &self.container, &self.destination)?
                    .with_parallelism(self.parallelism)?
                    .with_observer(observer),
            )),
        }
    }
}
