//! The seam between the sync engine and a concrete object store.

use crate::error::StoreResult;
use crate::types::{ObjectPage, RemoteObject};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File-name prefix reserved for scratch files the mirror writes next to
/// downloaded objects. Object names using it are never mirrored.
pub const SCRATCH_PREFIX: &str = ".blobmirror-";

/// True if a path segment falls in the reserved scratch namespace.
pub fn is_scratch_name(segment: &str) -> bool {
    segment.starts_with(SCRATCH_PREFIX)
}

/// Hidden sibling a download streams into before being renamed over `path`.
pub fn partial_path(path: &Path) -> PathBuf {
    scratch_sibling(path, ".part")
}

/// `<dir>/.blobmirror-<file name><suffix>`.
pub fn scratch_sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = std::ffi::OsString::from(SCRATCH_PREFIX);
    if let Some(file_name) = path.file_name() {
        name.push(file_name);
    }
    name.push(suffix);
    path.with_file_name(name)
}

/// Read access to a remote object store.
///
/// Implementations own their retry/backoff policy and report only
/// exhausted-retry failures.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of `container`, starting at `continuation` (or the
    /// beginning when `None`). At most `page_size` objects are returned.
    async fn list_page(
        &self,
        container: &str,
        continuation: Option<&str>,
        page_size: usize,
    ) -> StoreResult<ObjectPage>;

    /// Fetches current metadata for a single object.
    async fn head(&self, container: &str, name: &str) -> StoreResult<RemoteObject>;

    /// Downloads an object's bytes to `path`, creating or replacing the
    /// file. Parent directories must already exist. Returns bytes written.
    ///
    /// Implementations that stage the body on disk write it to
    /// [`partial_path`] first.
    async fn download_to(&self, container: &str, name: &str, path: &Path) -> StoreResult<u64>;
}
