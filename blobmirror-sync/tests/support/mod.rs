//! Shared test helpers: an in-memory object store that records calls.

#![allow(dead_code)]

use async_trait::async_trait;
use blobmirror_store::{
    partial_path, ObjectPage, ObjectStore, RemoteObject, StoreError, StoreResult,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone)]
struct StoredObject {
    etag: String,
    body: Vec<u8>,
}

/// In-memory container store. Listings are sorted by name and paged by
/// index; continuation tokens are the next start index.
#[derive(Default)]
pub struct MemoryStore {
    containers: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    list_calls: Mutex<Vec<(Option<String>, usize)>>,
    head_calls: AtomicUsize,
    downloads: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    unavailable: Mutex<bool>,
    download_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, container: &str, name: &str, etag: &str, body: &[u8]) {
        self.containers
            .lock()
            .unwrap()
            .entry(container.to_string())
            .or_default()
            .insert(
                name.to_string(),
                StoredObject {
                    etag: etag.to_string(),
                    body: body.to_vec(),
                },
            );
    }

    /// Makes downloads of `name` fail with `Unavailable`.
    pub fn fail_download(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn heal(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
    }

    /// Makes every call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// Each download sleeps this long before writing.
    pub fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.lock().unwrap() = Some(delay);
    }

    /// Names downloaded so far, in completion order.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn clear_downloads(&self) {
        self.downloads.lock().unwrap().clear();
    }

    /// `(continuation, page_size)` of every list call.
    pub fn list_calls(&self) -> Vec<(Option<String>, usize)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StoreResult<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable("injected outage".into()));
        }
        Ok(())
    }

    fn get(&self, container: &str, name: &str) -> StoreResult<StoredObject> {
        self.containers
            .lock()
            .unwrap()
            .get(container)
            .and_then(|objects| objects.get(name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("mem://{container}/{name}")))
    }
}

fn describe(container: &str, name: &str, object: &StoredObject) -> RemoteObject {
    RemoteObject {
        name: name.to_string(),
        etag: object.etag.clone(),
        size_bytes: object.body.len() as u64,
        last_modified: None,
        locator: format!("mem://{container}/{name}"),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        container: &str,
        continuation: Option<&str>,
        page_size: usize,
    ) -> StoreResult<ObjectPage> {
        self.list_calls
            .lock()
            .unwrap()
            .push((continuation.map(str::to_string), page_size));
        self.check_available()?;

        let start: usize = continuation.map(|t| t.parse().unwrap()).unwrap_or(0);
        let containers = self.containers.lock().unwrap();
        let objects = containers
            .get(container)
            .ok_or_else(|| StoreError::NotFound(format!("container {container}")))?;

        let page: Vec<RemoteObject> = objects
            .iter()
            .skip(start)
            .take(page_size)
            .map(|(name, object)| describe(container, name, object))
            .collect();
        let next = start + page.len();
        let continuation = (next < objects.len()).then(|| next.to_string());

        Ok(ObjectPage {
            objects: page,
            continuation,
        })
    }

    async fn head(&self, container: &str, name: &str) -> StoreResult<RemoteObject> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let object = self.get(container, name)?;
        Ok(describe(container, name, &object))
    }

    async fn download_to(&self, container: &str, name: &str, path: &Path) -> StoreResult<u64> {
        self.check_available()?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.download_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        let failing = self.failing.lock().unwrap().contains(name);
        let result = match self.get(container, name) {
            _ if failing => Err(StoreError::Unavailable(format!("injected failure for {name}"))),
            Ok(object) => stage_and_rename(path, &object.body).await,
            Err(e) => Err(e),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if result.is_ok() {
            self.downloads.lock().unwrap().push(name.to_string());
        }
        result
    }
}

/// Writes through the part file and renames it into place, like the S3 store.
async fn stage_and_rename(path: &Path, body: &[u8]) -> StoreResult<u64> {
    let part = partial_path(path);
    tokio::fs::write(&part, body).await?;
    tokio::fs::rename(&part, path).await?;
    Ok(body.len() as u64)
}

/// Observer that collects reports for later assertions.
#[derive(Clone, Default)]
pub struct Recorder {
    reports: std::sync::Arc<Mutex<Vec<blobmirror_sync::DownloadReport>>>,
}

impl Recorder {
    pub fn reports(&self) -> Vec<blobmirror_sync::DownloadReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl blobmirror_sync::DownloadObserver for Recorder {
    fn on_download(&self, report: &blobmirror_sync::DownloadReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}
