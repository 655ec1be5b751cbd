//! Persistent name → etag ledger used for change detection.
//!
//! On disk the ledger is a flat JSON object (`{"name": "etag", ...}`) with
//! no metadata. A missing file is an empty ledger, so a first run treats
//! every object as new.

use crate::error::{SyncError, SyncResult};
use blobmirror_store::scratch_sibling;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Fingerprint table shared by the downloads of one pass.
///
/// The only mutation is [`is_new_and_update`](Self::is_new_and_update),
/// which checks and stores under one lock so concurrent callers never lose
/// an update or both see the same entity as new.
#[derive(Debug, Default)]
pub struct FingerprintLedger {
    entries: Mutex<HashMap<String, String>>,
}

impl FingerprintLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a ledger from `path`. A missing or blank file yields an empty ledger.
    pub async fn load(path: &Path) -> SyncResult<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no ledger at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let entries: HashMap<String, String> = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::MalformedLedger(format!("{}: {e}", path.display())))?;

        debug!("loaded {} fingerprints from {}", entries.len(), path.display());
        Ok(Self {
            entries: Mutex::new(entries),
        })
    }

    /// Writes the full table to `path`.
    ///
    /// The JSON goes to a sibling temp file first and is renamed over the
    /// target, so readers see either the old or the new ledger.
    pub async fn save(&self, path: &Path) -> SyncResult<()> {
        let snapshot = self.snapshot();
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| SyncError::MalformedLedger(format!("encode failed: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!("saved {} fingerprints to {}", snapshot.len(), path.display());
        Ok(())
    }

    /// Returns `false` if `fingerprint` is already stored for `entity`.
    /// Otherwise stores it and returns `true`.
    pub fn is_new_and_update(&self, entity: &str, fingerprint: &str) -> SyncResult<bool> {
        if entity.is_empty() {
            return Err(SyncError::InvalidArgument("entity name is empty".into()));
        }
        if fingerprint.is_empty() {
            return Err(SyncError::InvalidArgument(format!(
                "fingerprint for {entity} is empty"
            )));
        }

        let mut entries = self.lock();
        if entries.get(entity).is_some_and(|stored| stored == fingerprint) {
            return Ok(false);
        }
        entries.insert(entity.to_string(), fingerprint.to_string());
        Ok(true)
    }

    /// Returns the stored fingerprint for `entity`, if any.
    pub fn fingerprint(&self, entity: &str) -> Option<String> {
        self.lock().get(entity).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the table.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned table is still read and written as-is.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    scratch_sibling(path, ".tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_is_hidden_sibling() {
        assert_eq!(
            temp_path(Path::new("/out/BlobEtags.json")),
            PathBuf::from("/out/.blobmirror-BlobEtags.json.tmp")
        );
    }

    #[test]
    fn update_overwrites_not_appends() {
        let ledger = FingerprintLedger::new();
        assert!(ledger.is_new_and_update("a", "1").unwrap());
        assert!(ledger.is_new_and_update("a", "2").unwrap());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.fingerprint("a").as_deref(), Some("2"));
    }
}
