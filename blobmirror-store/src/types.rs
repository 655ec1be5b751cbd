//! Shared types for object-store listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptor of one remote object, as reported by a listing or a HEAD.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Object name within its container. May contain `/` separators.
    pub name: String,
    /// Opaque version token. Equal tokens mean unchanged content.
    pub etag: String,
    pub size_bytes: u64,
    /// Not every store reports a modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// URI-like locator, e.g. `s3://bucket/key`.
    pub locator: String,
}

/// One page of a container listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<RemoteObject>,
    /// Cursor for the next page; `None` once the listing is exhausted.
    pub continuation: Option<String>,
}

impl ObjectPage {
    /// Returns true if another page follows this one.
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// Strips the surrounding double quotes S3 puts around etags.
pub fn normalize_etag(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}
