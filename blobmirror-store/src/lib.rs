//! Remote object-store access for blobmirror.
//!
//! Provides the read side of an object store that the sync engine mirrors:
//! - Connection descriptor parsing (`Region=...;Endpoint=...`)
//! - Paged container listings with continuation tokens
//! - Per-object metadata lookup
//! - Streaming downloads to a local path
//!
//! Retry and backoff on transient failures are applied inside the store;
//! callers only see errors once the retry budget is exhausted.

pub mod config;
pub mod error;
pub mod object_store;
pub mod s3_store;
pub mod types;

pub use config::ConnectionInfo;
pub use error::{StoreError, StoreResult};
pub use object_store::{is_scratch_name, partial_path, scratch_sibling, ObjectStore, SCRATCH_PREFIX};
pub use s3_store::S3ObjectStore;
pub use types::*;
