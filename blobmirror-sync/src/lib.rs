//! One-way mirroring of remote object-store containers.
//!
//! Detects changed objects by comparing each object's etag against a
//! persisted fingerprint ledger and downloads only what changed:
//! - [`FingerprintLedger`]: name → etag table with an atomic check-and-update
//! - [`ObjectSynchronizer`]: mirrors one object to one local file
//! - [`ContainerSynchronizer`]: mirrors a whole container to a directory tree,
//!   page by page, with bounded parallel downloads
//! - [`run_periodic`]: repeats passes on a fixed delay until stopped or failed

pub mod config;
pub mod container;
pub mod error;
pub mod ledger;
pub mod object;
pub mod scheduler;
pub mod stop;
pub mod types;

pub use config::SyncConfig;
pub use container::{ContainerSynchronizer, DEFAULT_PARALLELISM, LEDGER_FILE_NAME};
pub use error::{SyncError, SyncResult};
pub use ledger::FingerprintLedger;
pub use object::ObjectSynchronizer;
pub use scheduler::{run_periodic, Synchronizer};
pub use stop::{stop_channel, StopHandle, StopSignal};
pub use types::*;
