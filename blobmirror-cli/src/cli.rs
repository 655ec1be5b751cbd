//! Command-line arguments.

use blobmirror_sync::SyncConfig;
use clap::Parser;
use std::path::PathBuf;

/// Mirror an S3 container (or one object in it) to a local directory.
#[derive(Debug, Parser)]
#[command(name = "blobmirror", version, about)]
pub struct Cli {
    /// JSON config file. Flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Connection descriptor, e.g. "Region=us-east-1;Endpoint=http://localhost:9000".
    #[arg(long, env = "BLOBMIRROR_CONNECTION")]
    pub connection: Option<String>,

    /// Bucket to mirror.
    #[arg(long)]
    pub container: Option<String>,

    /// Mirror only this object instead of the whole container.
    #[arg(long)]
    pub object: Option<String>,

    /// Destination file (with --object) or directory.
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Concurrent downloads and listing page size.
    #[arg(short, long)]
    pub parallelism: Option<usize>,

    /// Seconds between passes.
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Run a single pass and exit.
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Applies flags on top of `base`.
    pub fn merge_into(&self, mut base: SyncConfig) -> SyncConfig {
        if let Some(connection) = &self.connection {
            base.connection = connection.clone();
        }
        if let Some(container) = &self.container {
            base.container = container.clone();
        }
        if let Some(object) = &self.object {
            base.object_name = Some(object.clone());
        }
        if let Some(destination) = &self.destination {
            base.destination = destination.clone();
        }
        if let Some(parallelism) = self.parallelism {
            base.parallelism = parallelism;
        }
        if let Some(interval) = self.interval {
            base.interval_secs = interval;
        }
        base
    }
}
