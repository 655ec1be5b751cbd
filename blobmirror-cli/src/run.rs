//! Wires config, store and synchronizer together.

use crate::cli::Cli;
use anyhow::Context;
use blobmirror_store::S3ObjectStore;
use blobmirror_sync::{run_periodic, stop_channel, DownloadReport, SyncConfig, Synchronizer};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SyncConfig::default(),
    };
    let config = cli.merge_into(base);
    config.validate().context("invalid configuration")?;

    let store = S3ObjectStore::connect(&config.connection_info()?)
        .await
        .context("connecting to object store")?;
    let sync = config.build(Arc::new(store), print_report)?;

    if cli.once {
        let summary = sync.synchronize_once().await?;
        info!(
            "{}: {} listed, {} downloaded ({} bytes)",
            sync.describe(),
            summary.listed,
            summary.downloaded,
            summary.bytes
        );
        return Ok(());
    }

    let (handle, signal) = stop_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                handle.stop();
            }
            Err(e) => warn!("cannot listen for Ctrl-C: {e}"),
        }
    });

    run_periodic(sync.as_ref(), config.interval(), signal).await?;
    Ok(())
}

fn print_report(report: &DownloadReport) {
    let modified = report
        .last_modified
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {} bytes  modified {}  -> {}  ({:.2?})",
        report.locator,
        report.size_bytes,
        modified,
        report.local_path.display(),
        report.elapsed
    );
}
