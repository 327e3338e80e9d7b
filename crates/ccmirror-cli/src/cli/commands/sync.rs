//! `ccmirror sync` – run one sync: check, download, verify, publish.

use anyhow::Result;
use ccmirror_core::config::MirrorConfig;
use ccmirror_core::control::AbortToken;
use ccmirror_core::store::GithubReleaseStore;
use ccmirror_core::sync::{run_sync, SyncOutcome};
use ccmirror_core::upstream::UpstreamClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::EXIT_UP_TO_DATE;

pub async fn run_sync_command(
    cfg: &MirrorConfig,
    staging_override: Option<PathBuf>,
) -> Result<ExitCode> {
    let upstream = Arc::new(UpstreamClient::from_config(cfg)?);
    let store = Arc::new(GithubReleaseStore::from_config(
        &cfg.release,
        cfg.fetch_options(),
    )?);
    let staging_dir = match staging_override {
        Some(dir) => dir,
        None => cfg.resolve_staging_dir()?,
    };

    // An interrupted run must never reach the publish step.
    let abort = AbortToken::new();
    let watcher = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, aborting run before publish");
            watcher.request_abort();
        }
    });

    match run_sync(cfg, upstream, store, &staging_dir, abort).await? {
        SyncOutcome::Published {
            version,
            asset_count,
        } => {
            println!("Published {version} with {asset_count} binaries + checksum manifest.");
            Ok(ExitCode::SUCCESS)
        }
        SyncOutcome::UpToDate {
            upstream,
            published,
        } => {
            match published {
                Some(prev) => println!("Up to date: upstream {upstream}, published {prev}."),
                None => println!("Up to date: upstream {upstream}."),
            }
            Ok(ExitCode::from(EXIT_UP_TO_DATE))
        }
    }
}
