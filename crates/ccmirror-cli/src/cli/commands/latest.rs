//! `ccmirror latest` – print the upstream latest version.

use anyhow::Result;
use ccmirror_core::config::MirrorConfig;
use ccmirror_core::upstream::UpstreamClient;

pub async fn run_latest(cfg: &MirrorConfig) -> Result<()> {
    let upstream = UpstreamClient::from_config(cfg)?;
    let latest = tokio::task::spawn_blocking(move || upstream.latest_version()).await??;
    println!("{latest}");
    Ok(())
}
