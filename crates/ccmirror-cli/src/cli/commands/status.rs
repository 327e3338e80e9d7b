//! `ccmirror status` – compare upstream with the release store.

use anyhow::Result;
use ccmirror_core::config::MirrorConfig;
use ccmirror_core::store::{GithubReleaseStore, ReleaseStore};
use ccmirror_core::upstream::UpstreamClient;

pub async fn run_status(cfg: &MirrorConfig) -> Result<()> {
    let upstream = UpstreamClient::from_config(cfg)?;
    let store = GithubReleaseStore::from_config(&cfg.release, cfg.fetch_options())?;

    let (latest, published) = tokio::task::spawn_blocking(move || {
        let latest = upstream.latest_version()?;
        let published = store.latest_published()?;
        anyhow::Ok((latest, published))
    })
    .await??;

    println!("{:<10} {}", "UPSTREAM", latest);
    match &published {
        Some(version) => println!("{:<10} {}", "PUBLISHED", version),
        None => println!("{:<10} -", "PUBLISHED"),
    }
    let needs_sync = published
        .as_ref()
        .map(|prev| latest.newer_than(prev))
        .unwrap_or(true);
    if needs_sync {
        println!("Sync needed.");
    } else {
        println!("Up to date.");
    }
    Ok(())
}
