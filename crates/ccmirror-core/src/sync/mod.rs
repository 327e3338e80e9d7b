//! The sync procedure: resolve the latest upstream version, stage and
//! verify all platform binaries, and publish them as one release.
//!
//! A run either skips idempotently, publishes a complete release, or fails
//! without external side effects. Downloads run concurrently as blocking
//! tasks; the published ordering is fixed by platform key, never by
//! completion order.

mod error;

pub use error::SyncError;

use crate::checksum;
use crate::config::MirrorConfig;
use crate::control::AbortToken;
use crate::fetch::{self, FetchOptions};
use crate::manifest;
use crate::platform::Platform;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::store::{NewRelease, ReleaseAsset, ReleaseStore};
use crate::upstream::{self, PlatformArtifact, UpstreamClient};
use crate::version::VersionId;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of one sync run, for the caller's exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new release with the full platform set was published.
    Published {
        version: VersionId,
        asset_count: usize,
    },
    /// Upstream has nothing newer; no downloads, no writes.
    UpToDate {
        upstream: VersionId,
        published: Option<VersionId>,
    },
}

/// One staged, checksum-verified platform binary.
#[derive(Debug, Clone)]
pub struct VerifiedArtifact {
    pub platform: Platform,
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

/// Run one complete sync, from version check through publish. Terminal on
/// the first failure; never publishes partially.
pub async fn run_sync(
    cfg: &MirrorConfig,
    upstream_client: Arc<UpstreamClient>,
    store: Arc<dyn ReleaseStore>,
    staging_dir: &Path,
    abort: AbortToken,
) -> Result<SyncOutcome, SyncError> {
    let policy = RetryPolicy::from_config(cfg.retry.as_ref());
    let options = upstream_client.options();

    // Step 1: latest upstream version.
    let latest = {
        let client = Arc::clone(&upstream_client);
        tokio::task::spawn_blocking(move || {
            run_with_retry(&policy, || client.latest_version())
        })
        .await
        .map_err(|e| SyncError::UpstreamUnavailable(anyhow::anyhow!("version fetch: {e}")))?
        .map_err(|e| SyncError::UpstreamUnavailable(anyhow::Error::new(e)))?
    };
    tracing::info!(version = %latest, "upstream latest version");

    // Step 2: last published version. Absence means first run, not an error.
    let published = {
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || store.latest_published())
            .await
            .map_err(|e| SyncError::StoreUnavailable(anyhow::anyhow!("store query: {e}")))?
            .map_err(SyncError::StoreUnavailable)?
    };

    // Step 3: idempotent skip when there is nothing newer.
    let is_new = match &published {
        Some(prev) => latest.newer_than(prev),
        None => true,
    };
    if !is_new {
        match &published {
            Some(prev) if *prev != latest => {
                tracing::warn!(upstream = %latest, published = %prev,
                    "upstream reports an older version, skipping");
            }
            _ => tracing::info!(version = %latest, "already published, nothing to do"),
        }
        return Ok(SyncOutcome::UpToDate {
            upstream: latest,
            published,
        });
    }

    // Step 4: resolve the complete artifact set for the new version.
    let version_manifest = {
        let client = Arc::clone(&upstream_client);
        let version = latest.clone();
        tokio::task::spawn_blocking(move || {
            run_with_retry(&policy, || client.fetch_manifest(&version))
        })
        .await
        .map_err(|e| SyncError::UpstreamUnavailable(anyhow::anyhow!("manifest fetch: {e}")))?
        .map_err(|e| SyncError::UpstreamUnavailable(anyhow::Error::new(e)))?
    };
    let artifacts = upstream::resolve_artifacts(&upstream_client, &latest, &version_manifest)
        .map_err(|missing| SyncError::IncompletePlatformSet { missing })?;

    if abort.is_aborted() {
        return Err(SyncError::Aborted);
    }

    // Steps 5–6: download and verify every platform, bounded concurrency.
    let version_dir = staging_dir.join(latest.as_str());
    let verified = download_all(
        artifacts,
        options,
        &version_dir,
        policy,
        cfg.max_parallel_downloads,
        &abort,
    )
    .await?;

    // Step 7: fixed ordering, manifest, all-or-nothing publish.
    let digests: Vec<(Platform, String)> = verified
        .iter()
        .map(|v| (v.platform, v.sha256.clone()))
        .collect();
    let release = NewRelease {
        version: latest.clone(),
        build_date: version_manifest.build_date.clone(),
        assets: verified
            .iter()
            .map(|v| ReleaseAsset {
                name: v.platform.asset_name(),
                path: v.path.clone(),
                sha256: v.sha256.clone(),
            })
            .collect(),
        checksum_manifest: manifest::render(&digests),
    };

    if abort.is_aborted() {
        return Err(SyncError::Aborted);
    }

    let asset_count = release.assets.len();
    {
        let store = Arc::clone(&store);
        let release = release.clone();
        tokio::task::spawn_blocking(move || store.publish(&release))
            .await
            .map_err(|e| SyncError::PublishFailed(anyhow::anyhow!("publish task: {e}")))?
            .map_err(SyncError::PublishFailed)?;
    }
    tracing::info!(version = %latest, assets = asset_count, "published release");

    Ok(SyncOutcome::Published {
        version: latest,
        asset_count,
    })
}

/// Download and verify all artifacts. Every task runs to completion before
/// results are aggregated, so a failure report is deterministic: the first
/// failing platform in key order wins.
async fn download_all(
    artifacts: Vec<PlatformArtifact>,
    options: FetchOptions,
    version_dir: &Path,
    policy: RetryPolicy,
    max_parallel: usize,
    abort: &AbortToken,
) -> Result<Vec<VerifiedArtifact>, SyncError> {
    let semaphore = Arc::new(tokio::sync::Semaphore::new(max_parallel.max(1)));
    let mut handles = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let platform = artifact.platform;
        let semaphore = Arc::clone(&semaphore);
        let dir = version_dir.to_path_buf();
        let abort = abort.clone();
        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return Err(SyncError::DownloadFailed {
                        platform,
                        reason: "download slot closed".to_string(),
                    })
                }
            };
            if abort.is_aborted() {
                return Err(SyncError::Aborted);
            }
            tokio::task::spawn_blocking(move || stage_one(&artifact, &dir, &policy, &options))
                .await
                .map_err(|e| SyncError::DownloadFailed {
                    platform,
                    reason: format!("download task: {e}"),
                })?
        });
        handles.push((platform, handle));
    }

    let mut verified = Vec::with_capacity(handles.len());
    let mut first_error = None;
    for (platform, handle) in handles {
        match handle.await {
            Ok(Ok(artifact)) => verified.push(artifact),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(SyncError::DownloadFailed {
                    platform,
                    reason: format!("download task panicked: {e}"),
                });
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    verified.sort_by_key(|v| v.platform);
    Ok(verified)
}

/// Download one binary to the staging dir and verify its checksum.
/// Blocking; runs on a `spawn_blocking` thread.
fn stage_one(
    artifact: &PlatformArtifact,
    version_dir: &Path,
    policy: &RetryPolicy,
    options: &FetchOptions,
) -> Result<VerifiedArtifact, SyncError> {
    let platform = artifact.platform;
    std::fs::create_dir_all(version_dir).map_err(|e| SyncError::DownloadFailed {
        platform,
        reason: format!("create staging dir: {e}"),
    })?;
    let dest = version_dir.join(platform.asset_name());

    tracing::info!(platform = %platform, url = %artifact.download_url, "downloading");
    let size = run_with_retry(policy, || {
        fetch::get_to_file(&artifact.download_url, &dest, options)
    })
    .map_err(|e| SyncError::DownloadFailed {
        platform,
        reason: e.to_string(),
    })?;

    if let Some(expected) = artifact.size {
        if expected != size {
            tracing::debug!(platform = %platform, expected, actual = size,
                "size differs from manifest, relying on checksum");
        }
    }

    let actual = checksum::sha256_path(&dest).map_err(|e| SyncError::DownloadFailed {
        platform,
        reason: format!("checksum: {e}"),
    })?;
    if !checksum::digests_match(&actual, &artifact.expected_sha256) {
        // A corrupt staged file must not survive to a later run.
        let _ = std::fs::remove_file(&dest);
        return Err(SyncError::ChecksumMismatch {
            platform,
            expected: artifact.expected_sha256.to_ascii_lowercase(),
            actual,
        });
    }

    tracing::debug!(platform = %platform, sha256 = %actual, bytes = size, "verified");
    Ok(VerifiedArtifact {
        platform,
        path: dest,
        sha256: actual,
        size,
    })
}
