//! Release store: where a verified set of binaries gets published.
//!
//! The trait seam lets integration tests run the sync procedure against an
//! in-memory store while production uses GitHub releases.

mod github;

pub use github::GithubReleaseStore;

use crate::version::VersionId;
use anyhow::Result;
use std::path::PathBuf;

/// One binary attached to a release, staged on local disk.
#[derive(Debug, Clone)]
pub struct ReleaseAsset {
    /// Published filename, e.g. `claude-linux-x64`.
    pub name: String,
    /// Staged file to upload.
    pub path: PathBuf,
    /// Verified SHA-256 (lowercase hex) of the staged file.
    pub sha256: String,
}

/// A fully verified release, ready to publish. `assets` is ordered by
/// platform key and always covers the complete platform set.
#[derive(Debug, Clone)]
pub struct NewRelease {
    pub version: VersionId,
    /// Upstream build date, when the manifest carried one.
    pub build_date: Option<String>,
    pub assets: Vec<ReleaseAsset>,
    /// Rendered checksum manifest, uploaded alongside the binaries.
    pub checksum_manifest: String,
}

/// External release store. Implementations block; drive from
/// `spawn_blocking` in async code.
pub trait ReleaseStore: Send + Sync {
    /// Version of the most recently published release, `None` when the
    /// store holds no release yet (first run).
    fn latest_published(&self) -> Result<Option<VersionId>>;

    /// Publish `release` with every asset and the checksum manifest
    /// attached. All-or-nothing: when this returns an error, no release —
    /// partial or otherwise — may be visible in the store.
    fn publish(&self, release: &NewRelease) -> Result<()>;
}
