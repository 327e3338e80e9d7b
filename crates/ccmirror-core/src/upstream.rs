//! Client for the upstream distribution bucket.
//!
//! The bucket exposes three things: `{base}/latest` (plain-text version),
//! `{base}/{version}/manifest.json` (per-platform checksum and size), and
//! the binaries themselves at `{base}/{version}/{key}/claude[.exe]`.

use crate::config::MirrorConfig;
use crate::fetch::{self, FetchOptions, RequestError};
use crate::platform::Platform;
use crate::version::VersionId;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;

/// Entry for one platform in `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// Expected SHA-256 of the binary, hex (casing varies upstream).
    pub checksum: String,
    /// Size in bytes, when the manifest carries it.
    #[serde(default)]
    pub size: Option<u64>,
}

/// Parsed `manifest.json` for one version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub version: String,
    #[serde(default)]
    pub build_date: Option<String>,
    pub platforms: BTreeMap<String, ManifestEntry>,
}

/// Everything needed to download and verify one platform binary.
#[derive(Debug, Clone)]
pub struct PlatformArtifact {
    pub platform: Platform,
    pub download_url: String,
    pub expected_sha256: String,
    pub size: Option<u64>,
}

/// Read-only client for the upstream bucket. All methods block; call from
/// `spawn_blocking` in async code.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base_url: String,
    options: FetchOptions,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, options: FetchOptions) -> Self {
        let base: String = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_string(),
            options,
        }
    }

    /// Build a client from config, validating the (possibly env-overridden)
    /// base URL up front so a typo fails before any sync work starts.
    pub fn from_config(cfg: &MirrorConfig) -> Result<Self> {
        let base = cfg.upstream_base();
        url::Url::parse(&base).with_context(|| format!("invalid upstream base URL: {base}"))?;
        Ok(Self::new(base, cfg.fetch_options()))
    }

    pub fn options(&self) -> FetchOptions {
        self.options
    }

    /// Fetch the latest version identifier from `{base}/latest`.
    pub fn latest_version(&self) -> Result<VersionId, RequestError> {
        let url = format!("{}/latest", self.base_url);
        let body = fetch::get_text(&url, &self.options)?;
        let version = body.trim();
        if version.is_empty() || version.lines().count() != 1 {
            return Err(RequestError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed version body from {url}"),
            )));
        }
        Ok(VersionId::new(version))
    }

    /// Fetch and parse `{base}/{version}/manifest.json`.
    pub fn fetch_manifest(&self, version: &VersionId) -> Result<VersionManifest, RequestError> {
        let url = format!("{}/{}/manifest.json", self.base_url, version);
        let body = fetch::get_bytes(&url, &self.options)?;
        serde_json::from_slice(&body).map_err(|e| {
            RequestError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed manifest from {url}: {e}"),
            ))
        })
    }

    /// URL of one platform binary for `version`.
    pub fn binary_url(&self, version: &VersionId, platform: Platform) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            version,
            platform.key(),
            platform.remote_object()
        )
    }
}

/// Resolve an artifact for every fixed platform from `manifest`.
///
/// Returns the sorted list of missing platforms instead when any key is
/// absent — an incomplete set must fail the run, never shrink the release.
pub fn resolve_artifacts(
    client: &UpstreamClient,
    version: &VersionId,
    manifest: &VersionManifest,
) -> Result<Vec<PlatformArtifact>, Vec<Platform>> {
    let mut artifacts = Vec::with_capacity(Platform::ALL.len());
    let mut missing = Vec::new();
    for platform in Platform::ALL {
        match manifest.platforms.get(platform.key()) {
            Some(entry) => artifacts.push(PlatformArtifact {
                platform,
                download_url: client.binary_url(version, platform),
                expected_sha256: entry.checksum.clone(),
                size: entry.size,
            }),
            None => missing.push(platform),
        }
    }
    if missing.is_empty() {
        Ok(artifacts)
    } else {
        Err(missing)
    }
}
