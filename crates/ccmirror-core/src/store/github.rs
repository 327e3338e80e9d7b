//! GitHub Releases backend.
//!
//! The raw API is not atomic, so publishing goes draft → upload every asset
//! → flip the draft live. A failure at any point deletes the draft; only the
//! final publish step makes anything visible.

use super::{NewRelease, ReleaseStore};
use crate::config::ReleaseConfig;
use crate::fetch::{self, FetchOptions, RequestError};
use crate::version::VersionId;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    id: u64,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    tag_name: String,
}

#[derive(Debug)]
pub struct GithubReleaseStore {
    api_base: String,
    owner: String,
    repo: String,
    tag_prefix: String,
    token: String,
    options: FetchOptions,
}

impl GithubReleaseStore {
    /// Build a store from config. Fails early on missing repository
    /// coordinates or a missing token, before any sync work starts.
    pub fn from_config(cfg: &ReleaseConfig, options: FetchOptions) -> Result<Self> {
        if cfg.owner.trim().is_empty() || cfg.repo.trim().is_empty() {
            bail!("release.owner and release.repo must be set in the config file");
        }
        let token = std::env::var(&cfg.token_env)
            .with_context(|| format!("release token not found in ${}", cfg.token_env))?;
        if token.trim().is_empty() {
            bail!("release token in ${} is empty", cfg.token_env);
        }
        Ok(Self {
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            owner: cfg.owner.clone(),
            repo: cfg.repo.clone(),
            tag_prefix: cfg.tag_prefix.clone(),
            token,
            options,
        })
    }

    fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            self.api_base, self.owner, self.repo
        )
    }

    fn tag_for(&self, version: &VersionId) -> String {
        format!("{}{}", self.tag_prefix, version)
    }

    fn version_from_tag(&self, tag: &str) -> VersionId {
        VersionId::new(tag.strip_prefix(self.tag_prefix.as_str()).unwrap_or(tag))
    }

    fn auth_headers(&self, content_type: Option<&str>) -> Result<curl::easy::List, RequestError> {
        let mut list = curl::easy::List::new();
        list.append(&format!("Authorization: Bearer {}", self.token))
            .map_err(RequestError::Curl)?;
        list.append("Accept: application/vnd.github+json")
            .map_err(RequestError::Curl)?;
        list.append("X-GitHub-Api-Version: 2022-11-28")
            .map_err(RequestError::Curl)?;
        if let Some(ct) = content_type {
            list.append(&format!("Content-Type: {ct}"))
                .map_err(RequestError::Curl)?;
        }
        Ok(list)
    }

    /// Perform one API request and return `(status, body)`. Non-2xx is not
    /// an error here; callers branch on the status (404 means "no release").
    fn api_request(
        &self,
        method: &str,
        url: &str,
        json_body: Option<&serde_json::Value>,
    ) -> Result<(u32, Vec<u8>), RequestError> {
        let mut easy = fetch::new_easy(url, &self.options)?;
        easy.custom_request(method).map_err(RequestError::Curl)?;
        let payload = match json_body {
            Some(value) => {
                let bytes = value.to_string().into_bytes();
                easy.post_fields_copy(&bytes).map_err(RequestError::Curl)?;
                true
            }
            None => false,
        };
        let headers = self.auth_headers(payload.then_some("application/json"))?;
        easy.http_headers(headers).map_err(RequestError::Curl)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(RequestError::Curl)?;
            transfer.perform().map_err(RequestError::Curl)?;
        }
        let status = easy.response_code().map_err(RequestError::Curl)?;
        Ok((status, body))
    }

    /// Upload one asset body to the release's upload endpoint.
    fn upload(&self, upload_base: &str, name: &str, data: AssetBody) -> Result<()> {
        let url = format!("{upload_base}?name={name}");
        let mut easy = fetch::new_easy(&url, &self.options)?;
        easy.post(true).map_err(RequestError::Curl)?;
        let headers = self.auth_headers(Some("application/octet-stream"))?;
        easy.http_headers(headers).map_err(RequestError::Curl)?;

        let status = match data {
            AssetBody::Bytes(bytes) => {
                easy.post_fields_copy(&bytes).map_err(RequestError::Curl)?;
                {
                    let mut transfer = easy.transfer();
                    transfer
                        .write_function(|d| Ok(d.len()))
                        .map_err(RequestError::Curl)?;
                    transfer.perform().map_err(RequestError::Curl)?;
                }
                easy.response_code().map_err(RequestError::Curl)?
            }
            AssetBody::File(mut file, len) => {
                easy.post_field_size(len).map_err(RequestError::Curl)?;
                {
                    let mut transfer = easy.transfer();
                    transfer
                        .read_function(move |buf| {
                            file.read(buf).map_err(|_| curl::easy::ReadError::Abort)
                        })
                        .map_err(RequestError::Curl)?;
                    transfer
                        .write_function(|d| Ok(d.len()))
                        .map_err(RequestError::Curl)?;
                    transfer.perform().map_err(RequestError::Curl)?;
                }
                easy.response_code().map_err(RequestError::Curl)?
            }
        };
        if !(200..300).contains(&status) {
            bail!("asset upload for {name} returned HTTP {status}");
        }
        Ok(())
    }

    /// Best-effort removal of a draft release after a failed publish.
    fn delete_release(&self, id: u64) {
        let url = format!("{}/{}", self.releases_url(), id);
        match self.api_request("DELETE", &url, None) {
            Ok((status, _)) if (200..300).contains(&status) || status == 404 => {
                tracing::debug!(release_id = id, "deleted draft release after failure");
            }
            Ok((status, _)) => {
                tracing::warn!(release_id = id, status, "could not delete draft release");
            }
            Err(e) => {
                tracing::warn!(release_id = id, error = %e, "could not delete draft release");
            }
        }
    }

    fn create_draft(&self, release: &NewRelease) -> Result<ReleaseResponse> {
        let tag = self.tag_for(&release.version);
        let mut notes = format!("Mirror of Claude Code {}.", release.version);
        if let Some(date) = &release.build_date {
            notes.push_str(&format!("\n\nUpstream build date: {date}"));
        }
        let body = serde_json::json!({
            "tag_name": tag,
            "name": tag,
            "body": notes,
            "draft": true,
            "prerelease": false,
        });
        let (status, response) = self
            .api_request("POST", &self.releases_url(), Some(&body))
            .with_context(|| format!("create draft release {tag}"))?;
        if !(200..300).contains(&status) {
            bail!(
                "create draft release {tag} returned HTTP {status}: {}",
                String::from_utf8_lossy(&response)
            );
        }
        serde_json::from_slice(&response).context("malformed create-release response")
    }
}

enum AssetBody {
    Bytes(Vec<u8>),
    File(File, u64),
}

/// The upload endpoint comes back as a URI template
/// (`.../assets{?name,label}`); strip the template part.
fn strip_uri_template(upload_url: &str) -> &str {
    match upload_url.find('{') {
        Some(idx) => &upload_url[..idx],
        None => upload_url,
    }
}

impl ReleaseStore for GithubReleaseStore {
    fn latest_published(&self) -> Result<Option<VersionId>> {
        let url = format!("{}/latest", self.releases_url());
        let (status, body) = self
            .api_request("GET", &url, None)
            .context("query latest published release")?;
        match status {
            404 => Ok(None),
            s if (200..300).contains(&s) => {
                let latest: LatestResponse =
                    serde_json::from_slice(&body).context("malformed latest-release response")?;
                Ok(Some(self.version_from_tag(&latest.tag_name)))
            }
            s => bail!("latest-release query returned HTTP {s}"),
        }
    }

    fn publish(&self, release: &NewRelease) -> Result<()> {
        let draft = self.create_draft(release)?;
        let upload_base = strip_uri_template(&draft.upload_url).to_string();

        let result = (|| -> Result<()> {
            for asset in &release.assets {
                let file = File::open(&asset.path)
                    .with_context(|| format!("open staged asset {}", asset.path.display()))?;
                let len = file
                    .metadata()
                    .with_context(|| format!("stat staged asset {}", asset.path.display()))?
                    .len();
                tracing::debug!(name = %asset.name, bytes = len, "uploading asset");
                self.upload(&upload_base, &asset.name, AssetBody::File(file, len))?;
            }
            self.upload(
                &upload_base,
                crate::manifest::MANIFEST_ASSET_NAME,
                AssetBody::Bytes(release.checksum_manifest.clone().into_bytes()),
            )?;

            let url = format!("{}/{}", self.releases_url(), draft.id);
            let (status, body) = self
                .api_request("PATCH", &url, Some(&serde_json::json!({ "draft": false })))
                .context("publish draft release")?;
            if !(200..300).contains(&status) {
                bail!(
                    "publishing draft release returned HTTP {status}: {}",
                    String::from_utf8_lossy(&body)
                );
            }
            Ok(())
        })();

        if result.is_err() {
            self.delete_release(draft.id);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GithubReleaseStore {
        GithubReleaseStore {
            api_base: "https://api.github.com".to_string(),
            owner: "someone".to_string(),
            repo: "claude-code-releases".to_string(),
            tag_prefix: "v".to_string(),
            token: "t".to_string(),
            options: FetchOptions::default(),
        }
    }

    #[test]
    fn tag_round_trip() {
        let s = store();
        let tag = s.tag_for(&VersionId::from("1.3.0"));
        assert_eq!(tag, "v1.3.0");
        assert_eq!(s.version_from_tag(&tag), VersionId::from("1.3.0"));
        // Tags that never had the prefix still resolve.
        assert_eq!(s.version_from_tag("1.2.0"), VersionId::from("1.2.0"));
    }

    #[test]
    fn uri_template_is_stripped() {
        assert_eq!(
            strip_uri_template(
                "https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}"
            ),
            "https://uploads.github.com/repos/o/r/releases/1/assets"
        );
        assert_eq!(strip_uri_template("https://x/assets"), "https://x/assets");
    }

    #[test]
    fn from_config_requires_repository_coordinates() {
        let cfg = ReleaseConfig::default();
        let err = GithubReleaseStore::from_config(&cfg, FetchOptions::default()).unwrap_err();
        assert!(err.to_string().contains("release.owner"));
    }

    #[test]
    fn releases_url_shape() {
        assert_eq!(
            store().releases_url(),
            "https://api.github.com/repos/someone/claude-code-releases/releases"
        );
    }
}
