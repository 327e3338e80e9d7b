use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides `[upstream] base_url` (useful for CI
/// and for pointing a run at a staging bucket).
pub const UPSTREAM_BASE_ENV: &str = "CCMIRROR_UPSTREAM_BASE";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 2.0,
            max_delay_secs: 30,
        }
    }
}

/// Upstream distribution endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the distribution bucket (no trailing slash). The bucket
    /// serves `/latest`, `/{version}/manifest.json` and the binaries.
    pub base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://storage.googleapis.com/claude-code-dist-86c565f3-f756-42ad-8dfa-d59b1c096819/claude-code-releases".to_string(),
        }
    }
}

/// Release publishing target (a GitHub repository).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Repository owner (user or org). Must be set before `sync` can publish.
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// Prepended to the version to form the git tag ("v" -> "v1.2.3").
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
    /// API endpoint; override to test against a local server.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            tag_prefix: default_tag_prefix(),
            api_base: default_api_base(),
            token_env: default_token_env(),
        }
    }
}

/// Global configuration loaded from `~/.config/ccmirror/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Maximum concurrent platform downloads (the platform set is 7).
    pub max_parallel_downloads: usize,
    /// Connect timeout per request, seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout per request, seconds.
    pub request_timeout_secs: u64,
    /// Where binaries are staged before publishing. Defaults to the XDG
    /// cache dir when unset.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub release: ReleaseConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            max_parallel_downloads: 7,
            connect_timeout_secs: 30,
            request_timeout_secs: 120,
            staging_dir: None,
            upstream: UpstreamConfig::default(),
            release: ReleaseConfig::default(),
            retry: None,
        }
    }
}

impl MirrorConfig {
    /// Upstream base URL, honouring the environment override.
    pub fn upstream_base(&self) -> String {
        match std::env::var(UPSTREAM_BASE_ENV) {
            Ok(v) if !v.trim().is_empty() => v.trim().trim_end_matches('/').to_string(),
            _ => self.upstream.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Staging directory for downloaded binaries: the configured path, or
    /// `~/.cache/ccmirror/staging`.
    pub fn resolve_staging_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.staging_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("ccmirror")?;
        Ok(xdg_dirs.get_cache_home().join("staging"))
    }

    pub fn fetch_options(&self) -> crate::fetch::FetchOptions {
        crate::fetch::FetchOptions {
            connect_timeout: std::time::Duration::from_secs(self.connect_timeout_secs),
            request_timeout: std::time::Duration::from_secs(self.request_timeout_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ccmirror")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MirrorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MirrorConfig = toml::from_str(&data)?;
    Ok(cfg)
}
