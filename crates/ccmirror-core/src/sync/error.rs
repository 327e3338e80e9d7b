//! Failure taxonomy for a sync run. Every kind is terminal: the scheduler
//! retries by invoking the next run, which re-evaluates from scratch.

use crate::platform::Platform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The upstream version endpoint or manifest was unreachable or
    /// returned a malformed body.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] anyhow::Error),

    /// The release store could not answer "what is the latest published
    /// version".
    #[error("release store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    /// The upstream manifest omits one or more of the fixed platforms.
    #[error("incomplete platform set, missing: {}", format_platforms(.missing))]
    IncompletePlatformSet { missing: Vec<Platform> },

    /// Downloading one platform binary failed after exhausting retries.
    #[error("download failed for {platform}: {reason}")]
    DownloadFailed { platform: Platform, reason: String },

    /// A downloaded binary did not match its expected checksum.
    #[error("checksum mismatch for {platform}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        platform: Platform,
        expected: String,
        actual: String,
    },

    /// The release store rejected or failed the publish call.
    #[error("publish failed: {0}")]
    PublishFailed(#[source] anyhow::Error),

    /// The run was cancelled before it could publish.
    #[error("sync aborted before publish")]
    Aborted,
}

fn format_platforms(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(|p| p.key())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_platform() {
        let err = SyncError::ChecksumMismatch {
            platform: Platform::LinuxArm64,
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(err.to_string().contains("linux-arm64"));

        let err = SyncError::IncompletePlatformSet {
            missing: vec![Platform::DarwinX64, Platform::Win32X64],
        };
        assert_eq!(
            err.to_string(),
            "incomplete platform set, missing: darwin-x64, win32-x64"
        );
    }
}
