//! The fixed set of platforms the upstream distribution publishes.
//!
//! A release is only ever published with a binary for every platform listed
//! here; a manifest that omits one is rejected upstream of any download.

use std::fmt;
use std::str::FromStr;

/// One OS/architecture/libc combination shipped upstream.
///
/// Variant order matches the lexicographic order of the keys; `ALL` relies
/// on this so checksum manifests and release assets come out in the same
/// order on every run, regardless of download completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    DarwinArm64,
    DarwinX64,
    LinuxArm64,
    LinuxArm64Musl,
    LinuxX64,
    LinuxX64Musl,
    Win32X64,
}

impl Platform {
    /// Every platform, in manifest order (sorted by key).
    pub const ALL: [Platform; 7] = [
        Platform::DarwinArm64,
        Platform::DarwinX64,
        Platform::LinuxArm64,
        Platform::LinuxArm64Musl,
        Platform::LinuxX64,
        Platform::LinuxX64Musl,
        Platform::Win32X64,
    ];

    /// The upstream platform key, e.g. `linux-x64-musl`.
    pub fn key(self) -> &'static str {
        match self {
            Platform::DarwinArm64 => "darwin-arm64",
            Platform::DarwinX64 => "darwin-x64",
            Platform::LinuxArm64 => "linux-arm64",
            Platform::LinuxArm64Musl => "linux-arm64-musl",
            Platform::LinuxX64 => "linux-x64",
            Platform::LinuxX64Musl => "linux-x64-musl",
            Platform::Win32X64 => "win32-x64",
        }
    }

    /// Filename under which the binary is staged and attached to a release,
    /// e.g. `claude-linux-x64`. Windows keeps its `.exe` suffix so the asset
    /// stays runnable exactly as downloaded.
    pub fn asset_name(self) -> String {
        match self {
            Platform::Win32X64 => format!("claude-{}.exe", self.key()),
            _ => format!("claude-{}", self.key()),
        }
    }

    /// Object name inside the upstream bucket: binaries live at
    /// `{base}/{version}/{key}/{object}`.
    pub fn remote_object(self) -> &'static str {
        match self {
            Platform::Win32X64 => "claude.exe",
            _ => "claude",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a string is not one of the seven platform keys.
#[derive(Debug)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform key: {}", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}
