//! Upstream version identifiers and the "is this newer" decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque version identifier as reported by the upstream `latest` endpoint
/// or recovered from a release tag.
///
/// Two identifiers are the same version iff their strings are equal. For
/// ordering, both sides are parsed as semantic versions when possible so a
/// stale upstream read can never trigger a downgrade publish; identifiers
/// that do not parse fall back to "changed means newer", since the upstream
/// channel only moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(s: impl Into<String>) -> Self {
        VersionId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Semantic-version reading of this identifier, tolerating a leading `v`.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(self.0.trim_start_matches('v')).ok()
    }

    /// True when this identifier should trigger a publish over `previous`.
    pub fn newer_than(&self, previous: &VersionId) -> bool {
        if self.0 == previous.0 {
            return false;
        }
        match (self.semver(), previous.semver()) {
            (Some(latest), Some(published)) => latest > published,
            _ => true,
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        VersionId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_versions_are_not_newer() {
        let v = VersionId::from("1.2.0");
        assert!(!v.newer_than(&VersionId::from("1.2.0")));
    }

    #[test]
    fn semver_ordering_decides_when_both_parse() {
        assert!(VersionId::from("1.3.0").newer_than(&VersionId::from("1.2.0")));
        assert!(VersionId::from("1.10.0").newer_than(&VersionId::from("1.9.3")));
        // Downgrade: stale upstream read must not publish.
        assert!(!VersionId::from("1.2.0").newer_than(&VersionId::from("1.3.0")));
    }

    #[test]
    fn tag_style_prefix_is_tolerated() {
        assert!(VersionId::from("1.3.0").newer_than(&VersionId::from("v1.2.0")));
        assert!(!VersionId::from("v1.2.0").newer_than(&VersionId::from("1.3.0")));
    }

    #[test]
    fn non_semver_falls_back_to_inequality() {
        assert!(VersionId::from("2024-06-01").newer_than(&VersionId::from("2024-05-01")));
        assert!(!VersionId::from("nightly").newer_than(&VersionId::from("nightly")));
    }
}
