//! In-memory `ReleaseStore` for driving the sync procedure in tests.

use anyhow::{bail, Result};
use ccmirror_core::store::{NewRelease, ReleaseStore};
use ccmirror_core::version::VersionId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryReleaseStore {
    latest: Mutex<Option<VersionId>>,
    published: Mutex<Vec<NewRelease>>,
    fail_publish: AtomicBool,
    publish_calls: AtomicUsize,
}

impl MemoryReleaseStore {
    /// Store with no releases (first run).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store whose latest published release is `version`.
    pub fn with_latest(version: &str) -> Self {
        let store = Self::default();
        *store.latest.lock().unwrap() = Some(VersionId::from(version));
        store
    }

    /// Make every subsequent publish call fail.
    pub fn fail_publishes(&self) {
        self.fail_publish.store(true, Ordering::Relaxed);
    }

    pub fn latest(&self) -> Option<VersionId> {
        self.latest.lock().unwrap().clone()
    }

    /// Successfully published releases, oldest first.
    pub fn published(&self) -> Vec<NewRelease> {
        self.published.lock().unwrap().clone()
    }

    /// How many times publish was attempted (including failures).
    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::Relaxed)
    }
}

impl ReleaseStore for MemoryReleaseStore {
    fn latest_published(&self) -> Result<Option<VersionId>> {
        Ok(self.latest.lock().unwrap().clone())
    }

    fn publish(&self, release: &NewRelease) -> Result<()> {
        self.publish_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_publish.load(Ordering::Relaxed) {
            bail!("injected publish failure");
        }
        *self.latest.lock().unwrap() = Some(release.version.clone());
        self.published.lock().unwrap().push(release.clone());
        Ok(())
    }
}
