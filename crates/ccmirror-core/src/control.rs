//! Run control: cooperative abort for an in-flight sync.
//!
//! The CLI installs a Ctrl-C handler that sets the token; the sync procedure
//! checks it between stages and immediately before publish, so an
//! interrupted run can never commit a release.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current run stop before its next side effect.
    pub fn request_abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
