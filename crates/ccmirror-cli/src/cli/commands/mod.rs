//! Subcommand implementations.

mod checksum;
mod completions;
mod latest;
mod status;
mod sync;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use latest::run_latest;
pub use status::run_status;
pub use sync::run_sync_command;
