use ccmirror_core::logging;
use std::process::ExitCode;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging as early as possible.
    logging::init();

    // Parse CLI and dispatch; the exit code distinguishes publish / no-op / failure.
    match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ccmirror error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
