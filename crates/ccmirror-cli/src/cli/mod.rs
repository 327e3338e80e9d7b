//! CLI for the ccmirror release mirror.

mod commands;

use anyhow::Result;
use ccmirror_core::config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{run_checksum, run_completions, run_latest, run_status, run_sync_command};

/// Exit code for a sync run that found nothing new to publish. Success is
/// 0, failures are 1; clap reserves 2 for usage errors. The scheduler uses
/// this to tell a no-op tick from a real publish.
pub const EXIT_UP_TO_DATE: u8 = 3;

/// Top-level CLI for the ccmirror release mirror.
#[derive(Debug, Parser)]
#[command(name = "ccmirror")]
#[command(about = "ccmirror: mirror upstream Claude Code binaries into GitHub releases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check upstream and publish a release if a new version is available.
    Sync {
        /// Stage downloads here instead of the configured directory.
        #[arg(long, value_name = "DIR")]
        staging_dir: Option<PathBuf>,
    },

    /// Show upstream latest vs. last published version.
    Status,

    /// Print the latest upstream version identifier.
    Latest,

    /// Compute SHA-256 of a local file (e.g. a staged binary).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Sync { staging_dir } => run_sync_command(&cfg, staging_dir).await,
            CliCommand::Status => {
                run_status(&cfg).await?;
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Latest => {
                run_latest(&cfg).await?;
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Checksum { path } => {
                run_checksum(&path)?;
                Ok(ExitCode::SUCCESS)
            }
            CliCommand::Completions { shell } => {
                run_completions(shell);
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
