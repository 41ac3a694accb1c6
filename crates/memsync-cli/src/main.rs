//! memory-sync CLI
//!
//! Mirrors local memory files into a remote memory service over MCP stdio.

mod cli;
mod commands;
mod error;
mod logging;
mod project;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use memsync_core::SyncOptions;

use cli::{Cli, Commands};
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialize logging: {}", "warning".yellow(), e);
    }

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let root = match cli.root {
        Some(root) => root,
        None => project::find_project_root(&std::env::current_dir()?),
    };
    tracing::debug!(root = %root.display(), "Resolved project root");

    match cli.command {
        Commands::Sync {
            path,
            force,
            dry_run,
        } => commands::run_sync(&root, &path, SyncOptions { force, dry_run }).await,
        Commands::SyncBatch {
            staged,
            from_queue: _,
            force,
            dry_run,
        } => {
            let source = if staged {
                commands::BatchSource::Staged
            } else {
                commands::BatchSource::Queue
            };
            commands::run_sync_batch(&root, source, SyncOptions { force, dry_run }).await
        }
        Commands::Validate { json } => commands::run_validate(&root, json),
        Commands::Hook { immediate } => commands::run_hook(&root, immediate).await,
    }
}
