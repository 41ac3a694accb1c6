//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// memory-sync - Mirror local memory files into a remote memory service
#[derive(Parser, Debug)]
#[command(name = "memory-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the nearest directory containing .git)
    #[arg(long, global = true, env = "MEMORY_SYNC_ROOT")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sync a single memory file
    ///
    /// Creates the remote memory on first sync and updates it afterwards.
    ///
    /// Examples:
    ///   memory-sync sync .serena/memories/api-design.md
    ///   memory-sync sync .serena/memories/api-design.md --dry-run
    Sync {
        /// Path to the memory file, relative to the project root
        path: PathBuf,

        /// Skip the deduplication check
        #[arg(long)]
        force: bool,

        /// Show what would happen without calling the service
        #[arg(long)]
        dry_run: bool,
    },

    /// Sync staged changes or the deferred queue in one session
    #[command(name = "sync-batch")]
    #[command(group(ArgGroup::new("source").required(true).args(["staged", "from_queue"])))]
    SyncBatch {
        /// Detect changes from `git diff --cached`
        #[arg(long)]
        staged: bool,

        /// Replay the deferred queue file
        #[arg(long)]
        from_queue: bool,

        /// Skip the deduplication check
        #[arg(long)]
        force: bool,

        /// Show what would happen without calling the service
        #[arg(long)]
        dry_run: bool,
    },

    /// Report which memories are in sync, stale, missing, or orphaned
    Validate {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Pre-commit hook entry point; never fails the commit
    Hook {
        /// Sync right away instead of queuing
        #[arg(long)]
        immediate: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_batch_requires_a_source() {
        assert!(Cli::try_parse_from(["memory-sync", "sync-batch"]).is_err());
        assert!(
            Cli::try_parse_from(["memory-sync", "sync-batch", "--staged", "--from-queue"]).is_err()
        );

        let cli = Cli::try_parse_from(["memory-sync", "sync-batch", "--from-queue", "--dry-run"])
            .unwrap();
        assert_eq!(
            cli.command,
            Commands::SyncBatch {
                staged: false,
                from_queue: true,
                force: false,
                dry_run: true,
            }
        );
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli =
            Cli::try_parse_from(["memory-sync", "validate", "--json", "-v", "--root", "/tmp/x"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.command, Commands::Validate { json: true });
    }
}
