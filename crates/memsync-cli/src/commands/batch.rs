//! Batch sync command

use std::path::{Path, PathBuf};

use colored::Colorize;
use memsync_core::{SyncConfig, SyncEngine, SyncOperation, SyncOptions, SyncQueue, detect_changes};

use super::{connect, ensure_available, print_result};
use crate::error::{EXIT_SUCCESS, EXIT_SYNC_FAILURE, Result};
use crate::project::staged_files;

/// Where a batch takes its changes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    /// `git diff --cached --name-status`
    Staged,
    /// The deferred queue file
    Queue,
}

/// Run the sync-batch command
///
/// All changes share one server session. After a queue batch the queue
/// keeps only the items that failed.
pub async fn run_sync_batch(root: &Path, source: BatchSource, options: SyncOptions) -> Result<u8> {
    let config = SyncConfig::load(root)?;
    ensure_available(&config)?;

    let queue = SyncQueue::new(config.queue_path(root));
    let changes = match source {
        BatchSource::Staged => detect_changes(&staged_files(root), &config.memory_dir),
        BatchSource::Queue => queue.read(),
    };

    if changes.is_empty() {
        println!("No memory changes to sync");
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "{} Syncing {} change(s)...",
        "=>".blue().bold(),
        changes.len()
    );

    let mut engine = SyncEngine::new(root, config.clone(), options)?;
    let mut client = connect(root, &config).await?;
    let results = engine.sync_batch(&mut client, &changes).await;
    client.close().await;

    for result in &results {
        print_result(result);
    }

    let failed: Vec<(PathBuf, SyncOperation)> = changes
        .iter()
        .zip(&results)
        .filter(|(_, result)| !result.success)
        .map(|(change, _)| change.clone())
        .collect();

    if source == BatchSource::Queue && !options.dry_run {
        if failed.is_empty() {
            queue.clear()?;
        } else {
            queue.write(&failed)?;
            tracing::info!(count = failed.len(), "Failed changes kept in queue");
        }
    }

    if failed.is_empty() {
        println!("{} {} synced", "OK".green().bold(), results.len());
        Ok(EXIT_SUCCESS)
    } else {
        println!(
            "{} {}/{} failed",
            "FAIL".red().bold(),
            failed.len(),
            results.len()
        );
        Ok(EXIT_SYNC_FAILURE)
    }
}
