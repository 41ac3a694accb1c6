//! Pre-commit hook command

use std::path::{Path, PathBuf};

use memsync_core::{SyncConfig, SyncEngine, SyncOperation, SyncOptions, SyncQueue, detect_changes};

use super::connect;
use crate::error::{EXIT_SUCCESS, Result};
use crate::project::staged_files;

/// Run the hook command
///
/// Never blocks a commit: every failure is logged and the exit code is
/// always success.
pub async fn run_hook(root: &Path, immediate: bool) -> Result<u8> {
    if let Err(e) = hook(root, immediate).await {
        tracing::warn!(error = %e, "Memory sync hook failed (non-blocking)");
    }
    Ok(EXIT_SUCCESS)
}

async fn hook(root: &Path, immediate: bool) -> Result<()> {
    let config = SyncConfig::load(root)?;
    let changes = detect_changes(&staged_files(root), &config.memory_dir);
    if changes.is_empty() {
        tracing::debug!("No staged memory changes");
        return Ok(());
    }

    let queue = SyncQueue::new(config.queue_path(root));

    if !immediate || !config.server.is_available() {
        if immediate {
            tracing::info!("Memory service not available, queuing changes");
        }
        let merged = merge_changes(queue.read(), changes);
        queue.write(&merged)?;
        tracing::info!(
            count = merged.len(),
            queue = %queue.path().display(),
            "Memory changes queued"
        );
        return Ok(());
    }

    let mut engine = SyncEngine::new(root, config.clone(), SyncOptions::default())?;
    let mut client = match connect(root, &config).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Memory server failed to start, queuing changes");
            queue.write(&merge_changes(queue.read(), changes))?;
            return Ok(());
        }
    };
    let results = engine.sync_batch(&mut client, &changes).await;
    client.close().await;

    let failed: Vec<(PathBuf, SyncOperation)> = changes
        .into_iter()
        .zip(&results)
        .filter(|(_, result)| !result.success)
        .map(|(change, _)| change)
        .collect();
    if failed.is_empty() {
        tracing::info!(count = results.len(), "Memory sync: all synced");
    } else {
        tracing::warn!(
            failed = failed.len(),
            total = results.len(),
            "Memory sync: some changes failed (non-blocking), queued for retry"
        );
        queue.write(&merge_changes(queue.read(), failed))?;
    }
    Ok(())
}

/// Append `incoming` to `existing`; a path already queued takes the newer operation
fn merge_changes(
    existing: Vec<(PathBuf, SyncOperation)>,
    incoming: Vec<(PathBuf, SyncOperation)>,
) -> Vec<(PathBuf, SyncOperation)> {
    let mut merged = existing;
    for (path, operation) in incoming {
        match merged.iter_mut().find(|(queued, _)| *queued == path) {
            Some(entry) => entry.1 = operation,
            None => merged.push((path, operation)),
        }
    }
    merged
}
