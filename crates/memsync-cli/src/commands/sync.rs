//! Single-file sync command

use std::path::Path;

use memsync_core::{SyncConfig, SyncEngine, SyncOptions};

use super::{connect, ensure_available, print_result};
use crate::error::{CliError, EXIT_SUCCESS, EXIT_SYNC_FAILURE, Result};
use crate::project::relative_to_root;

/// Run the sync command
///
/// Picks UPDATE when the State Store already knows the memory, CREATE
/// otherwise, and syncs it over a fresh server session.
pub async fn run_sync(root: &Path, path: &Path, options: SyncOptions) -> Result<u8> {
    let relative = relative_to_root(root, path);
    if !root.join(&relative).is_file() {
        return Err(CliError::user(format!(
            "File not found: {}",
            relative.display()
        )));
    }

    let config = SyncConfig::load(root)?;
    ensure_available(&config)?;

    let mut engine = SyncEngine::new(root, config.clone(), options)?;
    let operation = engine.operation_for(&relative);
    tracing::debug!(path = %relative.display(), %operation, "Selected operation");

    let mut client = connect(root, &config).await?;
    let result = engine.sync_memory(&mut client, &relative, operation).await;
    client.close().await;

    print_result(&result);
    Ok(if result.success {
        EXIT_SUCCESS
    } else {
        EXIT_SYNC_FAILURE
    })
}
