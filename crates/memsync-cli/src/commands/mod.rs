//! Command implementations for memory-sync

mod batch;
mod hook;
mod sync;
mod validate;

pub use batch::{BatchSource, run_sync_batch};
pub use hook::run_hook;
pub use sync::run_sync;
pub use validate::run_validate;

use std::path::Path;

use colored::Colorize;
use memsync_core::{SyncConfig, SyncResult};
use memsync_mcp::McpClient;

use crate::error::{CliError, Result};

/// Fail with an "unavailable" error unless the service's store exists
fn ensure_available(config: &SyncConfig) -> Result<()> {
    if config.server.is_available() {
        return Ok(());
    }
    let marker = config
        .server
        .marker_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<no home directory>".to_string());
    Err(CliError::Unavailable {
        message: format!("Memory service is not available (store not found at {marker})"),
    })
}

/// Spawn the server and complete the handshake
async fn connect(root: &Path, config: &SyncConfig) -> Result<McpClient> {
    let client_config = config.server.client_config(root)?;
    tracing::debug!(command = %client_config.command_line(), "Starting memory server");
    let client = McpClient::spawn(client_config).await?;
    if let Some(info) = client.server_info() {
        tracing::debug!(name = %info.name, version = %info.version, "Connected");
    }
    Ok(client)
}

/// Print a one-line outcome for a sync result
fn print_result(result: &SyncResult) {
    if result.success {
        println!(
            "{} {} {} {}",
            "[OK]".green().bold(),
            result.operation,
            result.path.display(),
            result
                .remote_id
                .as_deref()
                .map(|id| format!("-> {id}"))
                .unwrap_or_default()
                .dimmed()
        );
    } else {
        println!(
            "{} {} {} {}",
            "[FAIL]".red().bold(),
            result.operation,
            result.path.display(),
            result.error.as_deref().unwrap_or_default()
        );
    }
}
