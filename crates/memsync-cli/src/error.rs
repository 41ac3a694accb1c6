//! Error types and exit codes for memsync-cli

/// Everything synced (or nothing to do)
pub const EXIT_SUCCESS: u8 = 0;
/// At least one item failed to sync
pub const EXIT_SYNC_FAILURE: u8 = 1;
/// Bad arguments or the service is not available
pub const EXIT_INVALID_ARGS: u8 = 2;
/// I/O or transport failure
pub const EXIT_IO_ERROR: u8 = 3;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from memsync-core
    #[error(transparent)]
    Core(#[from] memsync_core::Error),

    /// Error from the MCP transport
    #[error(transparent)]
    Mcp(#[from] memsync_mcp::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Report serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The remote service is not installed
    #[error("{message}")]
    Unavailable { message: String },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::User { .. } | CliError::Unavailable { .. } => EXIT_INVALID_ARGS,
            CliError::Core(memsync_core::Error::Config { .. }) => EXIT_INVALID_ARGS,
            CliError::Core(_) | CliError::Mcp(_) | CliError::Io(_) | CliError::Json(_) => {
                EXIT_IO_ERROR
            }
        }
    }
}
