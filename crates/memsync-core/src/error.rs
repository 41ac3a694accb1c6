//! Error types for memsync-core

use std::path::PathBuf;

/// Result type for memsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in memsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local memory file could not be parsed
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// No remote id could be recovered from a create response
    #[error("Could not extract memory ID from response: {message}")]
    Extraction { message: String },

    /// State file exists but is not a valid state map
    #[error("Invalid state file {path}: {message}")]
    State { path: PathBuf, message: String },

    /// Configuration file is malformed or incomplete
    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Transport or tool error from memsync-mcp
    #[error(transparent)]
    Mcp(#[from] memsync_mcp::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
