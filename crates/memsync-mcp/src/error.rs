//! Error types for the MCP client

use thiserror::Error;

/// Result type alias for MCP client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving an MCP server over stdio
#[derive(Debug, Error)]
pub enum Error {
    /// The server process could not be started
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The initialize exchange failed, timed out, or returned garbage
    #[error("handshake failed: {message}")]
    Handshake { message: String },

    /// Timeout, broken pipe, or the server closed its stdout
    #[error("transport error: {message}; recent stderr: [{stderr}]")]
    Transport { message: String, stderr: String },

    /// Malformed framing or a body that is not a JSON-RPC message
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The server or the tool itself reported a failure
    #[error("tool error: {message}")]
    Tool { message: String },

    /// The client was used after `close()` or before the handshake finished
    #[error("client is not ready (state: {state})")]
    NotReady { state: String },

    /// Error serializing an outgoing message
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool {
            message: message.into(),
        }
    }

    /// Whether the failure came from the channel rather than the remote tool
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Protocol { .. })
    }
}
