//! MCP stdio client for memory-sync
//!
//! This crate drives an external MCP server process (the remote memory
//! service) over its stdin/stdout using Content-Length framed JSON-RPC 2.0.
//!
//! # Architecture
//!
//! ```text
//! [ memsync-core SyncEngine ]
//!        | ToolCaller::call_tool
//!        v
//! [ McpClient ] --(framed JSON-RPC on stdin)--> [ server process ]
//!        ^                                            |
//!        +------(framed JSON-RPC on stdout)-----------+
//!        ^                                            |
//! [ stderr drain task ] <------(stderr lines)---------+
//! ```
//!
//! - [`framing`] reassembles frames from arbitrary read chunks
//! - [`protocol`] holds the JSON-RPC and MCP message types
//! - [`envelope`] maps a logical tool name onto the server's `tools/call` shape
//! - [`stderr`] keeps the last few diagnostic lines for error messages
//! - [`client`] owns the process and the request/response loop

pub mod client;
pub mod envelope;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod stderr;
pub mod tools;

pub use client::{ClientConfig, ClientState, McpClient};
pub use envelope::{DirectEnvelope, DispatchEnvelope, EnvelopeConfig, ToolEnvelope};
pub use error::{Error, Result};
pub use protocol::ServerInfo;
pub use tools::{ToolCaller, ToolContent, ToolResult};
