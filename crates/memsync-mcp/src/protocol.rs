//! MCP Protocol message types
//!
//! JSON-RPC 2.0 message structures for the client side of an MCP session.
//! Outgoing types are `Serialize`, incoming types are `Deserialize` and
//! tolerant of fields the client does not care about.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version tag carried by every message
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision announced during `initialize`
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Handshake request method
pub const METHOD_INITIALIZE: &str = "initialize";

/// Notification sent once the initialize response has been received
pub const METHOD_INITIALIZED: &str = "notifications/initialized";

/// Tool invocation method
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// JSON-RPC 2.0 Request or Notification (a notification has no id)
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn request(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method: method.into(),
            params,
        }
    }
}

/// Any message the server may send: a response, a notification, or a
/// server-initiated request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// The routing fields of an incoming message.
///
/// Read before the full [`JsonRpcMessage`] so that a message meant for
/// another request is skipped whatever the shape of its payload.
#[derive(Debug, Default, Deserialize)]
pub struct MessageHeader {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<Value>,
}

impl MessageHeader {
    /// Messages without an id never answer a request
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Server-initiated requests carry both an id and a method
    pub fn is_request(&self) -> bool {
        self.id.is_some() && self.method.is_some()
    }

    /// Whether this message answers the request with the given id
    pub fn answers(&self, id: u64) -> bool {
        match &self.id {
            Some(Value::Number(n)) => !self.is_request() && n.as_u64() == Some(id),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Initialize request params
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: ClientInfo,
}

/// The client advertises no optional capabilities
#[derive(Debug, Serialize, Default)]
pub struct ClientCapabilities {}

#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Initialize response result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Tool call params
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}
