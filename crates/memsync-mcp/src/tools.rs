//! Tool results and the tool-calling seam
//!
//! [`ToolCaller`] is what the sync engine talks to. [`crate::McpClient`]
//! implements it over stdio; tests substitute an in-memory recorder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Something that can invoke a remote tool and return its raw result
#[async_trait]
pub trait ToolCaller: Send {
    /// Invoke `name` with `arguments`.
    ///
    /// Returns the `result` payload of the response. Protocol-level errors
    /// and results flagged `isError` are reported as [`Error::Tool`].
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value>;
}

/// Result from a tool invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    /// Text of the first content entry, if it is a text entry
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first() {
            Some(ToolContent::Text { text }) => Some(text),
            _ => None,
        }
    }
}

/// Turn a raw `result` payload into `Ok(result)` or a tool error.
///
/// A result with `isError: true` becomes [`Error::Tool`] carrying the text of
/// the first content entry.
pub fn check_tool_result(result: Value) -> Result<Value> {
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !is_error {
        return Ok(result);
    }

    let message = result
        .get("content")
        .and_then(|content| content.get(0))
        .and_then(|entry| entry.get("text"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");
    Err(Error::tool(format!("tool execution error: {}", message)))
}
