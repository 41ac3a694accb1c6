//! Mapping from a logical tool name to the `tools/call` params a server expects
//!
//! Some servers expose every tool directly; others route all calls through a
//! single dispatcher tool. The mapping is a [`ToolEnvelope`] so the transport
//! does not hardcode either convention.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::protocol::ToolCallParams;

/// Name prefix used by the Forgetful dispatcher
pub const FORGETFUL_DISPATCH_PREFIX: &str = "execute_forgetful_tool-forgetful-tool-";

/// Wraps a tool invocation into `tools/call` params
pub trait ToolEnvelope: Send + Sync + std::fmt::Debug {
    fn wrap(&self, tool: &str, arguments: Value) -> ToolCallParams;
}

/// Calls the tool by its own name with the arguments untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEnvelope;

impl ToolEnvelope for DirectEnvelope {
    fn wrap(&self, tool: &str, arguments: Value) -> ToolCallParams {
        ToolCallParams {
            name: tool.to_string(),
            arguments,
        }
    }
}

/// Routes the call through a dispatcher tool named `<prefix><tool>` whose
/// arguments are `{"tool_name": tool, "arguments": arguments}`
#[derive(Debug, Clone)]
pub struct DispatchEnvelope {
    pub name_prefix: String,
}

impl ToolEnvelope for DispatchEnvelope {
    fn wrap(&self, tool: &str, arguments: Value) -> ToolCallParams {
        ToolCallParams {
            name: format!("{}{}", self.name_prefix, tool),
            arguments: json!({
                "tool_name": tool,
                "arguments": arguments,
            }),
        }
    }
}

/// Serializable choice of envelope, used by configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EnvelopeConfig {
    Direct,
    Dispatch { name_prefix: String },
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self::Dispatch {
            name_prefix: FORGETFUL_DISPATCH_PREFIX.to_string(),
        }
    }
}

impl EnvelopeConfig {
    pub fn build(&self) -> Box<dyn ToolEnvelope> {
        match self {
            Self::Direct => Box::new(DirectEnvelope),
            Self::Dispatch { name_prefix } => Box::new(DispatchEnvelope {
                name_prefix: name_prefix.clone(),
            }),
        }
    }
}
