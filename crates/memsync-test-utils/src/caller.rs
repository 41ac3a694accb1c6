//! [`RecordingCaller`], an in-memory stand-in for the MCP client.

use std::collections::VecDeque;

use async_trait::async_trait;
use memsync_mcp::{Error, Result, ToolCaller};
use serde_json::{Value, json};

/// One recorded tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub name: String,
    pub arguments: Value,
}

/// Records every call and answers from a queue of canned results.
///
/// When the queue is empty the call succeeds with an empty content list.
#[derive(Debug, Default)]
pub struct RecordingCaller {
    pub calls: Vec<RecordedCall>,
    responses: VecDeque<Result<Value>>,
}

impl RecordingCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result
    pub fn respond(mut self, result: Value) -> Self {
        self.responses.push_back(Ok(result));
        self
    }

    /// Queue the result a create call returns for a new remote id
    pub fn respond_created(self, id: u64) -> Self {
        self.respond(created_response(id))
    }

    /// Queue a failure
    pub fn fail(mut self, error: Error) -> Self {
        self.responses.push_back(Err(error));
        self
    }

    /// Calls made to a given tool, in order
    pub fn calls_to(&self, name: &str) -> Vec<&RecordedCall> {
        self.calls.iter().filter(|c| c.name == name).collect()
    }
}

#[async_trait]
impl ToolCaller for RecordingCaller {
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        self.calls.push(RecordedCall {
            name: name.to_string(),
            arguments,
        });
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"content": []})))
    }
}

/// A create result whose first text entry is `{"id": <id>}`
pub fn created_response(id: u64) -> Value {
    json!({
        "content": [{"type": "text", "text": json!({"id": id, "title": "created"}).to_string()}]
    })
}
