//! A scripted MCP server for transport tests.
//!
//! [`ScriptedServer`] writes canned Content-Length frames to a temp file and
//! returns a `sh` command line that replays them on stdout. Because the client
//! assigns ids deterministically (1 for `initialize`, then 2, 3, ...), the
//! responses can be queued before the client ever writes anything.
//!
//! Realism level: **FAKE**. The script never parses what the client sends;
//! it only records it.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::{Value, json};
use tempfile::TempDir;

/// What the script does once every canned frame has been written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterReplay {
    /// Copy stdin to `received.log` until the client closes it
    Record,
    /// Ignore stdin and sleep; only a signal ends the process
    Hang,
    /// Close stdout but keep draining stdin, so the client sees EOF
    /// without its writes failing
    CloseStdout,
}

/// Builder for a replaying MCP server subprocess.
///
/// # Example
///
/// ```rust,no_run
/// use memsync_test_utils::server::ScriptedServer;
///
/// let server = ScriptedServer::new()
///     .initialize_ok()
///     .tool_text(2, r#"{"id": 7}"#);
/// let command = server.command();
/// // spawn `command`, talk to it, then inspect `server.received_messages()`
/// ```
pub struct ScriptedServer {
    dir: TempDir,
    frames: Vec<u8>,
    stderr: Vec<String>,
    after: AfterReplay,
}

impl Default for ScriptedServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            frames: Vec::new(),
            stderr: Vec::new(),
            after: AfterReplay::Record,
        }
    }

    /// Queue a successful `initialize` response (id 1)
    pub fn initialize_ok(self) -> Self {
        self.respond(
            1,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": "scripted-memory", "version": "0.0.1"}
            }),
        )
    }

    /// Queue a response with the given id and result
    pub fn respond(self, id: u64, result: Value) -> Self {
        self.message(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    }

    /// Queue a JSON-RPC error response
    pub fn respond_error(self, id: u64, code: i64, message: &str) -> Self {
        self.message(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
    }

    /// Queue a tool result whose first content entry is `text`
    pub fn tool_text(self, id: u64, text: &str) -> Self {
        self.respond(id, json!({"content": [{"type": "text", "text": text}]}))
    }

    /// Queue a tool result flagged `isError`
    pub fn tool_error(self, id: u64, text: &str) -> Self {
        self.respond(
            id,
            json!({"content": [{"type": "text", "text": text}], "isError": true}),
        )
    }

    /// Queue a notification (no id)
    pub fn notify(self, method: &str) -> Self {
        self.message(json!({"jsonrpc": "2.0", "method": method, "params": {}}))
    }

    /// Queue any JSON value as one frame
    pub fn message(mut self, message: Value) -> Self {
        let body = serde_json::to_vec(&message).unwrap();
        self.frames
            .extend(format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes());
        self.frames.extend(body);
        self
    }

    /// Queue raw bytes, for malformed-frame tests
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.frames.extend_from_slice(bytes);
        self
    }

    /// Emit a line on stderr before replaying frames
    pub fn stderr_line(mut self, line: &str) -> Self {
        self.stderr.push(line.to_string());
        self
    }

    pub fn after_replay(mut self, after: AfterReplay) -> Self {
        self.after = after;
        self
    }

    /// Shorthand for [`AfterReplay::Hang`]
    pub fn hang(self) -> Self {
        self.after_replay(AfterReplay::Hang)
    }

    /// Write the script inputs and return the command line to spawn
    pub fn command(&self) -> Vec<String> {
        let frames = self.path("frames.bin");
        let stderr = self.path("stderr.txt");
        fs::write(&frames, &self.frames).unwrap();
        let mut stderr_text = self.stderr.join("\n");
        if !stderr_text.is_empty() {
            stderr_text.push('\n');
        }
        fs::write(&stderr, stderr_text).unwrap();

        let tail = match self.after {
            AfterReplay::Record => format!("exec cat > '{}'", self.path("received.log").display()),
            AfterReplay::Hang => "exec sleep 30".to_string(),
            AfterReplay::CloseStdout => "exec 1>&-; exec cat > /dev/null".to_string(),
        };
        let script = format!(
            "cat '{}' >&2; echo $$ > '{}'; cat '{}'; {}",
            stderr.display(),
            self.path("pid").display(),
            frames.display(),
            tail
        );
        vec!["sh".to_string(), "-c".to_string(), script]
    }

    /// Everything the client wrote, available once the server has exited
    pub fn received(&self) -> Vec<u8> {
        fs::read(self.path("received.log")).unwrap_or_default()
    }

    /// Decode the received bytes into JSON messages
    pub fn received_messages(&self) -> Vec<Value> {
        let data = self.received();
        let mut messages = Vec::new();
        let mut rest = data.as_slice();
        while let Some(header_end) = rest.windows(4).position(|w| w == b"\r\n\r\n") {
            let header = String::from_utf8_lossy(&rest[..header_end]).to_string();
            let length: usize = header
                .trim()
                .strip_prefix("Content-Length:")
                .unwrap_or_else(|| panic!("unexpected header {:?}", header))
                .trim()
                .parse()
                .unwrap();
            let body_start = header_end + 4;
            messages.push(serde_json::from_slice(&rest[body_start..body_start + length]).unwrap());
            rest = &rest[body_start + length..];
        }
        messages
    }

    /// PID of the script process, once it has started
    pub fn pid(&self) -> Option<u32> {
        fs::read_to_string(self.path("pid"))
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Check if a process is still alive by PID
pub fn is_process_alive(pid: u32) -> bool {
    // kill -0 sends no signal, it only checks the process exists
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
