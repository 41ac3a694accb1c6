//! MCP client over a child process's stdio
//!
//! The client owns one server process. Its lifecycle is
//! `Created -> Handshaking -> Ready -> Closed`; a failed handshake closes the
//! process and the caller never sees a half-initialized client.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::envelope::{EnvelopeConfig, ToolEnvelope};
use crate::framing::{FrameError, FrameReader, encode_frame};
use crate::protocol::{
    ClientCapabilities, ClientInfo, InitializeParams, InitializeResult, JsonRpcMessage,
    JsonRpcRequest, MessageHeader, MCP_PROTOCOL_VERSION, METHOD_INITIALIZE, METHOD_INITIALIZED,
    METHOD_TOOLS_CALL, ServerInfo,
};
use crate::stderr::{DEFAULT_STDERR_LINES, StderrTail, spawn_drain};
use crate::tools::{ToolCaller, check_tool_result};
use crate::{Error, Result};

/// How long a single read may wait for the server
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long each shutdown step waits for the server to exit
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for spawning and talking to an MCP server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Executable to run
    pub program: String,
    /// Arguments passed to the executable
    pub args: Vec<String>,
    /// Working directory for the server, inherited when `None`
    pub current_dir: Option<PathBuf>,
    pub request_timeout: Duration,
    pub close_timeout: Duration,
    /// Number of stderr lines kept for error messages
    pub stderr_lines: usize,
    pub client_name: String,
    pub client_version: String,
    pub protocol_version: String,
    pub envelope: EnvelopeConfig,
}

impl ClientConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current_dir: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            stderr_lines: DEFAULT_STDERR_LINES,
            client_name: "memory-sync".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            envelope: EnvelopeConfig::default(),
        }
    }

    /// Build from a full command line; `None` if it is empty
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// The command as it would be typed in a shell, for messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lifecycle state of an [`McpClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Created,
    Handshaking,
    Ready,
    Closed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Created => write!(f, "created"),
            ClientState::Handshaking => write!(f, "handshaking"),
            ClientState::Ready => write!(f, "ready"),
            ClientState::Closed => write!(f, "closed"),
        }
    }
}

/// JSON-RPC 2.0 client speaking MCP to a child process
///
/// Requests are strictly sequential: `&mut self` on every call means only one
/// request can be outstanding on the byte stream at a time.
///
/// # Example
///
/// ```ignore
/// use memsync_mcp::{ClientConfig, McpClient};
///
/// let config = ClientConfig::new("uvx", vec!["forgetful-ai".to_string()]);
/// let mut client = McpClient::spawn(config).await?;
/// let result = client.call_tool("create_memory", json!({"title": "..."})).await?;
/// client.close().await;
/// ```
#[derive(Debug)]
pub struct McpClient {
    child: Child,
    stdin: Option<ChildStdin>,
    reader: FrameReader<ChildStdout>,
    stderr: StderrTail,
    drain: Option<JoinHandle<()>>,
    envelope: Box<dyn ToolEnvelope>,
    request_timeout: Duration,
    close_timeout: Duration,
    next_id: u64,
    state: ClientState,
    server_info: Option<ServerInfo>,
}

impl McpClient {
    /// Spawn the server and perform the initialize handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started and
    /// [`Error::Handshake`] if initialization fails for any reason. In the
    /// latter case the process has already been shut down.
    pub async fn spawn(config: ClientConfig) -> Result<Self> {
        let command_line = config.command_line();
        tracing::debug!(command = %command_line, "Spawning MCP server");

        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            command: command_line.clone(),
            source,
        })?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.start_kill();
            return Err(Error::Spawn {
                command: command_line,
                source: io::Error::other("child stdio was not captured"),
            });
        };

        let tail = StderrTail::new(config.stderr_lines);
        let drain = spawn_drain(stderr, tail.clone());

        let mut client = Self {
            child,
            stdin: Some(stdin),
            reader: FrameReader::new(stdout),
            stderr: tail,
            drain: Some(drain),
            envelope: config.envelope.build(),
            request_timeout: config.request_timeout,
            close_timeout: config.close_timeout,
            next_id: 0,
            state: ClientState::Created,
            server_info: None,
        };

        if let Err(e) = client.handshake(&config).await {
            client.close().await;
            return Err(match e {
                Error::Handshake { .. } => e,
                other => Error::Handshake {
                    message: other.to_string(),
                },
            });
        }

        Ok(client)
    }

    /// Replace the tool envelope chosen by the config
    pub fn with_envelope(mut self, envelope: Box<dyn ToolEnvelope>) -> Self {
        self.envelope = envelope;
        self
    }

    /// Whether the remote service's local store exists at `marker`
    pub fn is_available(marker: &Path) -> bool {
        marker.exists()
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Server name and version reported during the handshake
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Most recent stderr lines of the server, oldest first
    pub fn recent_stderr(&self) -> Vec<String> {
        self.stderr.snapshot()
    }

    /// OS process id, `None` once the process has been reaped
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Invoke a remote tool and return its result payload.
    ///
    /// # Errors
    ///
    /// [`Error::Tool`] for an error response or an `isError` result,
    /// [`Error::Transport`] on timeout or a closed channel,
    /// [`Error::Protocol`] on malformed frames, and [`Error::NotReady`] if
    /// the client is not in the `Ready` state.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        if self.state != ClientState::Ready {
            return Err(Error::NotReady {
                state: self.state.to_string(),
            });
        }

        let params = self.envelope.wrap(name, arguments);
        tracing::debug!(tool = name, wire_name = %params.name, "Calling tool");

        let response = self
            .send_request(METHOD_TOOLS_CALL, serde_json::to_value(&params)?)
            .await?;
        if let Some(error) = response.error {
            return Err(Error::tool(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }
        check_tool_result(response.result.unwrap_or_else(|| json!({})))
    }

    /// Shut the server down.
    ///
    /// Closes stdin and waits for a voluntary exit, then sends SIGTERM and
    /// waits again, then kills. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == ClientState::Closed {
            return;
        }
        self.state = ClientState::Closed;

        drop(self.stdin.take());

        if !self.wait_for_exit().await {
            self.terminate().await;
            if !self.wait_for_exit().await {
                tracing::warn!("MCP server ignored termination, killing it");
                if let Err(e) = self.child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill MCP server");
                }
            }
        }

        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
        tracing::debug!("MCP server closed");
    }

    async fn handshake(&mut self, config: &ClientConfig) -> Result<()> {
        self.state = ClientState::Handshaking;

        let params = InitializeParams {
            protocol_version: config.protocol_version.clone(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: config.client_name.clone(),
                version: config.client_version.clone(),
            },
        };
        let response = self
            .send_request(METHOD_INITIALIZE, serde_json::to_value(params)?)
            .await?;

        if let Some(error) = response.error {
            return Err(Error::Handshake {
                message: format!("{} (code {})", error.message, error.code),
            });
        }
        let result = response.result.ok_or_else(|| Error::Handshake {
            message: "initialize response carried no result".to_string(),
        })?;
        let init: InitializeResult =
            serde_json::from_value(result).map_err(|e| Error::Handshake {
                message: format!("malformed initialize result: {}", e),
            })?;

        tracing::debug!(
            server = ?init.server_info,
            protocol = ?init.protocol_version,
            "MCP handshake complete"
        );
        self.server_info = init.server_info;

        self.send_notification(METHOD_INITIALIZED, json!({})).await?;
        self.state = ClientState::Ready;
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    async fn send_request(&mut self, method: &str, params: Value) -> Result<JsonRpcMessage> {
        let id = self.next_id();
        self.write_message(&JsonRpcRequest::request(id, method, params))
            .await?;
        self.read_response(id).await
    }

    async fn send_notification(&mut self, method: &str, params: Value) -> Result<()> {
        self.write_message(&JsonRpcRequest::notification(method, params))
            .await
    }

    async fn write_message(&mut self, message: &JsonRpcRequest) -> Result<()> {
        let frame = encode_frame(&serde_json::to_vec(message)?);
        let written = match self.stdin.as_mut() {
            Some(stdin) => write_frame(stdin, &frame).await,
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin is closed")),
        };
        written.map_err(|e| self.transport_error(format!("failed to write to server: {}", e)))
    }

    /// Read until the response for `expected` arrives.
    ///
    /// Notifications, server-initiated requests and responses for other ids
    /// are skipped.
    async fn read_response(&mut self, expected: u64) -> Result<JsonRpcMessage> {
        loop {
            let body = match self.reader.read_frame(self.request_timeout).await {
                Ok(body) => body,
                Err(FrameError::Timeout(waited)) => {
                    return Err(self.transport_error(format!(
                        "timed out after {:.1}s waiting for response to request {}",
                        waited.as_secs_f64(),
                        expected
                    )));
                }
                Err(FrameError::Closed) => {
                    return Err(self.transport_error("server closed stdout"));
                }
                Err(FrameError::Io(e)) => {
                    return Err(self.transport_error(format!("failed to read from server: {}", e)));
                }
                Err(e @ FrameError::InvalidHeader(_)) => {
                    return Err(Error::protocol(e.to_string()));
                }
            };

            let value: Value = serde_json::from_slice(&body)
                .map_err(|e| Error::protocol(format!("invalid JSON-RPC message: {}", e)))?;
            let header = MessageHeader::deserialize(&value)
                .map_err(|e| Error::protocol(format!("invalid JSON-RPC message: {}", e)))?;

            if header.is_notification() {
                tracing::debug!(method = ?header.method, "Skipping notification");
                continue;
            }
            if header.is_request() {
                tracing::debug!(method = ?header.method, id = ?header.id, "Ignoring server request");
                continue;
            }
            if !header.answers(expected) {
                tracing::warn!(id = ?header.id, expected, "Discarding response with unexpected id");
                continue;
            }
            return serde_json::from_value(value)
                .map_err(|e| Error::protocol(format!("invalid JSON-RPC response: {}", e)));
        }
    }

    fn transport_error(&self, message: impl Into<String>) -> Error {
        Error::Transport {
            message: message.into(),
            stderr: self.stderr.render(),
        }
    }

    async fn wait_for_exit(&mut self) -> bool {
        match tokio::time::timeout(self.close_timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(%status, "MCP server exited");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to wait for MCP server");
                false
            }
            Err(_) => false,
        }
    }

    #[cfg(unix)]
    async fn terminate(&mut self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        let status = Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if !matches!(status, Ok(s) if s.success()) {
            let _ = self.child.start_kill();
        }
    }

    #[cfg(not(unix))]
    async fn terminate(&mut self) {
        let _ = self.child.start_kill();
    }
}

async fn write_frame(stdin: &mut ChildStdin, frame: &[u8]) -> io::Result<()> {
    stdin.write_all(frame).await?;
    stdin.flush().await
}

#[async_trait]
impl ToolCaller for McpClient {
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        McpClient::call_tool(self, name, arguments).await
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        if self.state != ClientState::Closed {
            tracing::debug!("MCP client dropped without close, killing server");
            let _ = self.child.start_kill();
        }
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_command_splits_program() {
        let command = vec!["uvx".to_string(), "forgetful-ai".to_string()];
        let config = ClientConfig::from_command(&command).unwrap();
        assert_eq!(config.program, "uvx");
        assert_eq!(config.args, vec!["forgetful-ai"]);
        assert_eq!(config.command_line(), "uvx forgetful-ai");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn config_from_empty_command_is_none() {
        assert!(ClientConfig::from_command(&[]).is_none());
    }

    #[test]
    fn state_display() {
        assert_eq!(ClientState::Ready.to_string(), "ready");
        assert_eq!(ClientState::Closed.to_string(), "closed");
    }

    #[tokio::test]
    async fn spawn_missing_command_is_spawn_error() {
        let config = ClientConfig::new("definitely-not-a-real-mcp-server-binary", Vec::new());
        match McpClient::spawn(config).await {
            Err(Error::Spawn { command, .. }) => {
                assert_eq!(command, "definitely-not-a-real-mcp-server-binary");
            }
            other => panic!("expected spawn error, got {:?}", other.map(|_| ())),
        }
    }
}
