//! Project configuration read from `.memory_sync.toml`
//!
//! Every key is optional; a project without the file gets the defaults.
//!
//! ```toml
//! memory_dir = ".serena/memories"
//! source_repo = "me/my-project"
//!
//! [server]
//! command = ["uvx", "forgetful-ai"]
//! timeout_secs = 10
//!
//! [server.envelope]
//! kind = "direct"
//!
//! [tools]
//! create_memory = "create_memory"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use memsync_mcp::{ClientConfig, EnvelopeConfig, McpClient};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Config file name, relative to the project root
pub const CONFIG_FILE: &str = ".memory_sync.toml";

/// Default location of the remote service's local database
pub const DEFAULT_MARKER: &str = ".local/share/forgetful/forgetful.db";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory holding memory files, relative to the project root
    pub memory_dir: PathBuf,
    pub state_file: PathBuf,
    pub queue_file: PathBuf,
    /// Reported to the remote service; the project directory name when unset
    pub source_repo: Option<String>,
    pub encoding_agent: String,
    pub server: ServerConfig,
    pub tools: ToolNames,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            memory_dir: PathBuf::from(".serena/memories"),
            state_file: PathBuf::from(".memory_sync_state.json"),
            queue_file: PathBuf::from(".memory_sync_queue.json"),
            source_repo: None,
            encoding_agent: format!("memory-sync/{}", env!("CARGO_PKG_VERSION")),
            server: ServerConfig::default(),
            tools: ToolNames::default(),
        }
    }
}

impl SyncConfig {
    /// Parse configuration from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use memsync_core::SyncConfig;
    ///
    /// let config = SyncConfig::parse(r#"
    /// memory_dir = "docs/memories"
    ///
    /// [server]
    /// timeout_secs = 30
    /// "#).unwrap();
    ///
    /// assert_eq!(config.memory_dir, std::path::PathBuf::from("docs/memories"));
    /// assert_eq!(config.server.timeout_secs, 30);
    /// assert_eq!(config.tools.create_memory, "create_memory");
    /// ```
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `.memory_sync.toml` from the project root, defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be parsed.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} found, using defaults", CONFIG_FILE);
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        Self::parse(&content).map_err(|e| Error::Config {
            path,
            message: e.to_string(),
        })
    }

    pub fn memory_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.memory_dir)
    }

    pub fn state_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.state_file)
    }

    pub fn queue_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.queue_file)
    }

    /// The configured source repository, or the project directory name
    pub fn source_repo_for(&self, project_root: &Path) -> String {
        self.source_repo.clone().unwrap_or_else(|| {
            project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        })
    }
}

/// How to start and talk to the remote memory service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Program and arguments
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub close_timeout_secs: u64,
    pub stderr_lines: usize,
    /// File whose existence means the service is installed; `~/` is expanded
    pub availability_marker: Option<PathBuf>,
    pub envelope: EnvelopeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: vec!["uvx".to_string(), "forgetful-ai".to_string()],
            timeout_secs: 10,
            close_timeout_secs: 5,
            stderr_lines: 10,
            availability_marker: None,
            envelope: EnvelopeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Transport settings for spawning the server from `project_root`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `command` is empty.
    pub fn client_config(&self, project_root: &Path) -> Result<ClientConfig> {
        let config = ClientConfig::from_command(&self.command).ok_or_else(|| Error::Config {
            path: PathBuf::from(CONFIG_FILE),
            message: "server.command must not be empty".to_string(),
        })?;
        let mut config = config
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_close_timeout(Duration::from_secs(self.close_timeout_secs))
            .with_envelope(self.envelope.clone())
            .with_current_dir(project_root);
        config.stderr_lines = self.stderr_lines;
        Ok(config)
    }

    /// Resolved marker path, `None` if no home directory is known
    pub fn marker_path(&self) -> Option<PathBuf> {
        match &self.availability_marker {
            Some(path) => match path.strip_prefix("~") {
                Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
                Err(_) => Some(path.clone()),
            },
            None => dirs::home_dir().map(|home| home.join(DEFAULT_MARKER)),
        }
    }

    /// Whether the service's local store exists
    pub fn is_available(&self) -> bool {
        self.marker_path()
            .is_some_and(|marker| McpClient::is_available(&marker))
    }
}

/// Remote tool names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolNames {
    pub create_memory: String,
    pub update_memory: String,
    pub mark_memory_obsolete: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            create_memory: "create_memory".to_string(),
            update_memory: "update_memory".to_string(),
            mark_memory_obsolete: "mark_memory_obsolete".to_string(),
        }
    }
}
