//! Core sync layer for memory-sync
//!
//! This crate mirrors local markdown memories into a remote memory service,
//! implementing:
//!
//! - **State Store**: persisted map from memory name to remote id and content hash
//! - **Memory parsing**: markdown with optional YAML front matter
//! - **SyncEngine**: create, update, and delete with hash deduplication
//! - **Change detection**: staged git changes mapped to sync operations
//! - **Deferred queue**: changes recorded while the service is unavailable
//! - **Freshness report**: drift between local files and the State Store
//!
//! # Architecture
//!
//! ```text
//!          memsync-cli
//!               |
//!         memsync-core  -- StateStore (.memory_sync_state.json)
//!               |
//!         memsync-mcp   -- ToolCaller / McpClient
//! ```
//!
//! # Example
//!
//! ```ignore
//! use memsync_core::{SyncConfig, SyncEngine, SyncOperation, SyncOptions};
//! use memsync_mcp::McpClient;
//!
//! let config = SyncConfig::load(root)?;
//! let mut client = McpClient::spawn(config.server.client_config(root)?).await?;
//! let mut engine = SyncEngine::new(root, config, SyncOptions::default())?;
//! let result = engine
//!     .sync_memory(&mut client, Path::new(".serena/memories/foo.md"), SyncOperation::Create)
//!     .await;
//! client.close().await;
//! ```

pub mod changes;
pub mod checksum;
pub mod config;
pub mod error;
pub mod freshness;
pub mod io;
pub mod memory;
pub mod queue;
pub mod state;
pub mod sync;

pub use changes::{detect_changes, is_memory_file};
pub use checksum::{compute_content_hash, compute_file_hash};
pub use config::{CONFIG_FILE, ServerConfig, SyncConfig, ToolNames};
pub use error::{Error, Result};
pub use freshness::{FreshnessDetail, FreshnessReport, FreshnessStatus, check_freshness};
pub use memory::{FrontMatterParser, MemoryParser, MemoryRecord};
pub use queue::{QueueEntry, SyncQueue};
pub use state::{StateEntry, StateStore};
pub use sync::{SyncEngine, SyncOperation, SyncOptions, SyncResult, extract_remote_id};
