//! Sync Engine for mirroring local memory files into the remote service
//!
//! This module provides:
//! - **engine**: `sync_memory` / `sync_batch` over a [`ToolCaller`](memsync_mcp::ToolCaller)
//! - **result**: the per-item [`SyncResult`] and the [`SyncOperation`] it reports
//! - **payload**: remote tool arguments built from a [`MemoryRecord`](crate::MemoryRecord)
//! - **extract**: recovering the remote id from a create response

mod engine;
mod extract;
mod payload;
mod result;

pub use engine::{SyncEngine, SyncOptions};
pub use extract::extract_remote_id;
pub use payload::{
    build_create_payload, build_delete_payload, build_update_payload, confidence_to_importance,
    memory_id_value,
};
pub use result::{SyncOperation, SyncResult};
