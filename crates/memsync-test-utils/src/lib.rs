//! Shared test utilities for the memory-sync workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`project`]: [`project::TestProject`], a temp project with a memory directory
//! - [`server`]: [`server::ScriptedServer`], a subprocess that replays canned MCP frames
//! - [`caller`]: [`caller::RecordingCaller`], an in-memory `ToolCaller`

pub mod caller;
pub mod project;
pub mod server;
