//! PortReaper Core Library
//!
//! Port discovery and respawn-aware process termination for Windows.
//! Provides functionality to:
//! - List listening TCP and bound UDP ports with their owning processes
//! - Force-kill a process tree, with a second mechanism as fallback
//! - Detect a supervisor respawning the killed process and offer its parent
//! - Manage user settings (settle delay, chase depth, output ceiling)
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! Talks to `netstat`, `tasklist`, `taskkill` and PowerShell, all resolved
//! under `%SystemRoot%\System32`. Every command goes through a
//! [`CommandRunner`](ports::CommandRunner), so the parsing and decision logic
//! runs anywhere.

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    filter_bindings, KillReport, PortBinding, PortFilter, Protocol, RespawnAnomaly,
    WatchOutcome,
};

// Re-export other commonly used types
pub use config::{ConfigStore, Settings};
pub use engine::{ElevationHook, PortReaper};
pub use error::{Error, KillError, Result};
