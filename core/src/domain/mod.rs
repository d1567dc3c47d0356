//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod binding;
mod classify;
mod filter;
mod outcome;

// Re-export all domain types
pub use binding::{PortBinding, ProcessTable, Protocol, UNKNOWN_PROCESS};
pub use classify::{
    classify_kill_failure, failure_kind, truncate_diagnostic, FailureKind, KillStage,
    TerminationFailure, DIAGNOSTIC_DISPLAY_LIMIT, KILL_FAILURE_PATTERNS,
};
pub use filter::{filter_bindings, is_dev_process, is_system_process, PortFilter};
pub use outcome::{decide, KillReport, RespawnAnomaly, WatchOutcome, WatchState, ROOT_PID};
