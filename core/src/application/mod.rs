//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod watchdog;

pub use watchdog::{RespawnWatchdog, DEFAULT_MAX_CHASE_DEPTH, DEFAULT_SETTLE_DELAY};
