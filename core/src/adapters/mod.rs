//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter talks to the operating system through a [`CommandRunner`].
//!
//! [`CommandRunner`]: crate::ports::CommandRunner

pub mod command;
pub mod parent;
pub mod scanner;
pub mod terminator;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use command::{default_system_root, SystemCommandRunner, DEFAULT_OUTPUT_LIMIT};
pub use parent::ParentResolver;
pub use scanner::{PortScanner, TasklistLoader};
pub use terminator::ProcessTerminator;
