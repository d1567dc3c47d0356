//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod command;
mod killer;
mod parent;
mod scanner;

pub use command::{CommandRunner, SystemBinary};
pub use killer::ProcessKillerPort;
pub use parent::ParentResolverPort;
pub use scanner::PortScannerPort;
