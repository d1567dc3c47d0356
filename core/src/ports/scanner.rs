//! Port scanner port (interface).

use crate::domain::PortBinding;
use crate::error::Result;

/// Port for scanning network ports.
///
/// This trait defines the interface for port scanning functionality.
/// Implementations return a fresh snapshot on every call.
pub trait PortScannerPort: Send + Sync {
    /// Scan listening TCP and bound UDP sockets.
    ///
    /// Returns bindings sorted by port, unique per `(port, protocol)`.
    fn scan(&self) -> impl std::future::Future<Output = Result<Vec<PortBinding>>> + Send;
}
