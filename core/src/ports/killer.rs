//! Process killer port (interface).

use crate::domain::TerminationFailure;

/// Port for killing processes.
///
/// Implementations try every mechanism they have before reporting failure
/// and do not wait for the process to actually exit.
pub trait ProcessKillerPort: Send + Sync {
    /// Forcefully terminate `pid` and its descendants.
    fn kill(
        &self,
        pid: u32,
    ) -> impl std::future::Future<Output = std::result::Result<(), TerminationFailure>> + Send;
}
