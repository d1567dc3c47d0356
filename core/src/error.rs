//! Error types for the portreaper-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::KillStage;

/// Result type alias for portreaper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during port discovery and process termination.
#[derive(Error, Debug)]
pub enum Error {
    /// A system binary is missing from its expected absolute location.
    #[error("{program} not found at {}", path.display())]
    BinaryNotFound { program: &'static str, path: PathBuf },

    /// A system command exited unsuccessfully.
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: &'static str,
        status: String,
        stderr: String,
    },

    /// A system command wrote more output than the configured ceiling.
    #[error("{program} produced more than {limit} bytes of output")]
    OutputTooLarge { program: &'static str, limit: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Termination failed after both kill mechanisms were tried.
    #[error(transparent)]
    Kill(#[from] KillError),

    /// A parent chase was requested for an anomaly without a candidate.
    #[error("Process {pid} respawned but there is no parent left to kill")]
    NoParentCandidate { pid: u32 },

    /// Nothing is bound to the requested port.
    #[error("No process is bound to port {0}")]
    PortNotBound(u16),
}

impl Error {
    /// The diagnostic text carried by this error.
    ///
    /// For failed commands this is the captured stderr (or stdout) text,
    /// which is what the failure classifier matches against.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::CommandFailed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// A classified termination failure.
///
/// Produced by [`crate::domain::classify_kill_failure`] from the raw
/// diagnostic of the last failed kill mechanism.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KillError {
    /// The caller lacks the privilege to terminate the process.
    #[error("Permission denied killing process {pid}; run as administrator")]
    PermissionDenied { pid: u32 },

    /// The process no longer exists.
    #[error("Process {pid} not found (already exited?)")]
    NotFound { pid: u32 },

    /// Any other failure. `message` is already truncated for display.
    #[error("Failed to kill process {pid}: {message}")]
    Failed {
        pid: u32,
        stage: KillStage,
        message: String,
    },
}

impl KillError {
    /// The pid the failed kill targeted.
    pub fn pid(&self) -> u32 {
        match self {
            KillError::PermissionDenied { pid }
            | KillError::NotFound { pid }
            | KillError::Failed { pid, .. } => *pid,
        }
    }

    /// Whether retrying with elevated privileges could succeed.
    pub fn suggests_elevation(&self) -> bool {
        matches!(self, KillError::PermissionDenied { .. })
    }

    /// Whether the caller's view is stale and should be refreshed.
    pub fn should_refresh(&self) -> bool {
        matches!(self, KillError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_diagnostic() {
        let err = Error::CommandFailed {
            program: "taskkill",
            status: "exit code: 128".to_string(),
            stderr: "ERROR: The process \"42\" not found.".to_string(),
        };
        assert_eq!(err.diagnostic(), "ERROR: The process \"42\" not found.");
        assert!(err.to_string().contains("taskkill"));
    }

    #[test]
    fn test_binary_not_found_display() {
        let err = Error::BinaryNotFound {
            program: "netstat",
            path: PathBuf::from("/nonexistent/netstat.exe"),
        };
        assert!(err.to_string().contains("/nonexistent/netstat.exe"));
    }

    #[test]
    fn test_kill_error_hints() {
        let denied = KillError::PermissionDenied { pid: 7 };
        assert!(denied.suggests_elevation());
        assert!(!denied.should_refresh());
        assert_eq!(denied.pid(), 7);

        let gone = KillError::NotFound { pid: 8 };
        assert!(gone.should_refresh());
        assert!(!gone.suggests_elevation());
    }
}
