//! Process terminator using `taskkill` with a PowerShell fallback.
//!
//! Uses the following system commands:
//! - `taskkill /PID xxx /F /T` to force-kill the process and its descendants
//! - `Stop-Process -Id xxx -Force` when taskkill fails for any reason

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{KillStage, TerminationFailure};
use crate::error::Error;
use crate::ports::{CommandRunner, ProcessKillerPort, SystemBinary};

/// Two-stage forceful terminator.
pub struct ProcessTerminator<R> {
    runner: Arc<R>,
}

impl<R: CommandRunner> ProcessTerminator<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    /// Terminate `pid`, trying the tree kill first and `Stop-Process` second.
    ///
    /// Returns as soon as one mechanism reports success; it does not wait for
    /// the process to exit. When both fail, the fallback's diagnostic is
    /// returned unchanged. When PowerShell cannot be found, the failure is
    /// the tree kill's.
    pub async fn kill(&self, pid: u32) -> Result<(), TerminationFailure> {
        debug!(pid = pid, "Killing process tree");
        let pid_arg = pid.to_string();

        let primary = match self
            .runner
            .run(SystemBinary::Taskkill, &["/PID", pid_arg.as_str(), "/F", "/T"])
            .await
        {
            Ok(_) => {
                debug!(pid = pid, "taskkill succeeded");
                return Ok(());
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "taskkill failed, trying Stop-Process");
                e
            }
        };

        let script = format!("Stop-Process -Id {} -Force", pid);
        match self
            .runner
            .run(SystemBinary::PowerShell, &["-NoProfile", "-Command", script.as_str()])
            .await
        {
            Ok(_) => {
                debug!(pid = pid, "Stop-Process succeeded");
                Ok(())
            }
            // The fallback never ran, so the tree kill's diagnostic is the real one.
            Err(e @ Error::BinaryNotFound { .. }) => {
                warn!(pid = pid, error = %e, "Stop-Process unavailable");
                Err(TerminationFailure {
                    stage: KillStage::TreeKill,
                    diagnostic: primary.diagnostic(),
                })
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "Stop-Process failed");
                Err(TerminationFailure {
                    stage: KillStage::StopProcess,
                    diagnostic: e.diagnostic(),
                })
            }
        }
    }
}

impl<R: CommandRunner> ProcessKillerPort for ProcessTerminator<R> {
    async fn kill(&self, pid: u32) -> Result<(), TerminationFailure> {
        ProcessTerminator::kill(self, pid).await
    }
}
