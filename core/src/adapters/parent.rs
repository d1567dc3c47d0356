//! Parent resolver using a CIM query through PowerShell.

use std::sync::Arc;

use tracing::debug;

use crate::ports::{CommandRunner, ParentResolverPort, SystemBinary};

/// Looks up parent pids from `Win32_Process`.
pub struct ParentResolver<R> {
    runner: Arc<R>,
}

impl<R: CommandRunner> ParentResolver<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    /// Parent pid of `pid`.
    ///
    /// Query errors and empty or non-numeric answers all mean "no known
    /// parent"; the process may simply be gone already.
    pub async fn parent_of(&self, pid: u32) -> Option<u32> {
        let script = format!(
            "(Get-CimInstance Win32_Process -Filter 'ProcessId = {}').ParentProcessId",
            pid
        );

        match self
            .runner
            .run(SystemBinary::PowerShell, &["-NoProfile", "-Command", script.as_str()])
            .await
        {
            Ok(output) => {
                let parent = parse_parent_pid(&output);
                debug!(pid = pid, parent = ?parent, "Resolved parent");
                parent
            }
            Err(e) => {
                debug!(pid = pid, error = %e, "Parent lookup failed");
                None
            }
        }
    }
}

impl<R: CommandRunner> ParentResolverPort for ParentResolver<R> {
    async fn parent_of(&self, pid: u32) -> Option<u32> {
        ParentResolver::parent_of(self, pid).await
    }
}

/// Parse the single-number answer of the CIM query.
fn parse_parent_pid(output: &str) -> Option<u32> {
    output.trim().parse().ok()
}
