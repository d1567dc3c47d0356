//! Port scanner adapter.
//!
//! Joins the socket table from `netstat -ano` with the process table from
//! `tasklist`. Both listings are fetched concurrently on every scan.

mod netstat;
mod tasklist;

use std::sync::Arc;

use tracing::debug;

use crate::domain::PortBinding;
use crate::error::Result;
use crate::ports::{CommandRunner, PortScannerPort, SystemBinary};

pub use netstat::parse_netstat_output;
pub use tasklist::{parse_tasklist_output, TasklistLoader};

/// The port scanner backed by `netstat` and `tasklist`.
pub struct PortScanner<R> {
    runner: Arc<R>,
    processes: TasklistLoader<R>,
}

impl<R: CommandRunner> PortScanner<R> {
    /// Create a scanner running its commands through `runner`.
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            processes: TasklistLoader::new(runner.clone()),
            runner,
        }
    }

    /// Scan listening TCP and bound UDP sockets.
    ///
    /// A failed socket listing fails the scan; a failed process listing only
    /// leaves names unresolved.
    pub async fn scan(&self) -> Result<Vec<PortBinding>> {
        let (sockets, processes) = tokio::join!(
            self.runner.run(SystemBinary::Netstat, &["-ano"]),
            self.processes.snapshot()
        );
        let sockets = sockets?;

        let bindings = parse_netstat_output(&sockets, &processes);
        debug!(bindings = bindings.len(), "Scan complete");
        Ok(bindings)
    }
}

impl<R: CommandRunner> PortScannerPort for PortScanner<R> {
    async fn scan(&self) -> Result<Vec<PortBinding>> {
        PortScanner::scan(self).await
    }
}
