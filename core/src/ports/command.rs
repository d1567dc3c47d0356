//! Command runner port (interface).

use crate::error::Result;

/// System binaries this crate is allowed to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemBinary {
    Netstat,
    Tasklist,
    Taskkill,
    PowerShell,
}

impl SystemBinary {
    /// Program name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            SystemBinary::Netstat => "netstat",
            SystemBinary::Tasklist => "tasklist",
            SystemBinary::Taskkill => "taskkill",
            SystemBinary::PowerShell => "powershell",
        }
    }
}

impl std::fmt::Display for SystemBinary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Port for running external commands.
///
/// Every interaction with the operating system goes through this trait, so
/// the rest of the crate can be exercised against scripted output.
pub trait CommandRunner: Send + Sync {
    /// Run `binary` with `args` to completion and return its stdout.
    ///
    /// A non-zero exit status is an error carrying the command's diagnostic text.
    fn run(
        &self,
        binary: SystemBinary,
        args: &[&str],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
