//! Command runner backed by real system binaries.
//!
//! Binaries are always executed from absolute paths under the Windows system
//! root. `PATH` is never consulted: a packaged or sandboxed host may strip or
//! rewrite it, and a missing binary must surface as an error instead of
//! resolving to something else.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::{CommandRunner, SystemBinary};

/// Default ceiling for captured output per stream (10 MiB).
pub const DEFAULT_OUTPUT_LIMIT: usize = 10 * 1024 * 1024;

/// System root used when neither settings nor the environment name one.
const FALLBACK_SYSTEM_ROOT: &str = r"C:\Windows";

/// The system root from the `SystemRoot` environment variable, or `C:\Windows`.
pub fn default_system_root() -> PathBuf {
    std::env::var_os("SystemRoot")
        .filter(|root| !root.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_SYSTEM_ROOT))
}

/// Runs system binaries through `tokio::process`.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    system_root: PathBuf,
    output_limit: usize,
}

impl SystemCommandRunner {
    /// Create a runner for the default system root.
    pub fn new() -> Self {
        Self::with_system_root(default_system_root())
    }

    /// Create a runner for a custom system root.
    pub fn with_system_root(system_root: impl Into<PathBuf>) -> Self {
        Self {
            system_root: system_root.into(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }

    /// Set the per-stream output ceiling in bytes.
    pub fn with_output_limit(mut self, output_limit: usize) -> Self {
        self.output_limit = output_limit;
        self
    }

    pub fn system_root(&self) -> &Path {
        &self.system_root
    }

    /// Expected absolute location of `binary`.
    pub fn binary_path(&self, binary: SystemBinary) -> PathBuf {
        let system32 = self.system_root.join("System32");
        match binary {
            SystemBinary::PowerShell => system32
                .join("WindowsPowerShell")
                .join("v1.0")
                .join("powershell.exe"),
            other => system32.join(format!("{}.exe", other.name())),
        }
    }

    /// Absolute location of `binary`, verified to exist.
    pub fn resolve(&self, binary: SystemBinary) -> Result<PathBuf> {
        let path = self.binary_path(binary);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::BinaryNotFound {
                program: binary.name(),
                path,
            })
        }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemCommandRunner {
    async fn run(&self, binary: SystemBinary, args: &[&str]) -> Result<String> {
        let path = self.resolve(binary)?;
        debug!(program = binary.name(), ?args, "Running command");

        let mut child = Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr was not captured"))?;

        let limit = self.output_limit;
        let (stdout, stderr, status) = tokio::join!(
            read_capped(stdout, limit),
            read_capped(stderr, limit),
            child.wait()
        );
        let (stdout, stdout_overflow) = stdout?;
        let (stderr, _) = stderr?;
        let status = status?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
            // taskkill reports some failures on stdout only.
            let diagnostic = if stderr.is_empty() {
                String::from_utf8_lossy(&stdout).trim().to_string()
            } else {
                stderr
            };
            debug!(program = binary.name(), %status, diagnostic = %diagnostic, "Command failed");
            return Err(Error::CommandFailed {
                program: binary.name(),
                status: status.to_string(),
                stderr: diagnostic,
            });
        }

        if stdout_overflow {
            return Err(Error::OutputTooLarge {
                program: binary.name(),
                limit,
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Read at most `limit` bytes, draining and discarding the rest.
///
/// Returns the captured bytes and whether anything was discarded. The stream
/// is always read to the end so the child never blocks on a full pipe.
async fn read_capped<R>(reader: R, limit: usize) -> io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(limit as u64 + 1);
    limited.read_to_end(&mut buf).await?;

    let overflow = buf.len() > limit;
    if overflow {
        buf.truncate(limit);
        let mut rest = limited.into_inner();
        tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
    }
    Ok((buf, overflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_binary_paths() {
        let runner = SystemCommandRunner::with_system_root("/win");
        assert_eq!(
            runner.binary_path(SystemBinary::Netstat),
            Path::new("/win").join("System32").join("netstat.exe")
        );
        assert_eq!(
            runner.binary_path(SystemBinary::PowerShell),
            Path::new("/win")
                .join("System32")
                .join("WindowsPowerShell")
                .join("v1.0")
                .join("powershell.exe")
        );
    }

    #[tokio::test]
    async fn test_missing_binary_fails_loudly() {
        let dir = tempdir().unwrap();
        let runner = SystemCommandRunner::with_system_root(dir.path());

        let err = runner.run(SystemBinary::Tasklist, &["/NH"]).await.unwrap_err();
        match err {
            Error::BinaryNotFound { program, path } => {
                assert_eq!(program, "tasklist");
                assert!(path.starts_with(dir.path()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_capped() {
        let (buf, overflow) = read_capped(&b"hello world"[..], 5).await.unwrap();
        assert_eq!(buf, b"hello");
        assert!(overflow);

        let (buf, overflow) = read_capped(&b"hello"[..], 5).await.unwrap();
        assert_eq!(buf, b"hello");
        assert!(!overflow);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_scripted_binaries() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let system32 = dir.path().join("System32");
        std::fs::create_dir_all(&system32).unwrap();

        let scripts = [
            ("netstat.exe", "#!/bin/sh\necho \"TCP 127.0.0.1:3000 0.0.0.0:0 LISTENING $2\"\n"),
            ("taskkill.exe", "#!/bin/sh\necho 'ERROR: Access is denied.' >&2\nexit 1\n"),
            ("tasklist.exe", "#!/bin/sh\nprintf '%0200d' 0\n"),
        ];
        for (name, body) in scripts {
            let path = system32.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let runner = SystemCommandRunner::with_system_root(dir.path()).with_output_limit(64);

        let out = runner
            .run(SystemBinary::Netstat, &["-ano", "1234"])
            .await
            .unwrap();
        assert_eq!(out.trim(), "TCP 127.0.0.1:3000 0.0.0.0:0 LISTENING 1234");

        match runner.run(SystemBinary::Taskkill, &["/PID", "1"]).await {
            Err(Error::CommandFailed { program, stderr, .. }) => {
                assert_eq!(program, "taskkill");
                assert_eq!(stderr, "ERROR: Access is denied.");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        match runner.run(SystemBinary::Tasklist, &[]).await {
            Err(Error::OutputTooLarge { program, limit }) => {
                assert_eq!(program, "tasklist");
                assert_eq!(limit, 64);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
