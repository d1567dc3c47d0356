//! Scripted command runner for adapter tests.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::ports::{CommandRunner, SystemBinary};

#[derive(Debug, Clone)]
enum Reply {
    Stdout(String),
    Failure(String),
    Missing,
}

/// Replays queued replies per binary, in call order.
///
/// The last queued reply for a binary is repeated once the queue runs dry.
/// Binaries without any reply fail as if the command had exited non-zero.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    replies: Mutex<HashMap<SystemBinary, VecDeque<Reply>>>,
    calls: Mutex<Vec<(SystemBinary, Vec<String>)>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub(crate) fn ok(self, binary: SystemBinary, stdout: impl Into<String>) -> Self {
        self.push(binary, Reply::Stdout(stdout.into()))
    }

    /// Queue a failing reply carrying `diagnostic`.
    pub(crate) fn fail(self, binary: SystemBinary, diagnostic: impl Into<String>) -> Self {
        self.push(binary, Reply::Failure(diagnostic.into()))
    }

    /// Make `binary` behave as if it were absent from the system root.
    pub(crate) fn missing(self, binary: SystemBinary) -> Self {
        self.push(binary, Reply::Missing)
    }

    fn push(self, binary: SystemBinary, reply: Reply) -> Self {
        self.replies.lock().entry(binary).or_default().push_back(reply);
        self
    }

    /// Every invocation so far, in order.
    pub(crate) fn calls(&self) -> Vec<(SystemBinary, Vec<String>)> {
        self.calls.lock().clone()
    }

    /// Invocations of one binary, as joined argument strings.
    pub(crate) fn calls_to(&self, binary: SystemBinary) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(b, _)| *b == binary)
            .map(|(_, args)| args.join(" "))
            .collect()
    }

    fn next_reply(&self, binary: SystemBinary) -> Option<Reply> {
        let mut replies = self.replies.lock();
        let queue = replies.get_mut(&binary)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, binary: SystemBinary, args: &[&str]) -> Result<String> {
        self.calls
            .lock()
            .push((binary, args.iter().map(|a| a.to_string()).collect()));

        match self.next_reply(binary) {
            Some(Reply::Stdout(stdout)) => Ok(stdout),
            Some(Reply::Failure(diagnostic)) => Err(Error::CommandFailed {
                program: binary.name(),
                status: "exit code: 1".to_string(),
                stderr: diagnostic,
            }),
            Some(Reply::Missing) => Err(Error::BinaryNotFound {
                program: binary.name(),
                path: format!(r"C:\Windows\System32\{}.exe", binary.name()).into(),
            }),
            None => Err(Error::CommandFailed {
                program: binary.name(),
                status: "exit code: 1".to_string(),
                stderr: format!("no reply scripted for {}", binary),
            }),
        }
    }
}
