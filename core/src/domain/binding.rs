//! Port binding and process table domain models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name reported for a pid the process table could not resolve.
pub const UNKNOWN_PROCESS: &str = "Unknown";

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a bound socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl Protocol {
    /// Parse the protocol column of a socket listing (`TCP` / `UDP`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TCP" => Some(Protocol::Tcp),
            "UDP" => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PortBinding
// ============================================================================

/// A port and protocol held by an operating-system process.
///
/// A scan never returns two bindings with the same `(port, protocol)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    /// The port number (e.g., 3000, 8080).
    pub port: u16,
    /// Process ID of the owning process.
    #[serde(rename = "processId")]
    pub pid: u32,
    /// Image name of the owning process, or `"Unknown"`.
    pub process_name: String,
    /// Socket protocol.
    pub protocol: Protocol,
}

impl PortBinding {
    pub fn new(port: u16, pid: u32, process_name: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            port,
            pid,
            process_name: process_name.into(),
            protocol,
        }
    }

    /// Deduplication key of this binding.
    pub fn key(&self) -> (u16, Protocol) {
        (self.port, self.protocol)
    }

    /// Whether the process name could not be resolved.
    pub fn is_unknown(&self) -> bool {
        self.process_name == UNKNOWN_PROCESS
    }

    /// Check if this binding matches a search query.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        self.process_name.to_lowercase().contains(&query_lower)
            || self.port.to_string().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
    }
}

impl std::fmt::Display for PortBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} (PID: {}, Process: {})",
            self.protocol, self.port, self.pid, self.process_name
        )
    }
}

// ============================================================================
// ProcessTable
// ============================================================================

/// Snapshot of running processes keyed by pid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTable {
    names: HashMap<u32, String>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a process. A later record for the same pid replaces the earlier one.
    pub fn insert(&mut self, pid: u32, name: impl Into<String>) {
        self.names.insert(pid, name.into());
    }

    pub fn get(&self, pid: u32) -> Option<&str> {
        self.names.get(&pid).map(String::as_str)
    }

    /// Resolve a pid to its name, falling back to `"Unknown"`.
    pub fn name_of(&self, pid: u32) -> &str {
        self.get(pid).unwrap_or(UNKNOWN_PROCESS)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(u32, String)> for ProcessTable {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        let mut table = ProcessTable::new();
        for (pid, name) in iter {
            table.insert(pid, name);
        }
        table
    }
}
