//! Listing filter over port bindings.

use serde::{Deserialize, Serialize};

use super::binding::{PortBinding, UNKNOWN_PROCESS};

/// Image names of core Windows processes hidden from the full listing.
const SYSTEM_PROCESSES: &[&str] = &[
    "svchost.exe",
    "System",
    "Idle",
    "smss.exe",
    "csrss.exe",
    "wininit.exe",
    "services.exe",
    "lsass.exe",
    "winlogon.exe",
    "fontdrvhost.exe",
    "MsMpEng.exe",
    "NisSrv.exe",
    "Memory Compression",
    "Registry",
    "spoolsv.exe",
];

/// Name fragments identifying development servers and runtimes.
const DEV_KEYWORDS: &[&str] = &[
    "node", "python", "java", "php", "httpd", "apache", "nginx", "ruby", "go", "deno", "bun",
    "postgres", "mysql", "mariadb", "redis", "docker", "kubernet", "electron", "react-scripts",
    "vite", "uvicorn", "gunicorn", "dart", "flutter",
];

/// Whether a process name looks like a development server or runtime.
pub fn is_dev_process(process_name: &str) -> bool {
    let name = process_name.to_lowercase();
    DEV_KEYWORDS.iter().any(|k| name.contains(k))
}

/// Whether a process name is a well-known operating-system process.
pub fn is_system_process(process_name: &str) -> bool {
    SYSTEM_PROCESSES.contains(&process_name)
}

/// Filter criteria for port listings.
///
/// A non-empty search text takes precedence over every other criterion.
/// Without one, `dev_only` keeps development processes; otherwise system
/// processes and unresolved names are hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortFilter {
    /// Text matched against process name, port and pid.
    #[serde(default)]
    pub search_text: String,
    /// Only show development processes.
    #[serde(default = "default_true")]
    pub dev_only: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PortFilter {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            dev_only: true,
        }
    }
}

impl PortFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Enable/disable dev-only mode.
    pub fn with_dev_only(mut self, enabled: bool) -> Self {
        self.dev_only = enabled;
        self
    }

    /// Check if a binding passes this filter.
    pub fn matches(&self, binding: &PortBinding) -> bool {
        let query = self.search_text.trim();
        if !query.is_empty() {
            return binding.matches_search(query);
        }
        if self.dev_only {
            return is_dev_process(&binding.process_name);
        }
        !is_system_process(&binding.process_name) && binding.process_name != UNKNOWN_PROCESS
    }
}

/// Apply a filter to a list of bindings, preserving order.
pub fn filter_bindings(bindings: &[PortBinding], filter: &PortFilter) -> Vec<PortBinding> {
    bindings
        .iter()
        .filter(|b| filter.matches(b))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;

    fn sample() -> Vec<PortBinding> {
        vec![
            PortBinding::new(135, 1020, "svchost.exe", Protocol::Tcp),
            PortBinding::new(3000, 1234, "node.exe", Protocol::Tcp),
            PortBinding::new(5353, 77, "Unknown", Protocol::Udp),
            PortBinding::new(6379, 88, "redis-server.exe", Protocol::Tcp),
            PortBinding::new(9000, 99, "steam.exe", Protocol::Tcp),
        ]
    }

    #[test]
    fn test_dev_only_default() {
        let result = filter_bindings(&sample(), &PortFilter::new());
        let ports: Vec<u16> = result.iter().map(|b| b.port).collect();
        assert_eq!(ports, vec![3000, 6379]);
    }

    #[test]
    fn test_full_listing_hides_system_and_unknown() {
        let filter = PortFilter::new().with_dev_only(false);
        let result = filter_bindings(&sample(), &filter);
        let ports: Vec<u16> = result.iter().map(|b| b.port).collect();
        assert_eq!(ports, vec![3000, 6379, 9000]);
    }

    #[test]
    fn test_search_overrides_other_criteria() {
        let filter = PortFilter::new().with_search("svchost");
        let result = filter_bindings(&sample(), &filter);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].pid, 1020);

        let filter = PortFilter::new().with_search("  ").with_dev_only(true);
        assert_eq!(filter_bindings(&sample(), &filter).len(), 2);
    }

    #[test]
    fn test_process_predicates() {
        assert!(is_dev_process("Python.exe"));
        assert!(!is_dev_process("explorer.exe"));
        assert!(is_system_process("lsass.exe"));
        assert!(!is_system_process("LSASS.EXE"));
    }
}
