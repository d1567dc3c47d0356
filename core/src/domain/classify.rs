//! Classification of kill failures from diagnostic text.
//!
//! The terminating tools report failures only as human-readable text, so the
//! category is recovered by pattern matching. Every pattern lives in
//! [`KILL_FAILURE_PATTERNS`]; extend the table when a locale or tool version
//! words its messages differently.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KillError;

/// Maximum number of characters of raw diagnostic kept for display.
pub const DIAGNOSTIC_DISPLAY_LIMIT: usize = 60;

/// Which termination mechanism produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KillStage {
    /// Forceful process-tree termination (`taskkill /F /T`).
    TreeKill,
    /// Forceful single-process termination (`Stop-Process -Force`).
    StopProcess,
}

impl std::fmt::Display for KillStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KillStage::TreeKill => f.write_str("tree kill"),
            KillStage::StopProcess => f.write_str("stop process"),
        }
    }
}

/// Unclassified failure of the last kill mechanism tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationFailure {
    pub stage: KillStage,
    pub diagnostic: String,
}

/// Category a diagnostic pattern maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PermissionDenied,
    NotFound,
}

/// Ordered pattern table. The first matching row decides.
pub const KILL_FAILURE_PATTERNS: &[(&str, FailureKind)] = &[
    (r"(?i)access is denied", FailureKind::PermissionDenied),
    (r"(?i)access denied", FailureKind::PermissionDenied),
    (r"(?i)permission denied", FailureKind::PermissionDenied),
    (r"(?i)not found", FailureKind::NotFound),
    (r"(?i)cannot find a process", FailureKind::NotFound),
    (r"(?i)no process", FailureKind::NotFound),
];

fn compiled_patterns() -> &'static [(Regex, FailureKind)] {
    static PATTERNS: OnceLock<Vec<(Regex, FailureKind)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        KILL_FAILURE_PATTERNS
            .iter()
            .filter_map(|(pattern, kind)| Regex::new(pattern).ok().map(|re| (re, *kind)))
            .collect()
    })
}

/// Map a diagnostic message to its failure category, if any row matches.
pub fn failure_kind(diagnostic: &str) -> Option<FailureKind> {
    compiled_patterns()
        .iter()
        .find(|(re, _)| re.is_match(diagnostic))
        .map(|(_, kind)| *kind)
}

/// Classify the final failure of a kill request for `pid`.
pub fn classify_kill_failure(pid: u32, failure: &TerminationFailure) -> KillError {
    match failure_kind(&failure.diagnostic) {
        Some(FailureKind::PermissionDenied) => KillError::PermissionDenied { pid },
        Some(FailureKind::NotFound) => KillError::NotFound { pid },
        None => KillError::Failed {
            pid,
            stage: failure.stage,
            message: truncate_diagnostic(&failure.diagnostic, DIAGNOSTIC_DISPLAY_LIMIT),
        },
    }
}

/// Shorten a diagnostic to `max` characters, marking the cut with an ellipsis.
pub fn truncate_diagnostic(diagnostic: &str, max: usize) -> String {
    let trimmed = diagnostic.trim();
    match trimmed.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
