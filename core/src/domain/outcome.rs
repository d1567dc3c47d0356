//! Respawn decision models.

use serde::{Deserialize, Serialize};

use super::binding::PortBinding;

/// Pid of the idle/root pseudo-process; never a meaningful parent.
pub const ROOT_PID: u32 = 0;

/// State captured when a kill is issued, consumed once by [`decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchState {
    /// The pid being killed.
    pub pid: u32,
    /// Port to re-check after the kill.
    pub port: Option<u16>,
    /// Pid holding `port` when the kill was issued.
    pub holder: u32,
    /// Parent of `pid`, resolved before the kill.
    pub parent: Option<u32>,
}

impl WatchState {
    /// Capture the watch state for `pid` from a pre-kill snapshot.
    pub fn capture(pid: u32, before: &[PortBinding], parent: Option<u32>) -> Self {
        Self {
            pid,
            port: before.iter().find(|b| b.pid == pid).map(|b| b.port),
            holder: pid,
            parent,
        }
    }

    /// Capture the watch state for killing the parent behind `anomaly`.
    ///
    /// The parent usually holds no port itself; the port to watch is the one
    /// its respawned child took over.
    pub fn chase(anomaly: &RespawnAnomaly, pid: u32, parent: Option<u32>) -> Self {
        Self {
            pid,
            port: Some(anomaly.port),
            holder: anomaly.new_pid,
            parent,
        }
    }
}

/// A process that came back on the same port under a new pid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespawnAnomaly {
    pub port: u16,
    /// Pid that held the port before the kill.
    pub original_pid: u32,
    pub new_pid: u32,
    /// Parent worth killing instead, if any is left to chase.
    pub parent: Option<u32>,
    /// Pids already killed in this chase, oldest first.
    pub chain: Vec<u32>,
}

/// What the post-kill scan revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WatchOutcome {
    /// Nothing holds the port anymore, or the pid held no known port.
    Freed { port: Option<u16> },
    /// The pid that held the port still holds it; the kill silently failed.
    StillBound { port: u16, pid: u32 },
    /// Another pid took the port over.
    Respawned(RespawnAnomaly),
}

impl WatchOutcome {
    /// Whether the kill achieved its goal of freeing the port.
    pub fn is_success(&self) -> bool {
        matches!(self, WatchOutcome::Freed { .. })
    }
}

/// Result of one kill-and-watch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillReport {
    /// The pid that was killed.
    pub pid: u32,
    pub outcome: WatchOutcome,
    /// Post-kill snapshot, for refreshing the caller's view.
    pub bindings: Vec<PortBinding>,
}

/// Compare the post-kill snapshot against the captured state.
///
/// `chain` lists the pids killed so far in this chase, including
/// `state.pid`. A parent is offered only while `chain` holds no more than
/// `max_chase_depth` entries.
pub fn decide(
    state: &WatchState,
    after: &[PortBinding],
    chain: &[u32],
    max_chase_depth: usize,
) -> WatchOutcome {
    let Some(port) = state.port else {
        return WatchOutcome::Freed { port: None };
    };

    match after.iter().find(|b| b.port == port) {
        None => WatchOutcome::Freed { port: Some(port) },
        Some(occupant) if occupant.pid == state.holder => WatchOutcome::StillBound {
            port,
            pid: occupant.pid,
        },
        Some(occupant) => {
            let parent = state.parent.filter(|&ppid| {
                ppid != ROOT_PID
                    && ppid != occupant.pid
                    && !chain.contains(&ppid)
                    && chain.len() <= max_chase_depth
            });
            WatchOutcome::Respawned(RespawnAnomaly {
                port,
                original_pid: state.holder,
                new_pid: occupant.pid,
                parent,
                chain: chain.to_vec(),
            })
        }
    }
}
