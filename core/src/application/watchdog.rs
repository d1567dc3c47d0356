//! Respawn watchdog application service.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    classify_kill_failure, decide, KillReport, PortBinding, RespawnAnomaly, WatchOutcome,
    WatchState,
};
use crate::error::{Error, Result};
use crate::ports::{ParentResolverPort, PortScannerPort, ProcessKillerPort};

/// Default pause between a successful kill and the verification scan.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(800);

/// Default bound on how many processes one parent chase may kill.
pub const DEFAULT_MAX_CHASE_DEPTH: usize = 3;

/// Kills a process and verifies that its port stayed free.
///
/// Every cycle goes through the same steps: resolve the parent, kill,
/// wait for the settle delay, rescan, and compare. Parents are never
/// killed without an explicit [`confirm_and_kill_parent`] call.
///
/// [`confirm_and_kill_parent`]: RespawnWatchdog::confirm_and_kill_parent
pub struct RespawnWatchdog<'a, S, K, P> {
    scanner: &'a S,
    killer: &'a K,
    parents: &'a P,
    settle_delay: Duration,
    max_chase_depth: usize,
}

impl<'a, S, K, P> RespawnWatchdog<'a, S, K, P>
where
    S: PortScannerPort,
    K: ProcessKillerPort,
    P: ParentResolverPort,
{
    pub fn new(scanner: &'a S, killer: &'a K, parents: &'a P) -> Self {
        Self {
            scanner,
            killer,
            parents,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_chase_depth: DEFAULT_MAX_CHASE_DEPTH,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_max_chase_depth(mut self, depth: usize) -> Self {
        self.max_chase_depth = depth;
        self
    }

    /// Kill `pid` and report what happened to the port it held in `before`.
    ///
    /// A failed kill returns a classified [`Error::Kill`] without rescanning.
    pub async fn kill_and_watch(&self, pid: u32, before: &[PortBinding]) -> Result<KillReport> {
        let parent = self.parents.parent_of(pid).await;
        let state = WatchState::capture(pid, before, parent);
        self.run(state, Vec::new()).await
    }

    /// Kill the parent recorded in `anomaly` and watch the same port again.
    ///
    /// The new cycle's chain extends the anomaly's, so a chase never kills
    /// the same pid twice and stops after the configured depth.
    pub async fn confirm_and_kill_parent(&self, anomaly: &RespawnAnomaly) -> Result<KillReport> {
        let Some(target) = anomaly.parent else {
            return Err(Error::NoParentCandidate {
                pid: anomaly.new_pid,
            });
        };

        info!(
            port = anomaly.port,
            parent = target,
            "Killing parent of respawned process"
        );
        let grandparent = self.parents.parent_of(target).await;
        let state = WatchState::chase(anomaly, target, grandparent);
        self.run(state, anomaly.chain.clone()).await
    }

    async fn run(&self, state: WatchState, mut chain: Vec<u32>) -> Result<KillReport> {
        let pid = state.pid;

        if let Err(failure) = self.killer.kill(pid).await {
            let err = classify_kill_failure(pid, &failure);
            warn!(pid = pid, error = %err, "Kill failed");
            return Err(err.into());
        }
        chain.push(pid);

        if !self.settle_delay.is_zero() {
            debug!(pid = pid, delay = ?self.settle_delay, "Waiting for port to settle");
            tokio::time::sleep(self.settle_delay).await;
        }

        let after = self.scanner.scan().await?;
        let outcome = decide(&state, &after, &chain, self.max_chase_depth);

        match &outcome {
            WatchOutcome::Freed { port } => {
                info!(pid = pid, port = ?port, "Process killed");
            }
            WatchOutcome::StillBound { port, pid: holder } => {
                warn!(pid = pid, port = port, holder = holder, "Port still bound after kill");
            }
            WatchOutcome::Respawned(anomaly) => {
                warn!(
                    port = anomaly.port,
                    original_pid = anomaly.original_pid,
                    new_pid = anomaly.new_pid,
                    parent = ?anomaly.parent,
                    "Process respawned"
                );
            }
        }

        Ok(KillReport {
            pid,
            outcome,
            bindings: after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KillStage, Protocol, TerminationFailure};
    use crate::error::KillError;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};

    /// Mock scanner returning queued snapshots, repeating the last one.
    struct MockScanner {
        snapshots: Mutex<VecDeque<Vec<PortBinding>>>,
        scans: Mutex<usize>,
    }

    impl MockScanner {
        fn new(snapshots: Vec<Vec<PortBinding>>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots.into()),
                scans: Mutex::new(0),
            }
        }

        fn scans(&self) -> usize {
            *self.scans.lock()
        }
    }

    impl PortScannerPort for MockScanner {
        async fn scan(&self) -> Result<Vec<PortBinding>> {
            *self.scans.lock() += 1;
            let mut snapshots = self.snapshots.lock();
            if snapshots.len() > 1 {
                Ok(snapshots.pop_front().unwrap_or_default())
            } else {
                Ok(snapshots.front().cloned().unwrap_or_default())
            }
        }
    }

    /// Mock killer recording kills, failing for configured pids.
    #[derive(Default)]
    struct MockKiller {
        killed: Mutex<Vec<u32>>,
        failures: HashMap<u32, String>,
    }

    impl MockKiller {
        fn failing(pid: u32, diagnostic: &str) -> Self {
            Self {
                failures: HashMap::from([(pid, diagnostic.to_string())]),
                ..Default::default()
            }
        }

        fn killed(&self) -> Vec<u32> {
            self.killed.lock().clone()
        }
    }

    impl ProcessKillerPort for MockKiller {
        async fn kill(&self, pid: u32) -> std::result::Result<(), TerminationFailure> {
            if let Some(diagnostic) = self.failures.get(&pid) {
                return Err(TerminationFailure {
                    stage: KillStage::StopProcess,
                    diagnostic: diagnostic.clone(),
                });
            }
            self.killed.lock().push(pid);
            Ok(())
        }
    }

    struct MockParents(HashMap<u32, u32>);

    impl ParentResolverPort for MockParents {
        async fn parent_of(&self, pid: u32) -> Option<u32> {
            self.0.get(&pid).copied()
        }
    }

    fn node(port: u16, pid: u32) -> PortBinding {
        PortBinding::new(port, pid, "node.exe", Protocol::Tcp)
    }

    #[tokio::test]
    async fn test_freed_port() {
        let scanner = MockScanner::new(vec![vec![node(3000, 7)]]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::from([(100, 50)]));
        let watchdog =
            RespawnWatchdog::new(&scanner, &killer, &parents).with_settle_delay(Duration::ZERO);

        let report = tokio_test::assert_ok!(
            watchdog.kill_and_watch(100, &[node(8080, 100), node(3000, 7)]).await
        );
        assert_eq!(report.pid, 100);
        assert_eq!(report.outcome, WatchOutcome::Freed { port: Some(8080) });
        assert_eq!(report.bindings, vec![node(3000, 7)]);
        assert_eq!(killer.killed(), vec![100]);
    }

    #[tokio::test]
    async fn test_respawn_then_parent_chase() {
        // nodemon (50) respawns node on 8080 until it is killed itself.
        let scanner = MockScanner::new(vec![vec![node(8080, 200)], vec![]]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::from([(100, 50), (50, 10)]));
        let watchdog =
            RespawnWatchdog::new(&scanner, &killer, &parents).with_settle_delay(Duration::ZERO);

        let report = watchdog.kill_and_watch(100, &[node(8080, 100)]).await.unwrap();
        let anomaly = match report.outcome {
            WatchOutcome::Respawned(anomaly) => anomaly,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(anomaly.original_pid, 100);
        assert_eq!(anomaly.new_pid, 200);
        assert_eq!(anomaly.parent, Some(50));
        assert_eq!(killer.killed(), vec![100]);

        let report = watchdog.confirm_and_kill_parent(&anomaly).await.unwrap();
        assert_eq!(report.pid, 50);
        assert_eq!(report.outcome, WatchOutcome::Freed { port: Some(8080) });
        assert_eq!(killer.killed(), vec![100, 50]);
    }

    #[tokio::test]
    async fn test_chase_stops_at_depth() {
        // Every kill is followed by a fresh pid on the port.
        let scanner = MockScanner::new(vec![
            vec![node(8080, 200)],
            vec![node(8080, 300)],
            vec![node(8080, 400)],
        ]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::from([(100, 50), (50, 40), (40, 30)]));
        let watchdog = RespawnWatchdog::new(&scanner, &killer, &parents)
            .with_settle_delay(Duration::ZERO)
            .with_max_chase_depth(2);

        let mut outcome = watchdog
            .kill_and_watch(100, &[node(8080, 100)])
            .await
            .unwrap()
            .outcome;
        let mut chased = 0;
        while let WatchOutcome::Respawned(anomaly) = &outcome {
            if anomaly.parent.is_none() {
                break;
            }
            outcome = watchdog
                .confirm_and_kill_parent(anomaly)
                .await
                .unwrap()
                .outcome;
            chased += 1;
        }

        assert_eq!(chased, 2);
        assert_eq!(killer.killed(), vec![100, 50, 40]);
        match outcome {
            WatchOutcome::Respawned(anomaly) => {
                assert_eq!(anomaly.parent, None);
                assert_eq!(anomaly.chain, vec![100, 50, 40]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_kill_failure_skips_rescan() {
        let scanner = MockScanner::new(vec![vec![node(8080, 100)]]);
        let killer = MockKiller::failing(100, "ERROR: Access is denied.");
        let parents = MockParents(HashMap::new());
        let watchdog = RespawnWatchdog::new(&scanner, &killer, &parents);

        let err = tokio_test::assert_err!(watchdog.kill_and_watch(100, &[node(8080, 100)]).await);
        assert!(matches!(
            err,
            Error::Kill(KillError::PermissionDenied { pid: 100 })
        ));
        assert_eq!(scanner.scans(), 0);
    }

    #[tokio::test]
    async fn test_still_bound() {
        let scanner = MockScanner::new(vec![vec![node(8080, 100)]]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::new());
        let watchdog =
            RespawnWatchdog::new(&scanner, &killer, &parents).with_settle_delay(Duration::ZERO);

        let report = watchdog.kill_and_watch(100, &[node(8080, 100)]).await.unwrap();
        assert_eq!(report.outcome, WatchOutcome::StillBound { port: 8080, pid: 100 });
    }

    #[tokio::test]
    async fn test_still_bound_after_chase_names_the_holder() {
        // The parent dies but the respawned child keeps the port.
        let scanner = MockScanner::new(vec![vec![node(8080, 200)]]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::from([(100, 50)]));
        let watchdog =
            RespawnWatchdog::new(&scanner, &killer, &parents).with_settle_delay(Duration::ZERO);

        let report = watchdog.kill_and_watch(100, &[node(8080, 100)]).await.unwrap();
        let anomaly = match report.outcome {
            WatchOutcome::Respawned(anomaly) => anomaly,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let report = watchdog.confirm_and_kill_parent(&anomaly).await.unwrap();
        assert_eq!(report.pid, 50);
        assert_eq!(report.outcome, WatchOutcome::StillBound { port: 8080, pid: 200 });
    }

    #[tokio::test]
    async fn test_chase_without_candidate() {
        let scanner = MockScanner::new(vec![vec![]]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::new());
        let watchdog = RespawnWatchdog::new(&scanner, &killer, &parents);

        let anomaly = RespawnAnomaly {
            port: 8080,
            original_pid: 100,
            new_pid: 200,
            parent: None,
            chain: vec![100],
        };
        let err = tokio_test::assert_err!(watchdog.confirm_and_kill_parent(&anomaly).await);
        assert!(matches!(err, Error::NoParentCandidate { pid: 200 }));
        assert!(killer.killed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_settle_delay() {
        let scanner = MockScanner::new(vec![vec![]]);
        let killer = MockKiller::default();
        let parents = MockParents(HashMap::new());
        let watchdog = RespawnWatchdog::new(&scanner, &killer, &parents);

        let start = tokio::time::Instant::now();
        watchdog.kill_and_watch(100, &[node(8080, 100)]).await.unwrap();
        assert!(start.elapsed() >= DEFAULT_SETTLE_DELAY);
    }
}
