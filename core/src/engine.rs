//! PortReaper engine - the facade front ends talk to.
//!
//! Wires the Windows adapters to one shared command runner and exposes
//! discovery, termination, parent lookup and the respawn-aware kill cycle.
//! The engine keeps no state between calls other than its settings and the
//! elevation hook; every listing is a fresh scan.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::adapters::{
    default_system_root, ParentResolver, PortScanner, ProcessTerminator, SystemCommandRunner,
};
use crate::application::RespawnWatchdog;
use crate::config::{ConfigStore, Settings};
use crate::domain::{classify_kill_failure, KillReport, PortBinding, RespawnAnomaly};
use crate::error::{Error, Result};
use crate::ports::CommandRunner;

/// Callback that relaunches the host application with elevated privileges.
pub type ElevationHook = Box<dyn Fn() + Send + Sync>;

/// The main PortReaper engine.
pub struct PortReaper<R = SystemCommandRunner> {
    scanner: PortScanner<R>,
    terminator: ProcessTerminator<R>,
    parents: ParentResolver<R>,
    settings: Settings,
    elevation_hook: RwLock<Option<ElevationHook>>,
}

impl PortReaper<SystemCommandRunner> {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::from_settings(Settings::default())
    }

    /// Create an engine running the real system commands under `settings`.
    pub fn from_settings(settings: Settings) -> Self {
        let system_root = settings
            .system_root
            .clone()
            .unwrap_or_else(default_system_root);
        let runner = SystemCommandRunner::with_system_root(system_root)
            .with_output_limit(settings.output_limit_bytes);

        Self::with_runner(Arc::new(runner), settings)
    }

    /// Create an engine from the settings in `store`.
    pub async fn load(store: &ConfigStore) -> Result<Self> {
        let settings = store.load().await?;
        Ok(Self::from_settings(settings))
    }
}

impl Default for PortReaper<SystemCommandRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> PortReaper<R> {
    /// Create an engine whose adapters all share `runner`.
    pub fn with_runner(runner: Arc<R>, settings: Settings) -> Self {
        Self {
            scanner: PortScanner::new(runner.clone()),
            terminator: ProcessTerminator::new(runner.clone()),
            parents: ParentResolver::new(runner),
            settings,
            elevation_hook: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Scan listening TCP and bound UDP ports, ascending by port.
    pub async fn list_port_bindings(&self) -> Result<Vec<PortBinding>> {
        self.scanner.scan().await
    }

    /// Parent pid of `pid`, or `None` when it cannot be determined.
    pub async fn resolve_parent(&self, pid: u32) -> Option<u32> {
        self.parents.parent_of(pid).await
    }

    // =========================================================================
    // Termination
    // =========================================================================

    /// Forcefully terminate `pid` and its descendants.
    ///
    /// Returns `Ok(true)` once either kill mechanism reports success. Does
    /// not check whether any port was freed; see [`kill_and_watch`].
    ///
    /// [`kill_and_watch`]: PortReaper::kill_and_watch
    pub async fn terminate_process(&self, pid: u32) -> Result<bool> {
        match self.terminator.kill(pid).await {
            Ok(()) => Ok(true),
            Err(failure) => Err(classify_kill_failure(pid, &failure).into()),
        }
    }

    /// Kill `pid` and verify that the port it held in `snapshot` stayed free.
    pub async fn kill_and_watch(&self, pid: u32, snapshot: &[PortBinding]) -> Result<KillReport> {
        self.watchdog().kill_and_watch(pid, snapshot).await
    }

    /// Kill the parent offered by a respawn anomaly and watch its port again.
    pub async fn confirm_and_kill_parent(&self, anomaly: &RespawnAnomaly) -> Result<KillReport> {
        self.watchdog().confirm_and_kill_parent(anomaly).await
    }

    /// Kill whatever holds `port` and watch for a respawn.
    ///
    /// The first binding on the port in a fresh scan is the target.
    pub async fn kill_port(&self, port: u16) -> Result<KillReport> {
        let bindings = self.scanner.scan().await?;
        let pid = bindings
            .iter()
            .find(|b| b.port == port)
            .map(|b| b.pid)
            .ok_or(Error::PortNotBound(port))?;

        self.kill_and_watch(pid, &bindings).await
    }

    fn watchdog(&self) -> RespawnWatchdog<'_, PortScanner<R>, ProcessTerminator<R>, ParentResolver<R>> {
        RespawnWatchdog::new(&self.scanner, &self.terminator, &self.parents)
            .with_settle_delay(self.settings.settle_delay())
            .with_max_chase_depth(self.settings.max_chase_depth)
    }

    // =========================================================================
    // Elevation
    // =========================================================================

    /// Install the callback used by [`request_elevated_restart`].
    ///
    /// [`request_elevated_restart`]: PortReaper::request_elevated_restart
    pub fn set_elevation_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.elevation_hook.write() = Some(Box::new(hook));
    }

    /// Ask the host application to relaunch with administrator rights.
    ///
    /// Without an installed hook this only logs a warning.
    pub fn request_elevated_restart(&self) {
        match self.elevation_hook.read().as_ref() {
            Some(hook) => {
                info!("Requesting elevated restart");
                hook();
            }
            None => warn!("Elevated restart requested but no elevation hook is installed"),
        }
    }
}
