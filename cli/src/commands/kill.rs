//! Kill command - free a port and chase respawning parents.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use portreaper_core::{Error, KillReport, PortReaper, RespawnAnomaly, WatchOutcome};
use tracing::debug;

/// What to kill.
pub enum Target {
    Port(u16),
    Pid(u32),
}

pub async fn run(target: Target, yes: bool, json: bool) -> Result<()> {
    let engine = super::engine().await?;
    engine.set_elevation_hook(|| {
        eprintln!("Re-run portreaper from an Administrator terminal to kill this process.");
    });

    let first = match target {
        Target::Port(port) => engine.kill_port(port).await,
        Target::Pid(pid) => {
            let snapshot = engine.list_port_bindings().await?;
            engine.kill_and_watch(pid, &snapshot).await
        }
    };
    let mut report = first.map_err(|e| explain(&engine, e))?;

    loop {
        print_report(&report, json)?;

        let anomaly = match &report.outcome {
            WatchOutcome::Freed { .. } => return Ok(()),
            WatchOutcome::StillBound { port, pid } => {
                bail!("Port {} is still held by PID {}", port, pid)
            }
            WatchOutcome::Respawned(anomaly) => anomaly.clone(),
        };

        let Some(parent) = anomaly.parent else {
            bail!(
                "Port {} was taken over by PID {} and there is no parent left to kill",
                anomaly.port,
                anomaly.new_pid
            );
        };

        if !confirm(parent, &anomaly, yes, json)? {
            if !json {
                println!("Left PID {} running. Use --yes to kill it.", parent);
            }
            return Ok(());
        }

        report = engine
            .confirm_and_kill_parent(&anomaly)
            .await
            .map_err(|e| explain(&engine, e))?;
    }
}

fn print_report(report: &KillReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    match &report.outcome {
        WatchOutcome::Freed { port: Some(port) } => {
            println!("✓ Killed PID {}, port {} is free", report.pid, port)
        }
        WatchOutcome::Freed { port: None } => println!("✓ Killed PID {}", report.pid),
        WatchOutcome::StillBound { port, pid } => {
            println!("✗ PID {} still holds port {}", pid, port)
        }
        WatchOutcome::Respawned(anomaly) => println!(
            "! Port {} came back: PID {} → {}",
            anomaly.port, anomaly.original_pid, anomaly.new_pid
        ),
    }
    Ok(())
}

/// Ask before killing a parent; only a terminal can answer.
fn confirm(parent: u32, anomaly: &RespawnAnomaly, yes: bool, json: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if json || !atty::is(atty::Stream::Stdin) || !atty::is(atty::Stream::Stdout) {
        debug!(parent = parent, "Not a terminal, declining parent kill");
        return Ok(false);
    }

    print!(
        "PID {} looks like a supervisor restarting port {}. Kill it too? [y/N] ",
        parent, anomaly.port
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Turn a core error into a user-facing one, running the elevation hook
/// when more privileges would help.
fn explain(engine: &PortReaper, err: Error) -> anyhow::Error {
    if let Error::Kill(kill) = &err {
        if kill.suggests_elevation() {
            engine.request_elevated_restart();
        } else if kill.should_refresh() {
            return anyhow::anyhow!("{}; run `portreaper list` to refresh", kill);
        }
    }
    err.into()
}
