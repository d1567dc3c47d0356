//! List command - show listening ports.

use anyhow::Result;
use chrono::Local;
use portreaper_core::{filter_bindings, PortBinding, PortFilter};
use tracing::debug;

pub async fn run(
    port_filter: Option<u16>,
    name_filter: Option<String>,
    all: bool,
    json: bool,
) -> Result<()> {
    let engine = super::engine().await?;
    let bindings = engine.list_port_bindings().await?;

    let ports = select(&bindings, port_filter, name_filter.as_deref(), all);
    debug!(scanned = bindings.len(), shown = ports.len(), "Listing ports");

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No listening ports found.");
        if !all {
            println!("Use --all to include non-development processes.");
        }
        return Ok(());
    }

    // Table header
    println!("{:<6} {:<6} {:<8} PROCESS", "PORT", "PROTO", "PID");
    println!("{}", "-".repeat(50));

    for binding in &ports {
        println!(
            "{:<6} {:<6} {:<8} {}",
            binding.port,
            binding.protocol,
            binding.pid,
            truncate(&binding.process_name, 30)
        );
    }

    println!(
        "\nTotal: {} of {} ports (scanned {})",
        ports.len(),
        bindings.len(),
        Local::now().format("%H:%M:%S")
    );
    Ok(())
}

/// Pick the bindings to show.
///
/// `--port` and `--all` bypass the dev-only and system-process filters.
/// A name search applies in every mode.
fn select(
    bindings: &[PortBinding],
    port: Option<u16>,
    name: Option<&str>,
    all: bool,
) -> Vec<PortBinding> {
    let query = name.map(str::trim).unwrap_or_default();

    let mut ports = if all || port.is_some() {
        bindings
            .iter()
            .filter(|b| b.matches_search(query))
            .cloned()
            .collect()
    } else {
        filter_bindings(bindings, &PortFilter::new().with_search(query))
    };

    if let Some(p) = port {
        ports.retain(|binding| binding.port == p);
    }
    ports
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
