//! Parent command - show who started a process.

use anyhow::Result;
use serde_json::json;

pub async fn run(pid: u32, json: bool) -> Result<()> {
    let engine = super::engine().await?;
    let parent = engine.resolve_parent(pid).await;

    if json {
        println!("{}", json!({ "processId": pid, "parentProcessId": parent }));
        return Ok(());
    }

    match parent {
        Some(ppid) => println!("PID {} was started by PID {}", pid, ppid),
        None => println!("Parent of PID {} is unknown (process gone?)", pid),
    }
    Ok(())
}
