//! Process table loader using `tasklist /NH /FO CSV`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ProcessTable;
use crate::ports::{CommandRunner, SystemBinary};

/// Loads pid → image name snapshots from `tasklist`.
pub struct TasklistLoader<R> {
    runner: Arc<R>,
}

impl<R: CommandRunner> TasklistLoader<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    /// Take a process table snapshot.
    ///
    /// A failed listing degrades to an empty table so that names resolve to
    /// `"Unknown"` instead of failing the whole scan.
    pub async fn snapshot(&self) -> ProcessTable {
        match self
            .runner
            .run(SystemBinary::Tasklist, &["/NH", "/FO", "CSV"])
            .await
        {
            Ok(output) => {
                let table = parse_tasklist_output(&output);
                debug!(processes = table.len(), "Loaded process table");
                table
            }
            Err(e) => {
                warn!(error = %e, "Process listing failed, names will be unknown");
                ProcessTable::new()
            }
        }
    }
}

/// Parse `tasklist /FO CSV` output into a process table.
///
/// Example output (`/NH` omits the header, which is skipped anyway):
/// ```text
/// "Image Name","PID","Session Name","Session#","Mem Usage"
/// "System Idle Process","0","Services","0","8 K"
/// "node.exe","5432","Console","1","45,000 K"
/// ```
pub fn parse_tasklist_output(output: &str) -> ProcessTable {
    let mut table = ProcessTable::new();

    for line in output.lines() {
        let line = line.trim();

        // Skip empty lines and header
        if line.is_empty() || line.starts_with("\"Image Name\"") {
            continue;
        }

        let fields = parse_csv_line(line);
        if fields.len() < 2 {
            continue;
        }

        let pid: u32 = match fields[1].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };

        table.insert(pid, fields[0]);
    }

    table
}

/// Parse a CSV line, handling quoted fields
fn parse_csv_line(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut field_start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        match c {
            '"' => {
                if in_quotes {
                    // End of quoted field
                    if let Some(start) = field_start {
                        fields.push(&line[start..i]);
                    }
                    field_start = None;
                    in_quotes = false;
                } else {
                    // Start of quoted field
                    in_quotes = true;
                    field_start = Some(i + 1);
                }
            }
            ',' if !in_quotes => {
                // Field separator outside quotes
                if let Some(start) = field_start.take() {
                    fields.push(&line[start..i]);
                }
            }
            _ => {
                if field_start.is_none() && !in_quotes {
                    field_start = Some(i);
                }
            }
        }
    }

    // Handle last field if not in quotes
    if let Some(start) = field_start {
        if !in_quotes {
            fields.push(&line[start..]);
        }
    }

    fields
}
