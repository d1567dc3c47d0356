//! Socket table parsing for `netstat -ano`.

use std::collections::HashSet;

use crate::domain::{PortBinding, ProcessTable, Protocol};

/// Token count of a TCP line: proto, local, foreign, state, pid.
const MIN_TCP_TOKENS: usize = 5;

/// Token count of a UDP line, which has no state column.
const MIN_UDP_TOKENS: usize = 4;

/// State token of a listening TCP socket.
const LISTENING: &str = "LISTENING";

/// Parse the output of `netstat -ano` into port bindings.
///
/// Listening TCP sockets and all UDP sockets are kept. Names are joined from
/// `processes`. The result is deduplicated on `(port, protocol)` keeping the
/// first occurrence, and sorted by port.
///
/// Example output:
/// ```text
/// Active Connections
///
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
///   TCP    [::]:445               [::]:0                 LISTENING       4
///   UDP    0.0.0.0:53             *:*                                    5678
/// ```
pub fn parse_netstat_output(output: &str, processes: &ProcessTable) -> Vec<PortBinding> {
    let mut bindings = Vec::new();
    let mut seen: HashSet<(u16, Protocol)> = HashSet::new();

    for line in output.lines() {
        let line = line.trim();

        // Skip empty lines and headers
        if line.is_empty() || line.starts_with("Active") || line.starts_with("Proto") {
            continue;
        }

        let Some((port, pid, protocol)) = parse_socket_line(line) else {
            continue;
        };

        // Deduplicate by (port, protocol)
        if !seen.insert((port, protocol)) {
            continue;
        }

        bindings.push(PortBinding::new(
            port,
            pid,
            processes.name_of(pid),
            protocol,
        ));
    }

    // Stable sort keeps first-seen order within a port
    bindings.sort_by_key(|b| b.port);
    bindings
}

/// Extract `(port, pid, protocol)` from one socket line, if it is of interest.
fn parse_socket_line(line: &str) -> Option<(u16, u32, Protocol)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let protocol = Protocol::from_token(parts.first()?)?;

    match protocol {
        Protocol::Tcp => {
            if parts.len() < MIN_TCP_TOKENS || parts[3] != LISTENING {
                return None;
            }
        }
        Protocol::Udp => {
            if parts.len() < MIN_UDP_TOKENS {
                return None;
            }
        }
    }

    let port = parse_port(parts[1])?;
    let pid: u32 = parts.last()?.parse().ok()?;
    Some((port, pid, protocol))
}

/// Port of a local address, taken after the last colon.
///
/// Handles `0.0.0.0:135`, `[::]:445` and `[fe80::1%12]:5353` alike, since
/// IPv6 hosts contain colons of their own.
fn parse_port(address: &str) -> Option<u16> {
    let colon = address.rfind(':')?;
    address[colon + 1..].parse().ok()
}
