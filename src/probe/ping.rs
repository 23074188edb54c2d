//! Ping probe implementation using the system `ping` command.

use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

use super::ProbeError;

/// Extra time the ping process gets beyond its own timeout before it is killed.
const PROCESS_GRACE: Duration = Duration::from_secs(1);

/// Run a single ping against the given address.
///
/// Returns the round-trip time reported by `ping`, not the wall-clock time of
/// the process, which would include spawn overhead.
pub async fn run_ping_probe(address: &str, timeout: Duration) -> Result<Duration, ProbeError> {
    let mut command = Command::new("ping");
    command
        .args(ping_args(address, timeout))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout + PROCESS_GRACE, command.output())
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
        .map_err(|e| ProbeError::Command(format!("failed to execute ping: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stderr.contains("timeout")
            || stdout.contains("100% packet loss")
            || stdout.contains("100.0% packet loss")
            || stdout.contains("(100% loss)")
        {
            return Err(ProbeError::Timeout(timeout));
        }
        return Err(ProbeError::Command(format!("ping failed: {}", stdout.trim())));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ping_output(&stdout)
}

/// Arguments for a single echo request with a bounded wait.
fn ping_args(address: &str, timeout: Duration) -> Vec<String> {
    if cfg!(windows) {
        // -w takes milliseconds
        let timeout_ms = timeout.as_millis().max(1);
        vec!["-n".into(), "1".into(), "-w".into(), timeout_ms.to_string(), address.into()]
    } else {
        // -W takes whole seconds, rounded up
        let timeout_secs = timeout.as_millis().div_ceil(1000).max(1);
        vec!["-c".into(), "1".into(), "-W".into(), timeout_secs.to_string(), address.into()]
    }
}

fn millis(ms: f64) -> Duration {
    Duration::from_secs_f64(ms / 1000.0)
}

/// Parse ping command output for latency.
fn parse_ping_output(output: &str) -> Result<Duration, ProbeError> {
    // Pattern 1: Per-packet response "time=X.XXX ms" (Linux, macOS, Windows "time<1ms")
    static RE1: OnceLock<Regex> = OnceLock::new();
    let re1 = RE1.get_or_init(|| Regex::new(r"time[=<](?P<val>[0-9.]+)\s*ms").unwrap());

    if let Some(caps) = re1.captures(output) {
        if let Some(val_match) = caps.name("val") {
            if let Ok(ms) = val_match.as_str().parse::<f64>() {
                return Ok(millis(ms));
            }
        }
    }

    // Pattern 2: Summary line "round-trip min/avg/max/stddev = X/X/X/X ms" (macOS)
    // or "rtt min/avg/max/mdev = X/X/X/X ms" (Linux)
    static RE2: OnceLock<Regex> = OnceLock::new();
    let re2 = RE2.get_or_init(|| {
        Regex::new(
            r"(?:round-trip|rtt)\s+min/avg/max/(?:stddev|mdev)\s*=\s*([0-9.]+)/([0-9.]+)/([0-9.]+)",
        )
        .unwrap()
    });

    if let Some(caps) = re2.captures(output) {
        // Use average (second capture group)
        if let Some(avg_match) = caps.get(2) {
            if let Ok(ms) = avg_match.as_str().parse::<f64>() {
                return Ok(millis(ms));
            }
        }
    }

    // Pattern 3: Summary line "Minimum = 0ms, Maximum = 0ms, Average = 0ms" (Windows)
    static RE3: OnceLock<Regex> = OnceLock::new();
    let re3 = RE3.get_or_init(|| Regex::new(r"Average\s*=\s*(?P<val>[0-9]+)\s*ms").unwrap());

    if let Some(caps) = re3.captures(output) {
        if let Some(val_match) = caps.name("val") {
            if let Ok(ms) = val_match.as_str().parse::<f64>() {
                return Ok(millis(ms));
            }
        }
    }

    Err(ProbeError::Parse(output.trim().to_string()))
}
