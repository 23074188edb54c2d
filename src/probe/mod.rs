//! Probe module for endpoint monitoring.
//!
//! Supports HTTP and ICMP (ping) probes.

mod http;
mod ping;

pub use http::*;
pub use ping::*;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("command failed: {0}")]
    Command(String),
    #[error("failed to parse ping output: {0}")]
    Parse(String),
    #[error("unknown probe type: {0}")]
    UnknownKind(String),
}

/// Supported probe kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Http,
    Icmp,
}

impl FromStr for ProbeKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(ProbeKind::Http),
            "icmp" => Ok(ProbeKind::Icmp),
            other => Err(ProbeError::UnknownKind(other.to_string())),
        }
    }
}

/// A monitored endpoint, immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Stable position in the checks file, used as the key into all per-endpoint storage.
    pub index: usize,
    pub name: String,
    /// Probe type as written in the checks file. Parsed lazily so an
    /// unsupported type can still be shown in the table.
    pub probe_type: String,
    pub destination: String,
    pub repeat: Duration,
}

impl Endpoint {
    pub fn kind(&self) -> Result<ProbeKind, ProbeError> {
        self.probe_type.parse()
    }
}

/// The result of one probe execution.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub endpoint: Arc<Endpoint>,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    /// Measured round-trip time, or wall-clock elapsed when no RTT is available.
    pub duration: Duration,
    /// Execution number for this endpoint, assigned when the outcome is
    /// recorded. Mirrors the endpoint's execution count at that moment.
    pub sequence: u64,
}

impl Outcome {
    pub fn new(
        endpoint: Arc<Endpoint>,
        success: bool,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            endpoint,
            success,
            started_at,
            duration,
            sequence: 0,
        }
    }
}

/// Something that can run one check against an endpoint.
///
/// Implementations never fail: every error is folded into an unsuccessful [`Outcome`].
pub trait Prober: Send + Sync {
    fn probe(&self, endpoint: &Arc<Endpoint>) -> impl Future<Output = Outcome> + Send;
}

/// The production prober, dispatching on the endpoint's probe kind.
#[derive(Debug, Clone)]
pub struct Executor {
    http: reqwest::Client,
    icmp_timeout: Duration,
}

impl Executor {
    pub fn new(http_timeout: Duration, icmp_timeout: Duration) -> Result<Self, ProbeError> {
        Ok(Self {
            http: build_http_client(http_timeout)?,
            icmp_timeout,
        })
    }
}

impl Prober for Executor {
    async fn probe(&self, endpoint: &Arc<Endpoint>) -> Outcome {
        let started_at = Utc::now();
        let start = Instant::now();

        let result = match endpoint.kind() {
            Ok(ProbeKind::Http) => run_http_probe(&self.http, &endpoint.destination)
                .await
                .map(|()| start.elapsed()),
            Ok(ProbeKind::Icmp) => run_ping_probe(&endpoint.destination, self.icmp_timeout).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(duration) => Outcome::new(endpoint.clone(), true, started_at, duration),
            Err(e) => {
                tracing::debug!("Probe failed for {}: {}", endpoint.name, e);
                Outcome::new(endpoint.clone(), false, started_at, start.elapsed())
            }
        }
    }
}
