//! Rolling per-endpoint statistics.
//!
//! Each endpoint owns one slot behind its own lock, so recording for one
//! endpoint never contends with or corrupts another.

mod window;

pub use window::*;

use crate::probe::{Endpoint, Outcome};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Depth of the short latency window.
pub const SHORT_WINDOW: usize = 10;
/// Depth of the long latency window.
pub const LONG_WINDOW: usize = 100;
/// Depth of the pass/fail history.
pub const HISTORY_WINDOW: usize = 50;

/// Stat store error types.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("no endpoint with index {0}")]
    UnknownEndpoint(usize),
}

/// Aggregated state for one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointStats {
    pub last_10: RollingWindow<Duration>,
    pub last_100: RollingWindow<Duration>,
    pub last_50: RollingWindow<bool>,
    pub last: Option<Outcome>,
    pub exec_count: u64,
}

impl Default for EndpointStats {
    fn default() -> Self {
        Self {
            last_10: RollingWindow::new(SHORT_WINDOW),
            last_100: RollingWindow::new(LONG_WINDOW),
            last_50: RollingWindow::new(HISTORY_WINDOW),
            last: None,
            exec_count: 0,
        }
    }
}

impl EndpointStats {
    /// Fold one outcome in and return its execution number.
    fn record(&mut self, mut outcome: Outcome) -> u64 {
        self.exec_count += 1;
        outcome.sequence = self.exec_count;
        let sequence = outcome.sequence;

        self.last_10.push(outcome.duration);
        self.last_100.push(outcome.duration);
        self.last_50.push(outcome.success);
        self.last = Some(outcome);

        sequence
    }
}

/// A consistent, owned copy of one endpoint's stats for rendering.
#[derive(Debug, Clone)]
pub struct EndpointSnapshot {
    pub endpoint: Arc<Endpoint>,
    pub last: Option<Outcome>,
    pub exec_count: u64,
    pub avg_10: Duration,
    pub avg_100: Duration,
    /// Newest first.
    pub history: Vec<bool>,
}

/// Thread-safe store of per-endpoint statistics, sized once at startup.
pub struct StatStore {
    endpoints: Vec<Arc<Endpoint>>,
    slots: Vec<Mutex<EndpointStats>>,
}

impl StatStore {
    /// Create a store with one empty slot per endpoint.
    ///
    /// Endpoints must be ordered by their stable index.
    pub fn new(endpoints: &[Arc<Endpoint>]) -> Self {
        debug_assert!(endpoints.iter().enumerate().all(|(i, e)| e.index == i));
        Self {
            endpoints: endpoints.to_vec(),
            slots: endpoints.iter().map(|_| Mutex::new(EndpointStats::default())).collect(),
        }
    }

    fn slot(&self, index: usize) -> Result<MutexGuard<'_, EndpointStats>, StatsError> {
        let slot = self.slots.get(index).ok_or(StatsError::UnknownEndpoint(index))?;
        // A panic mid-record cannot leave a window over its cap, so poisoned data is still usable.
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Record an outcome against its endpoint, returning the execution number.
    pub fn record(&self, outcome: Outcome) -> Result<u64, StatsError> {
        let index = outcome.endpoint.index;
        let mut stats = self.slot(index)?;
        Ok(stats.record(outcome))
    }

    /// Copy of the raw stats for one endpoint.
    #[cfg(test)]
    pub fn stats(&self, index: usize) -> Result<EndpointStats, StatsError> {
        Ok(self.slot(index)?.clone())
    }

    /// Snapshot every endpoint in index order. Each row is internally consistent.
    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        self.endpoints
            .iter()
            .zip(&self.slots)
            .map(|(endpoint, slot)| {
                let stats = slot.lock().unwrap_or_else(PoisonError::into_inner);
                EndpointSnapshot {
                    endpoint: endpoint.clone(),
                    last: stats.last.clone(),
                    exec_count: stats.exec_count,
                    avg_10: stats.last_10.average(),
                    avg_100: stats.last_100.average(),
                    history: stats.last_50.to_vec(),
                }
            })
            .collect()
    }
}
