//! Scheduler module for running probes on their own cadence.

mod collector;

pub use collector::*;

use crate::probe::{Endpoint, Outcome, Prober};

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Capacity of the channel between probe loops and the collector.
/// Each loop has at most one delivery in flight.
const OUTCOME_BUFFER: usize = 64;

/// An outcome on its way to the collector.
///
/// The sending loop waits until the delivery is recorded, or dropped, before
/// it starts the next interval.
#[derive(Debug)]
pub struct Delivery {
    pub outcome: Outcome,
    recorded: oneshot::Sender<()>,
}

impl Delivery {
    pub fn new(outcome: Outcome) -> (Self, oneshot::Receiver<()>) {
        let (recorded, rx) = oneshot::channel();
        (Self { outcome, recorded }, rx)
    }
}

/// Runs one probe loop per endpoint, all feeding a single outcome channel.
pub struct Scheduler<P> {
    prober: Arc<P>,
    outcome_tx: mpsc::Sender<Delivery>,
}

impl<P: Prober + 'static> Scheduler<P> {
    /// Create a new scheduler and the receiving end of its outcome channel.
    pub fn new(prober: P) -> (Self, mpsc::Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel(OUTCOME_BUFFER);
        let scheduler = Self {
            prober: Arc::new(prober),
            outcome_tx: tx,
        };
        (scheduler, rx)
    }

    /// Start monitoring every endpoint with a supported probe kind.
    pub fn start(&self, endpoints: &[Arc<Endpoint>]) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting scheduler with {} targets", endpoints.len());

        endpoints
            .iter()
            .filter_map(|endpoint| self.add_endpoint(endpoint.clone()))
            .collect()
    }

    /// Spawn the probe loop for one endpoint.
    ///
    /// Returns `None`, after reporting why, when the probe kind is not supported.
    pub fn add_endpoint(&self, endpoint: Arc<Endpoint>) -> Option<JoinHandle<()>> {
        if let Err(e) = endpoint.kind() {
            tracing::warn!("Scheduler: not monitoring {}: {}", endpoint.name, e);
            return None;
        }

        tracing::info!(
            "Scheduler: Adding target {} ({} {} every {:?})",
            endpoint.name,
            endpoint.probe_type,
            endpoint.destination,
            endpoint.repeat
        );

        let prober = self.prober.clone();
        let tx = self.outcome_tx.clone();
        Some(tokio::spawn(run_probe_loop(endpoint, prober, tx)))
    }
}

/// Probe, deliver, wait, forever. Exits only when the collector is gone.
async fn run_probe_loop<P: Prober>(
    endpoint: Arc<Endpoint>,
    prober: Arc<P>,
    tx: mpsc::Sender<Delivery>,
) {
    loop {
        let outcome = prober.probe(&endpoint).await;
        let (delivery, recorded) = Delivery::new(outcome);

        if tx.send(delivery).await.is_err() {
            tracing::debug!("Scheduler: outcome channel closed, stopping {}", endpoint.name);
            break;
        }

        // Err means the collector dropped it unrecorded; the cadence goes on either way
        let _ = recorded.await;

        tokio::time::sleep(endpoint.repeat).await;
    }
}
