//! Result collection and render coalescing.

use super::Delivery;
use crate::render::Renderer;
use crate::stats::StatStore;

use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Requests render passes from the render task.
///
/// At most one request is ever pending. A request made while another is
/// still queued is dropped: the queued pass will read the newest stats anyway.
#[derive(Clone)]
pub struct RenderTrigger {
    tx: mpsc::Sender<()>,
}

impl RenderTrigger {
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Queue a render pass. Returns false if one was already pending.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Closed(())) => {
                tracing::debug!("Render task is gone, dropping render request");
                false
            }
        }
    }
}

/// Consume every outcome, fold it into the store, and ask for a redraw.
///
/// Returns once every sender of the outcome channel is gone.
pub async fn run_collector(
    mut rx: mpsc::Receiver<Delivery>,
    store: Arc<StatStore>,
    trigger: RenderTrigger,
) {
    while let Some(Delivery { outcome, recorded }) = rx.recv().await {
        let name = outcome.endpoint.name.clone();
        let success = outcome.success;
        let started_at = outcome.started_at;

        match store.record(outcome) {
            Ok(sequence) => {
                tracing::trace!(
                    "Collected {} #{} at {}: ok={}",
                    name,
                    sequence,
                    started_at,
                    success
                );
            }
            Err(e) => {
                tracing::error!("Collector: dropping outcome for {}: {}", name, e);
                continue;
            }
        }

        // The sending loop may already be gone
        let _ = recorded.send(());
        trigger.request();
    }
}

/// Draw the table once per render request. Passes never overlap.
///
/// A failed pass is logged and the next request is served normally.
pub async fn run_render_loop<W: Write>(
    mut rx: mpsc::Receiver<()>,
    store: Arc<StatStore>,
    renderer: Renderer,
    mut out: W,
) {
    while rx.recv().await.is_some() {
        let rows = store.snapshot();
        if let Err(e) = renderer.render(&mut out, &rows) {
            tracing::error!("Render failed: {}", e);
        }
    }
}
