//! uptrail - terminal uptime and latency monitor.
//!
//! Probes every endpoint in the checks file on its own interval and keeps a
//! live table of recent results on stdout.

mod config;
mod probe;
mod render;
mod scheduler;
mod stats;

use crate::config::{load_endpoints, ConfigError, Settings};
use probe::Executor;
use render::Renderer;
use scheduler::{run_collector, run_render_loop, RenderTrigger, Scheduler};
use stats::StatStore;

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = Settings::load();
    init_logging(&cfg)?;

    let endpoints = match load_endpoints(&cfg.checks_path) {
        Ok(endpoints) => endpoints,
        Err(e) => {
            // Logged for the log file; stderr gets it whatever RUST_LOG says
            if cfg.log_file.is_some() {
                tracing::error!("Error loading config: {}", e);
            }
            report_config_error(&mut std::io::stderr(), &e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded {} checks from {}",
        endpoints.len(),
        cfg.checks_path.display()
    );

    let executor = Executor::new(cfg.http_timeout, cfg.icmp_timeout)?;
    let store = Arc::new(StatStore::new(&endpoints));

    // Single render task; the collector only ever requests passes
    let (trigger, render_rx) = RenderTrigger::channel();
    tokio::spawn(run_render_loop(
        render_rx,
        store.clone(),
        Renderer::for_stdout(),
        BufWriter::new(std::io::stdout()),
    ));

    let (scheduler, outcome_rx) = Scheduler::new(executor);
    let handles = scheduler.start(&endpoints);
    if handles.is_empty() {
        tracing::warn!("No endpoint has a supported probe type; nothing to monitor");
    }

    // Draw the table before the first results arrive
    trigger.request();

    // Runs until the process is killed: the scheduler keeps the channel open
    run_collector(outcome_rx, store, trigger).await;

    Ok(())
}

fn report_config_error<W: Write>(out: &mut W, e: &ConfigError) {
    let _ = writeln!(out, "Error loading config: {}", e);
}

/// Log to stderr, or to `UPTRAIL_LOG_FILE` when set so stdout stays a clean table.
fn init_logging(cfg: &Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uptrail=warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match &cfg.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .init();
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
