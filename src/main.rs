//! Triage Live service
//!
//! Run with: cargo run --bin triage-live -- --config triage-live.toml
//!
//! Keeps the live queue in sync with the triage backend and serves the local
//! view API until Ctrl+C or SIGTERM.
//!
//! # Configuration
//!
//! A TOML file (see `triage-cli config`) plus `TRIAGE_*` environment
//! overrides. `RUST_LOG` takes precedence over `logging.level`.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_live::api::{serve, AppState};
use triage_live::config::{Config, LoggingConfig};
use triage_live::{DashboardService, TriageClient};

#[derive(Parser)]
#[command(name = "triage-live")]
#[command(about = "Live patient-triage queue synchronizer", version)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start the arrival simulation regardless of config
    #[arg(long)]
    simulate: bool,

    /// Do not subscribe to the push channel
    #[arg(long)]
    no_push: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_default(),
    };
    if args.simulate {
        config.simulation.enabled = true;
    }
    if args.no_push {
        config.push.enabled = false;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting Triage Live v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(backend = %config.backend.url, push = %config.push.url, "Backend endpoints");
    if let Some(doctor) = &config.session.doctor {
        tracing::info!(doctor = %doctor, "Session doctor");
    }

    let backend = Arc::new(TriageClient::new(&config.backend).context("creating backend client")?);
    let service = Arc::new(DashboardService::new(config.clone(), backend));

    // The dashboard starts empty if the backend is down; the push channel fills it later
    match service.initial_load().await {
        Ok(count) => tracing::info!(count, "Queue ready"),
        Err(e) => tracing::warn!(error = %e, "Initial load failed, waiting for push snapshots"),
    }

    service.start_push().await;
    if config.simulation.enabled {
        service.start_simulation().await;
    }

    let state = AppState::new(Arc::clone(&service));
    let result = serve(state, &config.api).await;

    tracing::info!("Stopping background tasks...");
    service.shutdown().await;
    tracing::info!("Triage Live stopped");

    result.map_err(Into::into)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("triage_live={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
