//! fleetwatch daemon
//!
//! Periodically reconciles tracked host records against their cloud providers

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use kameo::actor::Spawn;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleetwatch_core::{
    FleetMonitorActor, FleetMonitorActorArgs, HostEvent, MonitorConfig, MonitorEnv,
    RunMonitoringPass,
};

mod config;
mod factory;

use config::Config;

/// Host monitoring and reconciliation daemon
#[derive(Parser, Debug)]
#[command(name = "fleetwatch", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single monitoring pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    init_tracing(&config);

    let store = factory::build_store(&config).await?;
    let providers = factory::build_registry(&config)?;

    let (event_tx, event_rx) = broadcast::channel(1024);
    tokio::spawn(log_events(event_rx));

    let env = MonitorEnv::new(store, providers, MonitorConfig::from(&config.monitor))
        .with_events(event_tx);
    let monitor = FleetMonitorActor::spawn(FleetMonitorActorArgs { env });

    let shutdown = install_shutdown_handler();
    let mut ticker = tokio::time::interval(config.interval());

    info!(
        hosts = config.host.len(),
        interval = ?config.interval(),
        "fleetwatch daemon starting"
    );

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let pass = RunMonitoringPass {
                    cancel: shutdown.child_token(),
                };
                if let Err(e) = monitor.ask(pass).await {
                    error!(error = ?e, "monitoring pass failed");
                }
                if args.once {
                    break;
                }
            }
        }
    }

    if let Err(e) = monitor.stop_gracefully().await {
        warn!(error = ?e, "monitor did not stop cleanly");
    }

    info!("fleetwatch daemon stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level));

    if config.daemon.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn log_events(mut rx: broadcast::Receiver<HostEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => info!(host = %event.host(), event = ?event, "host event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "host event log lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Cancel the returned token on SIGTERM or SIGINT
fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
        }

        trigger.cancel();
    });

    token
}
