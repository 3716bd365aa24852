use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use wanas::entities::EntityRegistry;
use wanas::transport::ModbusClientFactory;
use wanas::web::AppState;
use wanas::{Config, PollCoordinator};

/// Modbus poller and switch controller for Wanas heat recovery units
#[derive(Parser, Debug)]
#[command(name = "wanas")]
#[command(version = env!("APP_VERSION"))]
struct Args {
    /// Path to the YAML configuration file; default locations are searched otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Test the connection (connect, read register 0) and exit
    #[arg(long)]
    probe: bool,

    /// Run a single poll cycle, print every entity and exit
    #[arg(long)]
    once: bool,

    /// Do not start the HTTP API
    #[arg(long)]
    no_web: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate().context("Invalid configuration")?;

    wanas::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    info!(
        "Wanas {} starting for {} ({})",
        env!("APP_VERSION"),
        config.connection.device_id(),
        config.connection.protocol
    );

    let factory = Arc::new(ModbusClientFactory);

    if args.probe {
        wanas::connection::probe(&config.connection, factory.as_ref())
            .await
            .context("Probe failed")?;
        println!("Connection to {} OK", config.connection.device_id());
        return Ok(());
    }

    let coordinator = Arc::new(PollCoordinator::new(&config, factory));

    // A failed first refresh is retried by the next scheduled cycle
    if let Err(e) = coordinator.first_refresh().await {
        warn!("Initial refresh failed: {}", e);
    }

    if args.once {
        let entities = EntityRegistry::build(&coordinator);
        let reports: Vec<_> = entities.all().map(|e| e.report()).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        coordinator.shutdown().await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
    let poll_task = tokio::spawn(coordinator.clone().run(shutdown_rx));

    let (web_stop_tx, web_stop_rx) = oneshot::channel::<()>();
    let web_task = if config.web.enabled && !args.no_web {
        let state = AppState::new(coordinator.clone(), config.clone());
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            let stop = async {
                let _ = web_stop_rx.await;
            };
            if let Err(e) = wanas::web::serve(state, &host, port, stop).await {
                error!("{}", e);
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    let _ = shutdown_tx.send(());
    let _ = web_stop_tx.send(());
    if let Err(e) = poll_task.await {
        error!("Poll task failed: {}", e);
    }
    if let Some(task) = web_task {
        let _ = task.await;
    }

    info!("Wanas stopped");
    Ok(())
}
