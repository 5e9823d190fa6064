//! Brewline - Main Entry Point
//! Wires the queue manager, the event relay and the operator console.

mod console;
mod relay;
mod shutdown;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use brewline_core::domain::QueueConfig;
use brewline_core::port::{SequentialIdProvider, SystemTimeProvider};
use brewline_core::QueueManager;
use console::Command;
use shutdown::shutdown_channel;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    init_logging()?;

    info!("Brewline v{} starting...", VERSION);

    // 2. Load configuration
    let config = QueueConfig::from_env().context("invalid queue configuration")?;
    info!(
        base_minutes = config.base_minutes,
        per_item_minutes = config.per_item_minutes,
        sample_size = config.estimate_sample_size,
        event_capacity = config.event_capacity,
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let manager = Arc::new(QueueManager::new(
        config,
        Arc::new(SequentialIdProvider::new()),
        Arc::new(SystemTimeProvider),
    ));

    // 4. Start event relay
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let relay_handle = tokio::spawn(relay::run(manager.subscribe(), shutdown_rx));

    // 5. Serve the operator console until quit, EOF or Ctrl+C
    info!("System ready. Type 'help' for commands, Ctrl+C to exit");
    tokio::select! {
        result = run_console(manager.clone()) => {
            if let Err(e) = result {
                error!(error = ?e, "Console failed");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("Shutdown signal received. Exiting gracefully...");
        }
    }

    // 6. Graceful shutdown
    shutdown_tx.shutdown();
    match tokio::time::timeout(std::time::Duration::from_secs(5), relay_handle).await {
        Ok(Ok(relayed)) => info!(relayed, "Event relay stopped"),
        Ok(Err(e)) => warn!(error = ?e, "Event relay task failed"),
        Err(_) => warn!("Event relay did not stop in time"),
    }

    let stats = manager.stats();
    info!(
        total_orders = stats.total_orders,
        completed = stats.completed,
        cancelled = stats.cancelled,
        "Shutdown complete."
    );

    Ok(())
}

/// JSON or pretty output, selected by `BREWLINE_LOG_FORMAT`
fn init_logging() -> Result<()> {
    let log_format = std::env::var("BREWLINE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("brewline=info"))
        .context("failed to create env filter")?;

    // Logs go to stderr so console output on stdout stays clean
    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

async fn run_console(manager: Arc<QueueManager>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        // Help and usage errors are rendered by clap
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.to_string().trim_end());
                continue;
            }
        };
        if command == Command::Quit {
            info!("Console quit requested");
            break;
        }

        match console::execute(&manager, command) {
            Ok(output) => println!("{}", output),
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}
