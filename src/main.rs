//! Prometheus exporter for devolo PLC network devices.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use devolo_exporter::config::LogFormat;
use devolo_exporter::{ExporterConfig, HttpServer, PlcApiClient, PlcNetCollector};

/// Prometheus exporter for devolo PLC network devices.
#[derive(Parser, Debug)]
#[command(name = "devolo-exporter")]
#[command(about = "Export devolo PLC network status as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (YAML format).
    config: String,

    /// Listen host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration; any error here is fatal before the listener starts
    let mut config = ExporterConfig::load_from_file(&args.config)?;

    // CLI overrides
    if let Some(host) = args.host {
        config.exporter.host = host;
    }
    if let Some(port) = args.port {
        config.exporter.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Initialize logging
    let log_level: Level = config.logging.level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("devolo_exporter={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting devolo exporter");

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // One collector instance, registered once for the process lifetime
    let collector = Arc::new(PlcNetCollector::new(
        PlcApiClient::new(),
        config.ip_address.clone(),
        config.password.clone(),
    ));

    let http_server = HttpServer::new(
        collector,
        config.exporter.host.clone(),
        config.exporter.port,
    );

    // Start HTTP server
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    info!(
        host = %config.exporter.host,
        port = config.exporter.port,
        device = %config.ip_address,
        "Exporter running"
    );

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ).unwrap();
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    // Signal shutdown and let in-flight scrapes finish
    shutdown_tx.send(true)?;
    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}
