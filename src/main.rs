//! Shipment portal server.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use shipment_portal::config::validation::validate_config;
use shipment_portal::config::{load_config, ConfigError, PortalConfig};
use shipment_portal::lifecycle::{wait_for_signal, Shutdown};
use shipment_portal::observability::{logging, metrics};
use shipment_portal::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "shipment-portal", version, about = "Shipment tracking portal backend")]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PortalConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind.to_string();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "shipment-portal starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_capacity = config.rate_limit.capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on(wait_for_signal());

    HttpServer::new(config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_override_must_be_socket_address() {
        let cli = Cli::try_parse_from(["shipment-portal", "--bind", "127.0.0.1:9000"]).unwrap();
        assert_eq!(cli.bind, Some("127.0.0.1:9000".parse().unwrap()));

        assert!(Cli::try_parse_from(["shipment-portal", "--bind", "localhost"]).is_err());
        assert!(Cli::try_parse_from(["shipment-portal", "--bind", "0.0.0.0:99999"]).is_err());
    }
}
