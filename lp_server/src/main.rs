//! Live poker table server.
//!
//! Spawns the configured number of table actors and serves the browser
//! client's websocket protocol in front of them.

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Error};
use lp_server::{
    api,
    config::ServerConfig,
    logging,
    metrics::{init_metrics, sample_tables},
};
use live_poker::table::TableManager;
use pico_args::Arguments;
use tracing::{error, info, warn};

const HELP: &str = "\
Run a live poker table server

USAGE:
  lp_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:9000]
  --tables        N        Number of tables to create  [default: env MAX_TABLES or 1]
  --metrics-bind  IP:PORT  Prometheus exporter address [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:9000)
  MAX_TABLES               Number of tables
  METRICS_BIND             Prometheus exporter address
  TABLE_MAX_SEATS          Seats per table (2-10)
  TABLE_SMALL_BLIND        Small blind
  TABLE_BIG_BLIND          Big blind
  TABLE_BUY_IN             Chips each player sits down with
  TABLE_ACTION_TIMEOUT_MS  Time to act before an automatic check or fold
  TABLE_HAND_INTERVAL_MS   Pause between hands
  RUST_LOG                 Log filter (e.g., info,live_poker=debug)
  (A .env file in the working directory is loaded first)
";

/// How often table gauges are refreshed.
const METRICS_SAMPLE_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let num_tables: Option<usize> = pargs.opt_value_from_str("--tables")?;
    let metrics_bind: Option<SocketAddr> = pargs.opt_value_from_str("--metrics-bind")?;

    let config = ServerConfig::from_env(bind, num_tables, metrics_bind)?;
    config.validate()?;

    logging::init();
    info!("Starting live poker server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let table_manager = TableManager::new(config.num_tables);

    info!("Creating {} table(s)...", config.num_tables);
    for n in 1..=config.num_tables {
        match table_manager
            .create_table(config.table_defaults.table_config(n))
            .await
        {
            Ok(table_id) => info!("Created table {} with ID {}", n, table_id),
            Err(e) => error!("Failed to create table {}: {}", n, e),
        }
    }

    let tables = table_manager.list_tables().await;
    if tables.is_empty() {
        anyhow::bail!("No table could be created");
    }
    for table in &tables {
        info!(
            "  - {} (ID: {}) - {} seats, blinds: {}/{}",
            table.name, table.id, table.max_players, table.small_blind, table.big_blind
        );
    }

    if config.metrics_bind.is_some() {
        tokio::spawn(sample_tables(table_manager.clone(), METRICS_SAMPLE_PERIOD));
    }

    let app = api::create_router(api::AppState {
        table_manager: table_manager.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at ws://{}/websocket. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down server...");
    table_manager.close_all().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
