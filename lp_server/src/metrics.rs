//! Prometheus metrics for monitoring table server health.
//!
//! Metrics are exposed in Prometheus text format on their own listener when
//! a metrics address is configured. Without one the `metrics` macros are
//! no-ops.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, frames in and out
//! - **Game Metrics**: Open tables, seated players, hands dealt
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lp_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connected();
//! metrics::client_message("call");
//! ```

use live_poker::table::{TableManager, TableMetadata};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, time::Duration};
use tokio::time::{MissedTickBehavior, interval};

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Record a websocket connection opening.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// Record a websocket connection closing.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Count a decoded client message by event name.
pub fn client_message(event: &'static str) {
    metrics::counter!("client_messages_total", "event" => event).increment(1);
}

/// Count a betting action submitted by a player.
pub fn actions_total(event: &'static str) {
    metrics::counter!("actions_total", "action" => event).increment(1);
}

/// Count a frame that failed to decode.
pub fn protocol_errors_total() {
    metrics::counter!("protocol_errors_total").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current open tables count.
pub fn active_tables(count: usize) {
    metrics::gauge!("active_tables").set(count as f64);
}

/// Publish one table's snapshot.
pub fn record_table(table: &TableMetadata) {
    let id = table.id.to_string();
    metrics::gauge!("table_players", "table_id" => id.clone()).set(table.player_count as f64);
    metrics::gauge!("table_spectators", "table_id" => id.clone())
        .set(table.spectator_count as f64);
    metrics::counter!("hands_completed_total", "table_id" => id).absolute(table.hands_played);
}

/// Totals across every table.
pub fn active_players(tables: &[TableMetadata]) -> usize {
    tables.iter().map(|table| table.player_count).sum()
}

/// Periodically samples every table into gauges until the process exits.
pub async fn sample_tables(manager: TableManager, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let tables = manager.list_tables().await;
        active_tables(tables.len());
        metrics::gauge!("active_players").set(active_players(&tables) as f64);
        for table in &tables {
            record_table(table);
        }
    }
}
