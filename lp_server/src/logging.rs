//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber. The `live_poker` crate logs through the
//! `log` facade, which `tracing-subscriber` bridges into the same output.

use live_poker::constants::MAX_MESSAGE_BYTES;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use lp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a websocket connection opening or closing
///
/// # Arguments
///
/// * `event_type` - `"connected"` or `"disconnected"`
/// * `session_id` - Session the table knows the connection by
/// * `table_id` - Table the connection is attached to
/// * `peer` - Remote address, when known
pub fn log_connection_event(
    event_type: &str,
    session_id: Uuid,
    table_id: u32,
    peer: Option<SocketAddr>,
) {
    tracing::info!(
        event_type = event_type,
        session_id = %session_id,
        table_id = table_id,
        peer = ?peer,
        "Websocket {}",
        event_type
    );
}

/// Whether a frame is past the size `ClientMessage::parse` accepts.
fn is_oversized(frame_len: usize) -> bool {
    frame_len > MAX_MESSAGE_BYTES
}

/// Log a client frame the server could not make sense of.
///
/// Malformed frames are the client's problem, so they stay at debug unless
/// they are large enough to look abusive.
pub fn log_protocol_error(session_id: Uuid, frame_len: usize, reason: &str) {
    if is_oversized(frame_len) {
        tracing::warn!(
            session_id = %session_id,
            frame_len = frame_len,
            reason = reason,
            "PROTOCOL: Oversized malformed frame"
        );
    } else {
        tracing::debug!(
            session_id = %session_id,
            frame_len = frame_len,
            reason = reason,
            "Malformed client frame"
        );
    }
}
