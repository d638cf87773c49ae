//! WebSocket handler for live tables.
//!
//! Each connection is one session at one table. Frames from the browser are
//! decoded into [`ClientMessage`]s and forwarded to the table actor; whatever
//! the actor pushes to the session is encoded and written back.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /websocket` or `GET /ws/{table_id}`
//! 2. The session registers with the table actor and receives the current view
//! 3. A send task drains the session's channel onto the socket
//! 4. The receive loop forwards client messages until either side closes
//! 5. The table is told the session disconnected; a seat is kept for rejoining
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:9000/websocket');
//!
//! ws.onmessage = (frame) => {
//!   const { event, data } = JSON.parse(frame.data);
//!   if (event === 'turn') {
//!     showActions(data.actions);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ event: 'join', data: { seat: 2, displayName: 'ann' } }));
//! ```

use axum::{
    extract::{
        ConnectInfo, Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, warn};
use live_poker::{
    UserError,
    messages::{ClientMessage, ErrorReport, ServerMessage},
    net::errors::ProtocolError,
    table::{TableHandle, TableId},
};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::AppState;
use crate::{logging, metrics};

/// Replies the server writes without going through the table.
const REPLY_BUFFER: usize = 8;

/// Upgrade to a websocket at the default table.
///
/// # Response
///
/// `503 Service Unavailable` when no table is open.
pub async fn default_table_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    match state.table_manager.default_table().await {
        Some(handle) => ws.on_upgrade(move |socket| handle_socket(socket, handle, peer)),
        None => (StatusCode::SERVICE_UNAVAILABLE, "No table is open").into_response(),
    }
}

/// Upgrade to a websocket at a specific table.
///
/// # Response
///
/// `404 Not Found` when the table doesn't exist.
pub async fn websocket_handler(
    Path(table_id): Path<TableId>,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    match state.table_manager.get_table(table_id).await {
        Some(handle) => ws.on_upgrade(move |socket| handle_socket(socket, handle, peer)),
        None => (StatusCode::NOT_FOUND, format!("Table {table_id} not found")).into_response(),
    }
}

/// Decides what a client action means for metrics.
fn is_betting_action(message: &ClientMessage) -> bool {
    matches!(
        message,
        ClientMessage::Call | ClientMessage::Check | ClientMessage::Fold | ClientMessage::Bet(_)
    )
}

/// The reply for a frame that never reached the table.
fn protocol_error_reply(error: ProtocolError) -> ServerMessage {
    ServerMessage::Error(ErrorReport::from(&UserError::from(error)))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, handle: TableHandle, peer: SocketAddr) {
    let session_id = Uuid::new_v4();
    let table_id = handle.table_id();

    let mut updates = match handle.connect(session_id).await {
        Ok(updates) => updates,
        Err(e) => {
            warn!("Session {} could not join table {}: {}", session_id, table_id, e);
            return;
        }
    };

    metrics::websocket_connected();
    logging::log_connection_event("connected", session_id, table_id, Some(peer));

    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(REPLY_BUFFER);

    let mut send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                update = updates.recv() => match update {
                    Some(message) => message,
                    // The table closed.
                    None => break,
                },
                Some(message) = reply_rx.recv() => message,
            };

            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to encode {}: {}", message, e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }

        let _ = sender.send(Message::Close(None)).await;
    });

    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            _ = &mut send_task => break,
        };

        let reply = match frame {
            Some(Ok(Message::Text(text))) => match ClientMessage::parse(text.as_str()) {
                Ok(message) => {
                    metrics::client_message(message.event());
                    if is_betting_action(&message) {
                        metrics::actions_total(message.event());
                    }
                    debug!("Session {} at table {}: {}", session_id, table_id, message);

                    if handle.command(session_id, message).await.is_err() {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    metrics::protocol_errors_total();
                    logging::log_protocol_error(session_id, text.len(), &e.to_string());
                    protocol_error_reply(e)
                }
            },
            Some(Ok(Message::Binary(_))) => {
                metrics::protocol_errors_total();
                protocol_error_reply(ProtocolError::UnsupportedFrame("binary"))
            }
            Some(Ok(Message::Close(_))) | None => break,
            // Pings are answered by axum.
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!("Session {} socket error: {}", session_id, e);
                break;
            }
        };

        if reply_tx.send(reply).await.is_err() {
            break;
        }
    }

    send_task.abort();

    if let Err(e) = handle.disconnect(session_id).await {
        debug!("Table {} already gone: {}", table_id, e);
    }

    metrics::websocket_disconnected();
    logging::log_connection_event("disconnected", session_id, table_id, Some(peer));
}
