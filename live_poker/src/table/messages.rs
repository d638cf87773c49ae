//! Table actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::session::SessionId;
use crate::{
    game::{HandPhase, entities::Chips},
    net::messages::{ClientMessage, ServerMessage},
};

/// Identifier a table is registered under.
pub type TableId = u32;

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// A websocket opened. The session starts out as a spectator.
    Connect {
        session_id: SessionId,
        sender: mpsc::Sender<ServerMessage>,
    },

    /// The websocket closed. A seat held by the session stays reserved for
    /// a reconnect.
    Disconnect { session_id: SessionId },

    /// A decoded client message
    Command {
        session_id: SessionId,
        message: ClientMessage,
    },

    /// Get current table state
    GetState {
        response: oneshot::Sender<TableStateResponse>,
    },

    /// Stop the actor
    Close {
        response: oneshot::Sender<()>,
    },
}

/// Table state response
#[derive(Debug, Clone, Serialize)]
pub struct TableStateResponse {
    /// Table ID
    pub table_id: TableId,

    /// Table name
    pub table_name: String,

    /// Occupied seats
    pub player_count: usize,

    /// Seats at the table
    pub max_seats: usize,

    /// Connections without a seat
    pub spectator_count: usize,

    /// Small blind
    pub small_blind: Chips,

    /// Big blind
    pub big_blind: Chips,

    /// Current pot size
    pub pot_size: Chips,

    /// Whether `startGame` has been accepted
    pub is_running: bool,

    /// Current game phase
    pub phase: HandPhase,

    /// Hands dealt so far
    pub hands_played: u64,

    /// Display names of seated players
    pub players: Vec<String>,
}
