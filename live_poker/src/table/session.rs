//! Connections attached to a table.
//!
//! Each websocket is a session with its own bounded outbound channel. A
//! session is either bound to a seat or watching as a spectator. Delivery
//! never waits: a full channel loses the message, a closed one loses the
//! session.

use log::{debug, warn};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::{
    game::{Table, entities::SeatIndex, views::TableView},
    net::messages::ServerMessage,
};

pub type SessionId = Uuid;

#[derive(Debug)]
struct Session {
    seat: Option<SeatIndex>,
    sender: mpsc::Sender<ServerMessage>,
}

/// Returns false once the receiving side is gone.
fn deliver(id: &SessionId, session: &Session, message: ServerMessage) -> bool {
    match session.sender.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("Session {id} channel full, dropping message");
            true
        }
        Err(TrySendError::Closed(_)) => {
            debug!("Session {id} disconnected, removing");
            false
        }
    }
}

/// Everything a session needs to redraw the table.
fn view_messages(table: &Table, seat: Option<SeatIndex>) -> Vec<ServerMessage> {
    let view = TableView::for_viewer(table, seat);
    let mut messages = vec![
        ServerMessage::Players(view.seats),
        ServerMessage::Hand(view.hand),
        ServerMessage::TablePot(view.pot),
        ServerMessage::TableCards(view.board),
    ];
    if let Some(turn) = view.turn {
        messages.push(ServerMessage::Turn(turn));
    }
    messages
}

/// Sessions removed because their channel closed, with the seat each held.
pub type Dropped = Vec<(SessionId, Option<SeatIndex>)>;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, id: SessionId, sender: mpsc::Sender<ServerMessage>) {
        self.sessions.insert(id, Session { seat: None, sender });
    }

    /// Forgets the session and returns the seat it held.
    pub fn disconnect(&mut self, id: &SessionId) -> Option<SeatIndex> {
        self.sessions.remove(id).and_then(|session| session.seat)
    }

    pub fn is_connected(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn seat_of(&self, id: &SessionId) -> Option<SeatIndex> {
        self.sessions.get(id).and_then(|session| session.seat)
    }

    /// Binds a session to a seat. Any other session still pointing at the
    /// seat becomes a spectator.
    pub fn bind(&mut self, id: &SessionId, seat: SeatIndex) {
        for session in self.sessions.values_mut() {
            if session.seat == Some(seat) {
                session.seat = None;
            }
        }
        if let Some(session) = self.sessions.get_mut(id) {
            session.seat = Some(seat);
        }
    }

    pub fn unbind(&mut self, id: &SessionId) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.seat = None;
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn spectator_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|session| session.seat.is_none())
            .count()
    }

    /// Sends to one session only, e.g. an error reply.
    pub fn send_to(&mut self, id: &SessionId, message: ServerMessage) -> Dropped {
        let Some(session) = self.sessions.get(id) else {
            return Vec::new();
        };
        if deliver(id, session, message) {
            return Vec::new();
        }
        let seat = self.disconnect(id);
        vec![(*id, seat)]
    }

    /// Sends the same message to every session.
    pub fn broadcast(&mut self, message: &ServerMessage) -> Dropped {
        let mut dropped = Vec::new();
        self.sessions.retain(|id, session| {
            let alive = deliver(id, session, message.clone());
            if !alive {
                dropped.push((*id, session.seat));
            }
            alive
        });
        dropped
    }

    /// Sends every session its own redacted view of the table.
    pub fn push_views(&mut self, table: &Table) -> Dropped {
        let mut dropped = Vec::new();
        self.sessions.retain(|id, session| {
            let alive = view_messages(table, session.seat)
                .into_iter()
                .all(|message| deliver(id, session, message));
            if !alive {
                dropped.push((*id, session.seat));
            }
            alive
        });
        dropped
    }

    /// Sends one session its view, e.g. right after it connects.
    pub fn push_view_to(&mut self, id: &SessionId, table: &Table) -> Dropped {
        let Some(session) = self.sessions.get(id) else {
            return Vec::new();
        };
        let alive = view_messages(table, session.seat)
            .into_iter()
            .all(|message| deliver(id, session, message));
        if alive {
            return Vec::new();
        }
        let seat = self.disconnect(id);
        vec![(*id, seat)]
    }
}
