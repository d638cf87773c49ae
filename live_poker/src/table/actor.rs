//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    messages::{TableId, TableMessage, TableStateResponse},
    session::{Dropped, SessionId, SessionRegistry},
};
use crate::{
    game::{
        GameEvent, HandPhase, Table, UserError,
        constants::MAX_CHAT_LENGTH,
        entities::{Action, DisplayName, SeatIndex},
    },
    net::messages::{BetRequest, ChatRequest, ClientMessage, ErrorReport, JoinRequest, ServerMessage},
};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, MissedTickBehavior, interval},
};

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
    session_buffer: usize,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId, session_buffer: usize) -> Self {
        Self {
            sender,
            table_id,
            session_buffer,
        }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }

    /// Attaches a new session and returns the receiving end of its outbound
    /// channel. The table pushes the current view right away.
    pub async fn connect(
        &self,
        session_id: SessionId,
    ) -> Result<mpsc::Receiver<ServerMessage>, String> {
        let (sender, receiver) = mpsc::channel(self.session_buffer);
        self.send(TableMessage::Connect { session_id, sender })
            .await?;
        Ok(receiver)
    }

    pub async fn disconnect(&self, session_id: SessionId) -> Result<(), String> {
        self.send(TableMessage::Disconnect { session_id }).await
    }

    pub async fn command(&self, session_id: SessionId, message: ClientMessage) -> Result<(), String> {
        self.send(TableMessage::Command {
            session_id,
            message,
        })
        .await
    }

    /// Get current table state
    pub async fn state(&self) -> Result<TableStateResponse, String> {
        let (response, receiver) = oneshot::channel();
        self.send(TableMessage::GetState { response }).await?;
        receiver
            .await
            .map_err(|_| "Table is closed".to_string())
    }

    /// Stops the actor once it has handled everything queued before this.
    pub async fn close(&self) -> Result<(), String> {
        let (response, receiver) = oneshot::channel();
        self.send(TableMessage::Close { response }).await?;
        receiver
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    /// Seats and the hand in progress
    table: Table,

    /// Connected websockets, seated or watching
    sessions: SessionRegistry,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Acting seat and when it runs out of time
    deadline: Option<(SeatIndex, Instant)>,

    /// When the completed hand is cleared and the next one dealt
    next_hand_at: Option<Instant>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `config` - Table configuration
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: TableId, config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let handle = TableHandle::new(sender, id, config.session_buffer);

        let actor = Self {
            id,
            table: Table::new(config.game_settings()),
            config,
            sessions: SessionRegistry::new(),
            inbox,
            deadline: None,
            next_hand_at: None,
            is_closed: false,
        };

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        let mut tick_interval = interval(self.config.tick());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    // Every handle is gone.
                    let Some(message) = message else {
                        break;
                    };
                    self.handle_message(message);

                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    self.tick();
                }
            }
        }

        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Connect { session_id, sender } => {
                log::debug!("Table {}: session {} connected", self.id, session_id);
                self.sessions.connect(session_id, sender);
                let dropped = self.sessions.push_view_to(&session_id, &self.table);
                self.drop_sessions(dropped);
            }

            TableMessage::Disconnect { session_id } => {
                log::debug!("Table {}: session {} disconnected", self.id, session_id);
                if let Some(seat) = self.sessions.disconnect(&session_id) {
                    self.table.set_connected(seat, false);
                    self.publish();
                }
            }

            TableMessage::Command {
                session_id,
                message,
            } => {
                if !self.sessions.is_connected(&session_id) {
                    log::warn!(
                        "Table {}: command from unknown session {}",
                        self.id,
                        session_id
                    );
                    return;
                }
                log::debug!("Table {}: session {} sent {}", self.id, session_id, message);
                if let Err(err) = self.handle_command(session_id, message) {
                    log::debug!("Table {}: session {} rejected: {}", self.id, session_id, err);
                    let dropped = self
                        .sessions
                        .send_to(&session_id, ServerMessage::Error(ErrorReport::from(&err)));
                    self.drop_sessions(dropped);
                }
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.get_state());
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    /// Applies one client message. Errors leave the table untouched.
    fn handle_command(
        &mut self,
        session_id: SessionId,
        message: ClientMessage,
    ) -> Result<(), UserError> {
        match message {
            ClientMessage::Join(request) => self.handle_join(session_id, request)?,
            ClientMessage::StartGame => {
                let seat = self.seat_of(&session_id)?;
                self.table.start_game(seat)?;
            }
            ClientMessage::Call => self.handle_action(session_id, Action::Call)?,
            ClientMessage::Check => self.handle_action(session_id, Action::Check)?,
            ClientMessage::Fold => self.handle_action(session_id, Action::Fold)?,
            ClientMessage::Bet(BetRequest { amount }) => {
                // The client has a single bet box; it raises once a bet is open.
                let action = if self.table.current_bet() == 0 {
                    Action::Bet(amount)
                } else {
                    Action::Raise(amount)
                };
                self.handle_action(session_id, action)?;
            }
            ClientMessage::Leave => {
                let seat = self.seat_of(&session_id)?;
                self.table.leave(seat)?;
                self.sessions.unbind(&session_id);
            }
            ClientMessage::Chat(request) => return self.handle_chat(session_id, request),
        }
        self.publish();
        Ok(())
    }

    fn seat_of(&self, session_id: &SessionId) -> Result<SeatIndex, UserError> {
        self.sessions
            .seat_of(session_id)
            .ok_or(UserError::NotSeated)
    }

    /// Seats the session, or hands a disconnected seat back to the same
    /// display name.
    fn handle_join(&mut self, session_id: SessionId, request: JoinRequest) -> Result<(), UserError> {
        let name = DisplayName::new(&request.display_name);
        if name.is_empty() {
            return Err(UserError::MalformedAction(
                "display name is empty".to_string(),
            ));
        }
        if self.sessions.seat_of(&session_id).is_some() {
            return Err(UserError::SeatUnavailable(request.seat));
        }
        let outcome = self.table.sit(request.seat, name)?;
        log::info!(
            "Table {}: session {} {:?} seat {}",
            self.id,
            session_id,
            outcome,
            request.seat
        );
        self.sessions.bind(&session_id, request.seat);
        Ok(())
    }

    fn handle_action(&mut self, session_id: SessionId, action: Action) -> Result<(), UserError> {
        let acting = self
            .table
            .acting_seat()
            .ok_or(UserError::NoActionPending)?;
        if self.sessions.seat_of(&session_id) != Some(acting) {
            return Err(UserError::NotYourTurn);
        }
        self.table.act(acting, action)
    }

    fn handle_chat(&mut self, session_id: SessionId, request: ChatRequest) -> Result<(), UserError> {
        let seat = self.seat_of(&session_id)?;
        let text: String = request.text.trim().chars().take(MAX_CHAT_LENGTH).collect();
        if text.is_empty() {
            return Err(UserError::MalformedAction("empty chat message".to_string()));
        }
        let name = self
            .table
            .seat(seat)
            .and_then(|seat| seat.name())
            .cloned()
            .unwrap_or_default();
        let dropped = self
            .sessions
            .broadcast(&ServerMessage::ChatMessage(format!("{name}: {text}")));
        self.drop_sessions(dropped);
        Ok(())
    }

    /// Narrates queued events and pushes every session its view, then
    /// rearms the turn and next-hand timers.
    fn publish(&mut self) {
        let mut turn_changed = false;
        loop {
            for event in self.table.drain_events() {
                turn_changed |= matches!(
                    event,
                    GameEvent::HandStarted { .. } | GameEvent::Acted { .. } | GameEvent::Dealt { .. }
                );
                log::debug!("Table {}: {}", self.id, event);
                let dropped = self
                    .sessions
                    .broadcast(&ServerMessage::GameMessage(event.to_string()));
                self.drop_sessions(dropped);
            }

            let dropped = self.sessions.push_views(&self.table);
            if dropped.is_empty() {
                break;
            }
            // Losing a seated session can move the hand along.
            self.drop_sessions(dropped);
        }
        self.refresh_timers(turn_changed);
    }

    fn drop_sessions(&mut self, dropped: Dropped) {
        for (session_id, seat) in dropped {
            log::debug!("Table {}: dropped session {}", self.id, session_id);
            if let Some(seat) = seat {
                self.table.set_connected(seat, false);
            }
        }
    }

    fn refresh_timers(&mut self, turn_changed: bool) {
        let now = Instant::now();
        self.deadline = match (self.table.acting_seat(), self.deadline) {
            (Some(seat), Some((current, at))) if seat == current && !turn_changed => {
                Some((current, at))
            }
            (Some(seat), _) => Some((seat, now + self.config.action_timeout())),
            (None, _) => None,
        };

        if self.table.phase() != HandPhase::HandComplete {
            self.next_hand_at = None;
        } else if self.next_hand_at.is_none() {
            self.next_hand_at = Some(now + self.config.hand_interval());
        }
    }

    /// Advance timers (called periodically)
    fn tick(&mut self) {
        if self.is_closed {
            return;
        }
        let now = Instant::now();

        if let Some((seat, deadline)) = self.deadline
            && now >= deadline
        {
            self.deadline = None;
            match self.table.auto_act(seat) {
                Ok(action) => log::info!("Table {}: seat {} timed out, {:?}", self.id, seat, action),
                Err(err) => log::debug!("Table {}: seat {} timeout ignored: {}", self.id, seat, err),
            }
            self.publish();
            return;
        }

        match self.table.phase() {
            HandPhase::HandComplete if self.next_hand_at.is_some_and(|at| now >= at) => {
                self.next_hand_at = None;
                self.table.finish_hand();
                self.deal_next_hand();
                self.publish();
            }
            HandPhase::WaitingForPlayers if self.table.is_running() && self.table.can_start_hand() => {
                self.deal_next_hand();
                self.publish();
            }
            _ => {}
        }
    }

    fn deal_next_hand(&mut self) {
        if !(self.table.is_running() && self.table.can_start_hand()) {
            return;
        }
        if let Err(err) = self.table.start_hand() {
            log::warn!("Table {}: next hand not dealt: {}", self.id, err);
        }
    }

    fn get_state(&self) -> TableStateResponse {
        let settings = self.table.settings();
        TableStateResponse {
            table_id: self.id,
            table_name: self.config.name.clone(),
            player_count: self.table.num_occupied(),
            max_seats: self.table.seats().len(),
            spectator_count: self.sessions.spectator_count(),
            small_blind: settings.blinds.small,
            big_blind: settings.blinds.big,
            pot_size: self.table.pot_total(),
            is_running: self.table.is_running(),
            phase: self.table.phase(),
            hands_played: self.table.hands_played(),
            players: self
                .table
                .seats()
                .iter()
                .filter_map(|seat| seat.name())
                .map(ToString::to_string)
                .collect(),
        }
    }
}
