//! Table orchestration.
//!
//! A [`Table`] owns its seats and the hand in progress. Every mutation goes
//! through a method that validates the caller, applies the change, and
//! then advances the hand as far as it can go without player input
//! (closing streets, dealing run-outs, settling the pot). Narration for
//! each step is queued as [`GameEvent`]s for the caller to drain.

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
};
use thiserror::Error;

use super::{
    betting::{AppliedAction, BettingRound, IllegalReason, Street},
    constants::{self, MAX_SEATS},
    entities::{
        Action, ActionChoices, Blinds, Card, Chips, Deck, DeckExhausted, DisplayName, Occupant,
        Rank, Seat, SeatIndex, SeatStatus,
    },
    functional,
    pot::{self, Pot},
};

pub const DEFAULT_BUY_IN: Chips = 200;
pub const DEFAULT_SMALL_BLIND: Chips = 1;
pub const DEFAULT_BIG_BLIND: Chips = 2;

/// Errors returned to whoever asked for a change. None of them leave the
/// table modified.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("illegal action: {0}")]
    IllegalAction(IllegalReason),
    #[error("not your turn")]
    NotYourTurn,
    #[error("malformed action: {0}")]
    MalformedAction(String),
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("seat {0} is unavailable")]
    SeatUnavailable(SeatIndex),
    #[error("not seated")]
    NotSeated,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("no action pending")]
    NoActionPending,
}

impl UserError {
    /// Stable name used as the `kind` of protocol error replies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IllegalAction(_) => "IllegalAction",
            Self::NotYourTurn => "NotYourTurn",
            Self::MalformedAction(_) => "MalformedAction",
            Self::DeckExhausted => "DeckExhausted",
            Self::SeatUnavailable(_) => "SeatUnavailable",
            Self::NotSeated => "NotSeated",
            Self::NotEnoughPlayers => "NotEnoughPlayers",
            Self::GameAlreadyInProgress => "GameAlreadyInProgress",
            Self::NoActionPending => "NoActionPending",
        }
    }
}

impl From<DeckExhausted> for UserError {
    fn from(_: DeckExhausted) -> Self {
        Self::DeckExhausted
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandPhase {
    WaitingForPlayers,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    HandComplete,
}

impl HandPhase {
    #[must_use]
    pub fn is_betting(self) -> bool {
        matches!(self, Self::Preflop | Self::Flop | Self::Turn | Self::River)
    }
}

impl From<Street> for HandPhase {
    fn from(street: Street) -> Self {
        match street {
            Street::Preflop => Self::Preflop,
            Street::Flop => Self::Flop,
            Street::Turn => Self::Turn,
            Street::River => Self::River,
        }
    }
}

impl fmt::Display for HandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WaitingForPlayers => "waiting for players",
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::HandComplete => "hand complete",
        };
        write!(f, "{repr}")
    }
}

/// Narration of everything that happens at a table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum GameEvent {
    Joined { seat: SeatIndex, name: DisplayName },
    Rejoined { seat: SeatIndex, name: DisplayName },
    Disconnected { seat: SeatIndex, name: DisplayName },
    LeavingAfterHand { seat: SeatIndex, name: DisplayName },
    Left { seat: SeatIndex, name: DisplayName },
    Busted { seat: SeatIndex, name: DisplayName },
    HandStarted { number: u64, button: SeatIndex },
    PostedBlind { seat: SeatIndex, amount: Chips, big: bool },
    Acted { seat: SeatIndex, action: Action, chips: Chips, all_in: bool },
    TimedOut { seat: SeatIndex },
    Returned { seat: SeatIndex, amount: Chips },
    Dealt { street: Street, cards: Vec<Card> },
    Showed { seat: SeatIndex, cards: [Card; 2], rank: Rank },
    Won { seat: SeatIndex, amount: Chips, rank: Option<Rank> },
    HandAborted { reason: String },
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Joined { seat, name } => format!("{name} sits down in seat {seat}"),
            Self::Rejoined { seat, name } => format!("{name} is back in seat {seat}"),
            Self::Disconnected { seat, name } => format!("{name} in seat {seat} disconnected"),
            Self::LeavingAfterHand { seat, name } => {
                format!("{name} will leave seat {seat} after this hand")
            }
            Self::Left { seat, name } => format!("{name} leaves seat {seat}"),
            Self::Busted { seat, name } => format!("{name} in seat {seat} is out of chips"),
            Self::HandStarted { number, button } => {
                format!("Hand #{number}, button on seat {button}")
            }
            Self::PostedBlind { seat, amount, big } => {
                let blind = if *big { "big" } else { "small" };
                format!("Seat {seat} posts the {blind} blind of {amount}")
            }
            Self::Acted {
                seat,
                action,
                chips,
                all_in,
            } => {
                let repr = match action {
                    Action::Call => format!("Seat {seat} calls {chips}"),
                    action => format!("Seat {seat} {action}"),
                };
                if *all_in {
                    format!("{repr} and is all-in")
                } else {
                    repr
                }
            }
            Self::TimedOut { seat } => format!("Seat {seat} ran out of time"),
            Self::Returned { seat, amount } => {
                format!("Uncalled {amount} returned to seat {seat}")
            }
            Self::Dealt { street, cards } => {
                let street = match street {
                    Street::Preflop => "Preflop",
                    Street::Flop => "Flop",
                    Street::Turn => "Turn",
                    Street::River => "River",
                };
                format!("{street}: {}", join_cards(cards))
            }
            Self::Showed { seat, cards, rank } => {
                format!("Seat {seat} shows {} for {rank}", join_cards(cards))
            }
            Self::Won {
                seat,
                amount,
                rank: Some(rank),
            } => format!("Seat {seat} wins {amount} with {rank}"),
            Self::Won {
                seat,
                amount,
                rank: None,
            } => format!("Seat {seat} wins {amount}"),
            Self::HandAborted { reason } => format!("Hand aborted: {reason}"),
        };
        write!(f, "{repr}")
    }
}

/// Per-table game settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_seats: usize,
    pub blinds: Blinds,
    pub buy_in: Chips,
    /// Fixed shuffle seed source for reproducible games. Fresh OS entropy
    /// when unset.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_seats: MAX_SEATS,
            blinds: Blinds {
                small: DEFAULT_SMALL_BLIND,
                big: DEFAULT_BIG_BLIND,
            },
            buy_in: DEFAULT_BUY_IN,
            seed: None,
        }
    }
}

/// A finished hand, kept for the table's history.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HandSummary {
    pub number: u64,
    pub board: Vec<Card>,
    pub pot: Chips,
    pub winners: Vec<(SeatIndex, Chips)>,
    pub showdown: bool,
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SitOutcome {
    Seated,
    /// A disconnected occupant with the same name took their seat back.
    Reclaimed,
}

/// The hand currently being played.
#[derive(Debug)]
pub struct HandState {
    number: u64,
    deck: Deck,
    board: Vec<Card>,
    hole_cards: BTreeMap<SeatIndex, [Card; 2]>,
    round: Option<BettingRound>,
    street: Street,
    button: SeatIndex,
    small_blind_seat: SeatIndex,
    big_blind_seat: SeatIndex,
    revealed: BTreeSet<SeatIndex>,
}

impl HandState {
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    #[must_use]
    pub fn street(&self) -> Street {
        self.street
    }

    #[must_use]
    pub fn hole_cards(&self, seat: SeatIndex) -> Option<&[Card; 2]> {
        self.hole_cards.get(&seat)
    }

    /// Whether the seat's hole cards were shown at showdown.
    #[must_use]
    pub fn is_revealed(&self, seat: SeatIndex) -> bool {
        self.revealed.contains(&seat)
    }

    /// Drops a vacated seat's cards so the next occupant never sees them.
    fn forget_seat(&mut self, seat: SeatIndex) {
        self.hole_cards.remove(&seat);
        self.revealed.remove(&seat);
    }

    #[must_use]
    pub fn button(&self) -> SeatIndex {
        self.button
    }

    #[must_use]
    pub fn small_blind_seat(&self) -> SeatIndex {
        self.small_blind_seat
    }

    #[must_use]
    pub fn big_blind_seat(&self) -> SeatIndex {
        self.big_blind_seat
    }

    #[must_use]
    pub fn round(&self) -> Option<&BettingRound> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }
}

/// Deals hole cards one at a time around the table, starting with the
/// first seat in `order`.
fn deal_hole_cards(
    deck: &mut Deck,
    order: &[SeatIndex],
) -> Result<BTreeMap<SeatIndex, [Card; 2]>, DeckExhausted> {
    let mut first_cards = Vec::with_capacity(order.len());
    for _ in order {
        first_cards.push(deck.deal()?);
    }
    let mut hole_cards = BTreeMap::new();
    for (&seat, first) in order.iter().zip(first_cards) {
        hole_cards.insert(seat, [first, deck.deal()?]);
    }
    Ok(hole_cards)
}

#[derive(Debug)]
pub struct Table {
    settings: GameSettings,
    seats: Vec<Seat>,
    phase: HandPhase,
    hand: Option<HandState>,
    button: Option<SeatIndex>,
    running: bool,
    hands_played: u64,
    rng: StdRng,
    history: VecDeque<HandSummary>,
    events: VecDeque<GameEvent>,
}

impl Table {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let max_seats = settings.max_seats.clamp(constants::MIN_PLAYERS, MAX_SEATS);
        Self {
            seats: (0..max_seats).map(Seat::new).collect(),
            settings,
            phase: HandPhase::WaitingForPlayers,
            hand: None,
            button: None,
            running: false,
            hands_played: 0,
            rng,
            history: VecDeque::with_capacity(constants::HISTORY_LEN),
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    #[must_use]
    pub fn seat(&self, seat: SeatIndex) -> Option<&Seat> {
        self.seats.get(seat)
    }

    #[must_use]
    pub fn phase(&self) -> HandPhase {
        self.phase
    }

    #[must_use]
    pub fn hand(&self) -> Option<&HandState> {
        self.hand.as_ref()
    }

    #[must_use]
    pub fn button(&self) -> Option<SeatIndex> {
        self.button
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn hands_played(&self) -> u64 {
        self.hands_played
    }

    #[must_use]
    pub fn history(&self) -> &VecDeque<HandSummary> {
        &self.history
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        match &self.hand {
            Some(hand) => &hand.board,
            None => &[],
        }
    }

    #[must_use]
    pub fn num_occupied(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_occupied()).count()
    }

    /// Everything put in this hand, including the current street.
    #[must_use]
    pub fn pot_total(&self) -> Chips {
        self.seats.iter().map(|seat| seat.contributed).sum()
    }

    /// Current main and side pots.
    #[must_use]
    pub fn pots(&self) -> Vec<Pot> {
        let contributions = self.contributions();
        let live = self.live_seats();
        pot::compute_pots(&contributions, &live)
    }

    #[must_use]
    pub fn acting_seat(&self) -> Option<SeatIndex> {
        if !self.phase.is_betting() {
            return None;
        }
        self.hand
            .as_ref()
            .and_then(|hand| hand.round.as_ref())
            .and_then(BettingRound::acting_seat)
    }

    /// Price of the current street, zero when nobody has bet.
    #[must_use]
    pub fn current_bet(&self) -> Chips {
        self.hand
            .as_ref()
            .and_then(|hand| hand.round.as_ref())
            .map_or(0, BettingRound::current_bet)
    }

    #[must_use]
    pub fn legal_actions(&self, seat: SeatIndex) -> Option<ActionChoices> {
        if !self.phase.is_betting() {
            return None;
        }
        self.hand
            .as_ref()
            .and_then(|hand| hand.round.as_ref())
            .and_then(|round| round.legal_actions(&self.seats, seat))
    }

    /// Seats that would be dealt in if a hand started now.
    #[must_use]
    pub fn eligible_seats(&self) -> Vec<SeatIndex> {
        self.seats
            .iter()
            .filter(|seat| seat.stack > 0 && seat.is_occupied() && !seat.is_away())
            .map(|seat| seat.idx)
            .collect()
    }

    #[must_use]
    pub fn can_start_hand(&self) -> bool {
        self.phase == HandPhase::WaitingForPlayers
            && self.eligible_seats().len() >= constants::MIN_PLAYERS
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn contributions(&self) -> BTreeMap<SeatIndex, Chips> {
        self.seats
            .iter()
            .filter(|seat| seat.contributed > 0)
            .map(|seat| (seat.idx, seat.contributed))
            .collect()
    }

    fn live_seats(&self) -> BTreeSet<SeatIndex> {
        self.seats
            .iter()
            .filter(|seat| seat.is_live())
            .map(|seat| seat.idx)
            .collect()
    }

    /// First seat clockwise after `from` (wrapping around to `from` last)
    /// that satisfies `pred`.
    fn next_seat_after(&self, from: SeatIndex, pred: impl Fn(&Seat) -> bool) -> Option<SeatIndex> {
        let num_seats = self.seats.len();
        (1..=num_seats)
            .map(|offset| (from + offset) % num_seats)
            .find(|&idx| pred(&self.seats[idx]))
    }

    /// Takes an open seat, or gives a disconnected occupant their seat
    /// back. New occupants sit out until the next hand starts.
    pub fn sit(&mut self, seat_idx: SeatIndex, name: DisplayName) -> Result<SitOutcome, UserError> {
        let seat = self
            .seats
            .get_mut(seat_idx)
            .ok_or(UserError::SeatUnavailable(seat_idx))?;
        match seat.occupant.as_mut() {
            Some(occupant) if !occupant.connected && occupant.name == name => {
                occupant.connected = true;
                occupant.leaving = false;
                self.events.push_back(GameEvent::Rejoined {
                    seat: seat_idx,
                    name,
                });
                Ok(SitOutcome::Reclaimed)
            }
            Some(_) => Err(UserError::SeatUnavailable(seat_idx)),
            None => {
                seat.occupant = Some(Occupant {
                    name: name.clone(),
                    connected: true,
                    leaving: false,
                });
                seat.stack = self.settings.buy_in;
                seat.status = SeatStatus::SittingOut;
                self.events.push_back(GameEvent::Joined {
                    seat: seat_idx,
                    name,
                });
                Ok(SitOutcome::Seated)
            }
        }
    }

    /// Vacates a seat. A seat dealt into the current hand is only marked;
    /// it's folded when its turn comes and vacated once the hand is over.
    pub fn leave(&mut self, seat_idx: SeatIndex) -> Result<(), UserError> {
        let in_hand = self.phase.is_betting();
        let seat = self
            .seats
            .get_mut(seat_idx)
            .filter(|seat| seat.is_occupied())
            .ok_or(UserError::NotSeated)?;
        let name = seat.name().cloned().unwrap_or_default();
        if in_hand && seat.status != SeatStatus::SittingOut {
            if let Some(occupant) = seat.occupant.as_mut() {
                occupant.leaving = true;
                occupant.connected = false;
            }
            self.events.push_back(GameEvent::LeavingAfterHand {
                seat: seat_idx,
                name,
            });
            self.advance();
        } else {
            seat.vacate();
            if let Some(hand) = self.hand.as_mut() {
                hand.forget_seat(seat_idx);
            }
            self.events.push_back(GameEvent::Left {
                seat: seat_idx,
                name,
            });
            if self.num_occupied() == 0 {
                self.running = false;
            }
        }
        Ok(())
    }

    /// Tracks whether a seat's occupant has a live connection. Losing the
    /// connection keeps the seat; if it's the seat's turn it is acted for
    /// right away.
    pub fn set_connected(&mut self, seat_idx: SeatIndex, connected: bool) {
        let Some(seat) = self.seats.get_mut(seat_idx) else {
            return;
        };
        let Some(occupant) = seat.occupant.as_mut() else {
            return;
        };
        if occupant.connected == connected {
            return;
        }
        occupant.connected = connected;
        if !connected {
            self.events.push_back(GameEvent::Disconnected {
                seat: seat_idx,
                name: occupant.name.clone(),
            });
            self.advance();
        }
    }

    /// Starts play at the table on request from a seated player.
    pub fn start_game(&mut self, seat_idx: SeatIndex) -> Result<(), UserError> {
        if !self.seats.get(seat_idx).is_some_and(Seat::is_occupied) {
            return Err(UserError::NotSeated);
        }
        if self.running || self.phase != HandPhase::WaitingForPlayers {
            return Err(UserError::GameAlreadyInProgress);
        }
        if self.eligible_seats().len() < constants::MIN_PLAYERS {
            return Err(UserError::NotEnoughPlayers);
        }
        self.running = true;
        self.start_hand()
    }

    /// Moves the button, posts blinds, deals hole cards and opens preflop
    /// betting.
    pub fn start_hand(&mut self) -> Result<(), UserError> {
        if self.phase != HandPhase::WaitingForPlayers {
            return Err(UserError::GameAlreadyInProgress);
        }
        let eligible = self.eligible_seats();
        if eligible.len() < constants::MIN_PLAYERS {
            return Err(UserError::NotEnoughPlayers);
        }
        for seat in &mut self.seats {
            seat.reset_for_hand();
            if eligible.contains(&seat.idx) {
                seat.status = SeatStatus::Active;
            }
        }

        let button = self
            .button
            .and_then(|prev| self.next_seat_after(prev, Seat::can_act))
            .or_else(|| eligible.first().copied())
            .ok_or(UserError::NotEnoughPlayers)?;
        // Heads-up the button posts the small blind.
        let small_blind_seat = if eligible.len() == 2 {
            button
        } else {
            self.next_seat_after(button, Seat::can_act)
                .ok_or(UserError::NotEnoughPlayers)?
        };
        let big_blind_seat = self
            .next_seat_after(small_blind_seat, Seat::can_act)
            .ok_or(UserError::NotEnoughPlayers)?;

        self.button = Some(button);
        self.hands_played += 1;
        let number = self.hands_played;
        let mut deck = Deck::new_shuffled(self.rng.random());
        info!("hand #{number} starting with {} seats", eligible.len());
        self.events
            .push_back(GameEvent::HandStarted { number, button });

        let blinds = self.settings.blinds;
        for (seat, amount, big) in [
            (small_blind_seat, blinds.small, false),
            (big_blind_seat, blinds.big, true),
        ] {
            let amount = self.seats[seat].commit(amount);
            self.events
                .push_back(GameEvent::PostedBlind { seat, amount, big });
        }

        let num_seats = self.seats.len();
        let order: Vec<SeatIndex> = (0..num_seats)
            .map(|offset| (small_blind_seat + offset) % num_seats)
            .filter(|&idx| self.seats[idx].is_live())
            .collect();
        let hole_cards = match deal_hole_cards(&mut deck, &order) {
            Ok(hole_cards) => hole_cards,
            Err(err) => {
                error!("hand #{number}: {err} while dealing hole cards");
                self.abort_hand(&err.to_string());
                return Err(err.into());
            }
        };

        let first_to_act = (big_blind_seat + 1) % num_seats;
        let round = BettingRound::new(Street::Preflop, &self.seats, first_to_act, blinds.big);
        self.hand = Some(HandState {
            number,
            deck,
            board: Vec::with_capacity(constants::BOARD_CARDS),
            hole_cards,
            round: Some(round),
            street: Street::Preflop,
            button,
            small_blind_seat,
            big_blind_seat,
            revealed: BTreeSet::new(),
        });
        self.phase = HandPhase::Preflop;
        self.advance();
        Ok(())
    }

    /// Applies an action from the acting seat and advances the hand.
    pub fn act(&mut self, seat: SeatIndex, action: Action) -> Result<(), UserError> {
        self.apply_action(seat, action)?;
        self.advance();
        Ok(())
    }

    /// Acts for a seat whose time ran out: check when free, fold otherwise.
    pub fn auto_act(&mut self, seat: SeatIndex) -> Result<Action, UserError> {
        if self.acting_seat() != Some(seat) {
            return Err(UserError::NoActionPending);
        }
        let action = self.fallback_action(seat);
        self.events.push_back(GameEvent::TimedOut { seat });
        self.act(seat, action)?;
        Ok(action)
    }

    fn fallback_action(&self, seat: SeatIndex) -> Action {
        let leaving = self
            .seats
            .get(seat)
            .and_then(|seat| seat.occupant.as_ref())
            .is_some_and(|occupant| occupant.leaving);
        let can_check = self
            .legal_actions(seat)
            .is_some_and(|choices| choices.contains(&Action::Check));
        if can_check && !leaving {
            Action::Check
        } else {
            Action::Fold
        }
    }

    fn apply_action(&mut self, seat: SeatIndex, action: Action) -> Result<AppliedAction, UserError> {
        if !self.phase.is_betting() {
            return Err(UserError::NoActionPending);
        }
        let round = self
            .hand
            .as_mut()
            .and_then(|hand| hand.round.as_mut())
            .ok_or(UserError::NoActionPending)?;
        let applied = round.apply(&mut self.seats, seat, action)?;
        debug!("seat {seat}: {:?}", applied.action);
        self.events.push_back(GameEvent::Acted {
            seat,
            action: applied.action,
            chips: applied.chips,
            all_in: applied.all_in,
        });
        Ok(applied)
    }

    /// Runs the hand forward until it needs a connected player to act or
    /// it's over.
    fn advance(&mut self) {
        while self.phase.is_betting() {
            let live = self.live_seats();
            if live.len() <= 1 {
                self.finish_uncontested(live.first().copied());
                return;
            }
            let acting = self
                .hand
                .as_ref()
                .and_then(|hand| hand.round.as_ref())
                .and_then(BettingRound::acting_seat);
            match acting {
                Some(seat) if self.seats[seat].is_away() => {
                    let action = self.fallback_action(seat);
                    if let Err(err) = self.apply_action(seat, action) {
                        error!("auto {action:?} for seat {seat} rejected: {err}");
                        return;
                    }
                }
                Some(_) => return,
                None => {
                    if let Err(err) = self.close_street() {
                        error!("{err} while dealing the board");
                        self.abort_hand(&err.to_string());
                        return;
                    }
                }
            }
        }
    }

    /// Returns the uncalled part of the street's biggest commitment to its
    /// owner.
    fn return_uncalled(&mut self) {
        let mut commitments: Vec<(Chips, SeatIndex)> = self
            .seats
            .iter()
            .filter(|seat| seat.committed > 0)
            .map(|seat| (seat.committed, seat.idx))
            .collect();
        commitments.sort_unstable_by(|a, b| b.cmp(a));
        let Some(&(top, seat)) = commitments.first() else {
            return;
        };
        let second = commitments.get(1).map_or(0, |&(committed, _)| committed);
        if top > second {
            let amount = top - second;
            self.seats[seat].refund(amount);
            self.events.push_back(GameEvent::Returned { seat, amount });
        }
    }

    /// Ends the current street and either deals the next one or goes to
    /// showdown after the river.
    fn close_street(&mut self) -> Result<(), DeckExhausted> {
        self.return_uncalled();
        for seat in &mut self.seats {
            seat.committed = 0;
        }
        let num_seats = self.seats.len();
        let Some(hand) = self.hand.as_mut() else {
            return Ok(());
        };
        let Some(next) = hand.street.next() else {
            hand.round = None;
            self.showdown();
            return Ok(());
        };

        hand.deck.burn()?;
        let mut cards = Vec::with_capacity(3);
        while hand.board.len() < next.board_len() {
            let card = hand.deck.deal()?;
            hand.board.push(card);
            cards.push(card);
        }
        hand.street = next;
        let first_to_act = (hand.button + 1) % num_seats;
        hand.round = Some(BettingRound::new(
            next,
            &self.seats,
            first_to_act,
            self.settings.blinds.big,
        ));
        self.phase = next.into();
        self.events
            .push_back(GameEvent::Dealt { street: next, cards });
        Ok(())
    }

    /// Every other seat folded. The winner takes the pot without showing.
    fn finish_uncontested(&mut self, winner: Option<SeatIndex>) {
        self.return_uncalled();
        let pot = self.pot_total();
        let mut winnings = BTreeMap::new();
        if let Some(seat) = winner {
            self.seats[seat].stack += pot;
            winnings.insert(seat, pot);
            self.events.push_back(GameEvent::Won {
                seat,
                amount: pot,
                rank: None,
            });
        }
        self.complete_hand(winnings, false);
    }

    fn showdown(&mut self) {
        self.phase = HandPhase::Showdown;
        let live = self.live_seats();
        let contributions = self.contributions();
        let num_seats = self.seats.len();
        let Some(hand) = self.hand.as_mut() else {
            return;
        };

        let mut ranks = BTreeMap::new();
        for &seat in &live {
            let Some(hole) = hand.hole_cards.get(&seat).copied() else {
                continue;
            };
            let mut cards = hand.board.clone();
            cards.extend_from_slice(&hole);
            match functional::evaluate(&cards) {
                Ok(rank) => {
                    ranks.insert(seat, rank);
                    hand.revealed.insert(seat);
                    self.events.push_back(GameEvent::Showed {
                        seat,
                        cards: hole,
                        rank: rank.rank,
                    });
                }
                Err(err) => error!("hand #{}: seat {seat} can't be evaluated: {err}", hand.number),
            }
        }

        let pots = pot::compute_pots(&contributions, &live);
        let winnings = pot::award_pots(&pots, &ranks, hand.button, num_seats);
        for (&seat, &amount) in &winnings {
            self.seats[seat].stack += amount;
            self.events.push_back(GameEvent::Won {
                seat,
                amount,
                rank: ranks.get(&seat).map(|rank| rank.rank),
            });
        }
        self.complete_hand(winnings, true);
    }

    fn complete_hand(&mut self, winnings: BTreeMap<SeatIndex, Chips>, showdown: bool) {
        let pot = self.pot_total();
        for seat in &mut self.seats {
            seat.committed = 0;
            seat.contributed = 0;
        }
        let (number, board) = match self.hand.as_mut() {
            Some(hand) => {
                hand.round = None;
                (hand.number, hand.board.clone())
            }
            None => (self.hands_played, Vec::new()),
        };
        info!("hand #{number} complete, pot {pot}");
        if self.history.len() == constants::HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(HandSummary {
            number,
            board,
            pot,
            winners: winnings.into_iter().collect(),
            showdown,
            completed_at: Utc::now(),
        });
        self.phase = HandPhase::HandComplete;
    }

    /// Clears a completed hand so the next one can start: vacates seats
    /// whose occupant left and sits out everyone else until dealt in.
    pub fn finish_hand(&mut self) {
        if self.phase != HandPhase::HandComplete {
            return;
        }
        self.hand = None;
        for seat in &mut self.seats {
            let Some(occupant) = seat.occupant.as_ref() else {
                continue;
            };
            let name = occupant.name.clone();
            if occupant.leaving {
                seat.vacate();
                self.events
                    .push_back(GameEvent::Left { seat: seat.idx, name });
                continue;
            }
            seat.status = SeatStatus::SittingOut;
            if seat.stack == 0 {
                self.events
                    .push_back(GameEvent::Busted { seat: seat.idx, name });
            }
        }
        if self.num_occupied() == 0 {
            self.running = false;
        }
        self.phase = HandPhase::WaitingForPlayers;
    }

    /// Gives every seat back what it put in and drops the hand.
    fn abort_hand(&mut self, reason: &str) {
        for seat in &mut self.seats {
            seat.stack += seat.contributed;
            seat.committed = 0;
            seat.contributed = 0;
            seat.status = SeatStatus::SittingOut;
        }
        self.hand = None;
        self.phase = HandPhase::WaitingForPlayers;
        self.events.push_back(GameEvent::HandAborted {
            reason: reason.to_string(),
        });
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}
