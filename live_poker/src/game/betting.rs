//! One street of betting.
//!
//! A [`BettingRound`] only tracks who has acted and what the price is. The
//! chips themselves live on the [`Seat`]s, which the round borrows while
//! applying an action.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};
use thiserror::Error;

use super::{
    entities::{Action, ActionChoice, ActionChoices, Chips, Seat, SeatIndex, SeatStatus},
    state_machine::UserError,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Preflop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => None,
        }
    }

    /// Board size once this street's cards are out.
    #[must_use]
    pub fn board_len(self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River => 5,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IllegalReason {
    #[error("can't check facing a bet of {to_call}")]
    CheckFacingBet { to_call: Chips },
    #[error("nothing to call")]
    NothingToCall,
    #[error("can't bet into an open bet, raise instead")]
    BetFacingBet,
    #[error("nothing to raise, bet instead")]
    RaiseWithoutBet,
    #[error("bet must be at least {min}")]
    BelowMinimumBet { min: Chips },
    #[error("raise must be to at least {min}")]
    BelowMinimumRaise { min: Chips },
    #[error("raising isn't reopened after a short all-in")]
    RaiseNotReopened,
}

impl From<IllegalReason> for UserError {
    fn from(value: IllegalReason) -> Self {
        Self::IllegalAction(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundState {
    AwaitingAction(SeatIndex),
    Closed,
}

/// What an accepted action actually did. Bet and raise totals are the
/// clamped amounts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AppliedAction {
    pub seat: SeatIndex,
    pub action: Action,
    /// Chips moved from the stack by this action.
    pub chips: Chips,
    pub all_in: bool,
}

#[derive(Clone, Debug)]
pub struct BettingRound {
    street: Street,
    current_bet: Chips,
    /// Size of the last full bet or raise this street.
    min_raise: Chips,
    big_blind: Chips,
    /// Seats that acted since the last full raise.
    acted: BTreeSet<SeatIndex>,
    state: RoundState,
}

impl BettingRound {
    /// Opens a street. Commitments already on the seats (blinds) set the
    /// price; preflop the price is at least the big blind even when the
    /// big blind seat was short. The first seat needing action at or after
    /// `first_to_act` is up.
    #[must_use]
    pub fn new(street: Street, seats: &[Seat], first_to_act: SeatIndex, big_blind: Chips) -> Self {
        let posted = seats.iter().map(|seat| seat.committed).max().unwrap_or(0);
        let current_bet = match street {
            Street::Preflop => posted.max(big_blind),
            _ => posted,
        };
        let mut round = Self {
            street,
            current_bet,
            min_raise: big_blind,
            big_blind,
            acted: BTreeSet::new(),
            state: RoundState::Closed,
        };
        round.state = round.next_state(seats, first_to_act);
        round
    }

    #[must_use]
    pub fn street(&self) -> Street {
        self.street
    }

    #[must_use]
    pub fn state(&self) -> RoundState {
        self.state
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == RoundState::Closed
    }

    #[must_use]
    pub fn acting_seat(&self) -> Option<SeatIndex> {
        match self.state {
            RoundState::AwaitingAction(seat) => Some(seat),
            RoundState::Closed => None,
        }
    }

    #[must_use]
    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    #[must_use]
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }

    fn needs_action(&self, seat: &Seat, num_can_act: usize) -> bool {
        seat.can_act()
            && (seat.committed < self.current_bet
                || (!self.acted.contains(&seat.idx) && num_can_act >= 2))
    }

    /// Scan clockwise from `start` (inclusive) for the next seat owing
    /// action.
    fn next_state(&self, seats: &[Seat], start: SeatIndex) -> RoundState {
        let num_live = seats.iter().filter(|seat| seat.is_live()).count();
        if num_live <= 1 || seats.is_empty() {
            return RoundState::Closed;
        }
        let num_can_act = seats.iter().filter(|seat| seat.can_act()).count();
        (0..seats.len())
            .map(|offset| (start + offset) % seats.len())
            .find(|&idx| self.needs_action(&seats[idx], num_can_act))
            .map_or(RoundState::Closed, RoundState::AwaitingAction)
    }

    /// Choices open to `seat`, or `None` when it isn't that seat's turn.
    #[must_use]
    pub fn legal_actions(&self, seats: &[Seat], seat_idx: SeatIndex) -> Option<ActionChoices> {
        if self.acting_seat() != Some(seat_idx) {
            return None;
        }
        let seat = seats.get(seat_idx)?;
        let max_to = seat.committed + seat.stack;
        let mut choices = vec![ActionChoice::Fold];
        if seat.committed == self.current_bet {
            choices.push(ActionChoice::Check);
        } else {
            let to_call = (self.current_bet - seat.committed).min(seat.stack);
            choices.push(ActionChoice::Call { amount: to_call });
        }
        if self.current_bet == 0 {
            if seat.stack > 0 {
                choices.push(ActionChoice::Bet {
                    min: self.big_blind.min(max_to),
                    max: max_to,
                });
            }
        } else if max_to > self.current_bet && !self.acted.contains(&seat_idx) {
            choices.push(ActionChoice::Raise {
                min: (self.current_bet + self.min_raise).min(max_to),
                max: max_to,
            });
        }
        Some(ActionChoices::from(choices))
    }

    /// Validates and applies an action for the acting seat. Rejected
    /// actions leave both the round and the seats untouched.
    pub fn apply(
        &mut self,
        seats: &mut [Seat],
        seat_idx: SeatIndex,
        action: Action,
    ) -> Result<AppliedAction, UserError> {
        let RoundState::AwaitingAction(acting) = self.state else {
            return Err(UserError::NoActionPending);
        };
        if acting != seat_idx {
            return Err(UserError::NotYourTurn);
        }
        let seat = seats.get_mut(seat_idx).ok_or(UserError::NotSeated)?;

        let (action, chips) = match action {
            Action::Fold => {
                seat.status = SeatStatus::Folded;
                (Action::Fold, 0)
            }
            Action::Check => {
                if seat.committed != self.current_bet {
                    return Err(IllegalReason::CheckFacingBet {
                        to_call: self.current_bet - seat.committed,
                    }
                    .into());
                }
                (Action::Check, 0)
            }
            Action::Call => {
                if seat.committed >= self.current_bet {
                    return Err(IllegalReason::NothingToCall.into());
                }
                (Action::Call, seat.commit(self.current_bet - seat.committed))
            }
            Action::Bet(to) => {
                if self.current_bet > 0 {
                    return Err(IllegalReason::BetFacingBet.into());
                }
                let to = self.validate_total(seat, to, self.big_blind, |min| {
                    IllegalReason::BelowMinimumBet { min }
                })?;
                (Action::Bet(to), self.raise_to(seat, to))
            }
            Action::Raise(to) => {
                if self.current_bet == 0 {
                    return Err(IllegalReason::RaiseWithoutBet.into());
                }
                if self.acted.contains(&seat_idx) {
                    return Err(IllegalReason::RaiseNotReopened.into());
                }
                let min_to = self.current_bet + self.min_raise;
                let to = self.validate_total(seat, to, min_to, |min| {
                    IllegalReason::BelowMinimumRaise { min }
                })?;
                (Action::Raise(to), self.raise_to(seat, to))
            }
        };

        let all_in = seat.status == SeatStatus::AllIn && chips > 0;
        self.acted.insert(seat_idx);
        self.state = self.next_state(seats, seat_idx + 1);
        Ok(AppliedAction {
            seat: seat_idx,
            action,
            chips,
            all_in,
        })
    }

    /// Clamps `to` to the seat's all-in total and checks it against the
    /// minimum. Going all-in is always allowed as long as it puts more in
    /// than the current price.
    fn validate_total(
        &self,
        seat: &Seat,
        to: Chips,
        min_to: Chips,
        below_min: impl Fn(Chips) -> IllegalReason,
    ) -> Result<Chips, IllegalReason> {
        let max_to = seat.committed + seat.stack;
        let to = to.min(max_to);
        let is_all_in = to == max_to;
        if to <= self.current_bet || (to < min_to && !is_all_in) {
            return Err(below_min(min_to.min(max_to)));
        }
        Ok(to)
    }

    fn raise_to(&mut self, seat: &mut Seat, to: Chips) -> Chips {
        let raise_size = to - self.current_bet;
        let chips = seat.commit(to - seat.committed);
        if raise_size >= self.min_raise {
            self.min_raise = raise_size;
            self.acted.clear();
        }
        self.current_bet = to;
        chips
    }
}
