use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

use super::constants;

/// Suit order follows the wire encoding where `suit = id / 13`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Spade, Self::Heart, Self::Diamond, Self::Club];

    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::Spade => 0,
            Self::Heart => 1,
            Self::Diamond => 2,
            Self::Club => 3,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values. Deuce is 2, ace is 14.
pub type Value = u8;

pub const ACE: Value = 14;
pub const DEUCE: Value = 2;

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum CardError {
    #[error("card id {0} is out of range")]
    InvalidId(u8),
}

/// A card is a tuple of a value (deuce=2u8 ... ace=14u8) and a suit.
///
/// On the wire a card is its integer id in `0..=51`: the suit is
/// `id / 13` and the value is `2 + id % 13`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(pub Value, pub Suit);

impl Card {
    pub fn from_id(id: u8) -> Result<Self, CardError> {
        if id >= 52 {
            return Err(CardError::InvalidId(id));
        }
        let suit = Suit::ALL[usize::from(id / 13)];
        Ok(Self(DEUCE + id % 13, suit))
    }

    #[must_use]
    pub fn id(&self) -> u8 {
        self.1.index() * 13 + (self.0 - DEUCE)
    }
}

impl TryFrom<u8> for Card {
    type Error = CardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_id(value)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> Self {
        card.id()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            11 => "J",
            12 => "Q",
            13 => "K",
            14 => "A",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "a straight",
            Self::Flush => "a flush",
            Self::FullHouse => "a full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "a straight flush",
        };
        write!(f, "{repr}")
    }
}

/// Strength of a five card hand. Ordering compares the category first and
/// then the tie-break values, highest significance first. Unused trailing
/// values are zero.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandRank {
    pub rank: Rank,
    pub values: [Value; 5],
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("deck exhausted")]
pub struct DeckExhausted;

/// A 52 card deck. Cards before `deck_idx` are gone, either dealt or
/// burned; `burned` records which of them were burned.
#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    deck_idx: usize,
    burned: Vec<Card>,
}

impl Deck {
    /// Shuffled deck. The same seed always yields the same order.
    #[must_use]
    pub fn new_shuffled(seed: u64) -> Self {
        let mut deck = Self::default();
        let mut rng = StdRng::seed_from_u64(seed);
        deck.cards.shuffle(&mut rng);
        deck
    }

    pub fn deal(&mut self) -> Result<Card, DeckExhausted> {
        let card = *self.cards.get(self.deck_idx).ok_or(DeckExhausted)?;
        self.deck_idx += 1;
        Ok(card)
    }

    pub fn burn(&mut self) -> Result<(), DeckExhausted> {
        let card = self.deal()?;
        self.burned.push(card);
        Ok(())
    }

    #[must_use]
    pub fn dealt(&self) -> Vec<Card> {
        self.cards[..self.deck_idx]
            .iter()
            .filter(|card| !self.burned.contains(card))
            .copied()
            .collect()
    }

    #[must_use]
    pub fn burned(&self) -> &[Card] {
        &self.burned
    }

    #[must_use]
    pub fn remaining(&self) -> &[Card] {
        &self.cards[self.deck_idx..]
    }
}

impl Default for Deck {
    /// Unshuffled deck in wire id order.
    fn default() -> Self {
        let mut cards = [Card(DEUCE, Suit::Spade); 52];
        for (id, card) in (0u8..52).zip(cards.iter_mut()) {
            *card = Card(DEUCE + id % 13, Suit::ALL[usize::from(id / 13)]);
        }
        Self {
            cards,
            deck_idx: 0,
            burned: Vec::with_capacity(3),
        }
    }
}

/// Type alias for whole chips. Stacks, bets and pots are all counted in
/// whole chips.
pub type Chips = u32;

/// Type alias for seat positions at a table.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Trims surrounding whitespace, replaces inner whitespace with
    /// underscores and caps the length.
    #[must_use]
    pub fn new(s: &str) -> Self {
        let name = s
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(constants::MAX_USER_INPUT_LENGTH / 2)
            .collect();
        Self(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for DisplayName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for DisplayName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.small, self.big)
    }
}

/// A betting action. `Bet` and `Raise` carry the seat's total commitment
/// for the street after the action ("raise to"), not the increment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "folds"),
            Self::Check => write!(f, "checks"),
            Self::Call => write!(f, "calls"),
            Self::Bet(amount) => write!(f, "bets {amount}"),
            Self::Raise(amount) => write!(f, "raises to {amount}"),
        }
    }
}

/// What the acting seat may do, with the amounts that make each choice
/// legal. `min` and `max` are street totals like [`Action::Bet`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionChoice {
    Fold,
    Check,
    Call { amount: Chips },
    Bet { min: Chips, max: Chips },
    Raise { min: Chips, max: Chips },
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::Check => write!(f, "check"),
            Self::Call { amount } => write!(f, "call {amount}"),
            Self::Bet { min, max } => write!(f, "bet {min}..={max}"),
            Self::Raise { min, max } => write!(f, "raise to {min}..={max}"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionChoices(pub Vec<ActionChoice>);

impl ActionChoices {
    /// Whether the action's variant is offered. Amounts are validated by
    /// the betting round, not here.
    #[must_use]
    pub fn contains(&self, action: &Action) -> bool {
        self.0.iter().any(|choice| {
            matches!(
                (choice, action),
                (ActionChoice::Fold, Action::Fold)
                    | (ActionChoice::Check, Action::Check)
                    | (ActionChoice::Call { .. }, Action::Call)
                    | (ActionChoice::Bet { .. }, Action::Bet(_))
                    | (ActionChoice::Raise { .. }, Action::Raise(_))
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionChoice> {
        self.0.iter()
    }
}

impl fmt::Display for ActionChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num_options = self.0.len();
        for (i, choice) in self.0.iter().enumerate() {
            match i {
                0 => write!(f, "{choice}")?,
                i if i == num_options - 1 => write!(f, " or {choice}")?,
                _ => write!(f, ", {choice}")?,
            }
        }
        Ok(())
    }
}

impl<I> From<I> for ActionChoices
where
    I: IntoIterator<Item = ActionChoice>,
{
    fn from(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Dealt in and still able to act.
    Active,
    Folded,
    /// Dealt in with no chips left behind.
    AllIn,
    /// Empty, waiting for the next hand, or out of chips.
    SittingOut,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::Folded => "folded",
            Self::AllIn => "all-in",
            Self::SittingOut => "sitting out",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Occupant {
    pub name: DisplayName,
    pub connected: bool,
    /// Set by an explicit leave while the seat is still in a hand.
    pub leaving: bool,
}

#[derive(Clone, Debug)]
pub struct Seat {
    pub idx: SeatIndex,
    pub occupant: Option<Occupant>,
    pub stack: Chips,
    /// Chips put in during the current street.
    pub committed: Chips,
    /// Chips put in during the whole hand, current street included.
    pub contributed: Chips,
    pub status: SeatStatus,
}

impl Seat {
    #[must_use]
    pub fn new(idx: SeatIndex) -> Self {
        Self {
            idx,
            occupant: None,
            stack: 0,
            committed: 0,
            contributed: 0,
            status: SeatStatus::SittingOut,
        }
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Dealt into the current hand and not folded.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self.status, SeatStatus::Active | SeatStatus::AllIn)
    }

    #[must_use]
    pub fn can_act(&self) -> bool {
        self.status == SeatStatus::Active
    }

    /// Occupant will not be acting on their own: disconnected or leaving.
    #[must_use]
    pub fn is_away(&self) -> bool {
        self.occupant
            .as_ref()
            .is_some_and(|occupant| !occupant.connected || occupant.leaving)
    }

    #[must_use]
    pub fn name(&self) -> Option<&DisplayName> {
        self.occupant.as_ref().map(|occupant| &occupant.name)
    }

    /// Moves up to `amount` from the stack into the pot and returns what
    /// was actually moved. Emptying the stack puts the seat all-in.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let amount = amount.min(self.stack);
        self.stack -= amount;
        self.committed += amount;
        self.contributed += amount;
        if self.stack == 0 && self.status == SeatStatus::Active {
            self.status = SeatStatus::AllIn;
        }
        amount
    }

    /// Gives back chips that were committed this street.
    pub fn refund(&mut self, amount: Chips) {
        let amount = amount.min(self.committed);
        self.committed -= amount;
        self.contributed -= amount;
        self.stack += amount;
        if amount > 0 && self.status == SeatStatus::AllIn {
            self.status = SeatStatus::Active;
        }
    }

    pub fn reset_for_hand(&mut self) {
        self.committed = 0;
        self.contributed = 0;
        self.status = SeatStatus::SittingOut;
    }

    pub fn vacate(&mut self) {
        *self = Self::new(self.idx);
    }
}
