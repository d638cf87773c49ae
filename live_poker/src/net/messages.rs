//! Messages exchanged over a table's websocket.
//!
//! Every frame is a JSON text frame shaped `{"event": <name>, "data":
//! <payload>}`. Messages without a payload may leave `data` out.

use serde::{Deserialize, Deserializer, Serialize, de};
use std::{fmt, str::FromStr};

use super::errors::{ProtocolError, Result};
use crate::game::{
    UserError,
    constants::MAX_MESSAGE_BYTES,
    entities::{Card, Chips, SeatIndex},
    views::{SeatView, TurnView},
};

/// Accepts either a JSON number or a string holding one. Browser form
/// inputs frequently send numbers as strings.
fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString<T> {
        Number(T),
        String(String),
    }

    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JoinRequest {
    #[serde(alias = "position", deserialize_with = "number_or_string")]
    pub seat: SeatIndex,
    #[serde(rename = "displayName", alias = "name")]
    pub display_name: String,
}

/// `amount` is the street total to bet or raise to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BetRequest {
    #[serde(alias = "bet", deserialize_with = "number_or_string")]
    pub amount: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChatRequest {
    #[serde(alias = "message")]
    pub text: String,
}

/// A message from a browser client to its table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Take a seat, or reclaim one after a dropped connection.
    Join(JoinRequest),
    /// Start dealing. Only seated players can start the game.
    StartGame,
    Call,
    Check,
    Fold,
    /// Bet when nobody has bet this street, raise otherwise.
    Bet(BetRequest),
    /// Give up the seat, after the current hand if dealt in.
    Leave,
    Chat(ChatRequest),
}

impl ClientMessage {
    /// Decodes one websocket text frame.
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() > MAX_MESSAGE_BYTES {
            return Err(ProtocolError::MessageTooLarge {
                actual: text.len(),
                max: MAX_MESSAGE_BYTES,
            });
        }
        Ok(serde_json::from_str(text)?)
    }

    /// The wire event name, for labelling.
    pub fn event(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::StartGame => "startGame",
            Self::Call => "call",
            Self::Check => "check",
            Self::Fold => "fold",
            Self::Bet(_) => "bet",
            Self::Leave => "leave",
            Self::Chat(_) => "chat",
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Join(JoinRequest { seat, display_name }) => {
                write!(f, "join seat {seat} as {display_name}")
            }
            Self::StartGame => write!(f, "start game"),
            Self::Call => write!(f, "call"),
            Self::Check => write!(f, "check"),
            Self::Fold => write!(f, "fold"),
            Self::Bet(BetRequest { amount }) => write!(f, "bet {amount}"),
            Self::Leave => write!(f, "leave"),
            Self::Chat(_) => write!(f, "chat"),
        }
    }
}

/// Error reply sent only to the session that caused it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

impl From<&UserError> for ErrorReport {
    fn from(error: &UserError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// A message from a table to one browser client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// Occupied seats as this client may see them.
    #[serde(rename = "newplayer")]
    Players(Vec<SeatView>),
    /// The client's own hole cards. Empty for spectators and between hands.
    #[serde(rename = "hand")]
    Hand(Vec<Card>),
    #[serde(rename = "tablepot")]
    TablePot(Chips),
    #[serde(rename = "tablecards")]
    TableCards(Vec<Card>),
    #[serde(rename = "chatMessage")]
    ChatMessage(String),
    /// Narration of what just happened at the table.
    #[serde(rename = "gameMessage")]
    GameMessage(String),
    /// Sent to the acting seat only.
    #[serde(rename = "turn")]
    Turn(TurnView),
    #[serde(rename = "error")]
    Error(ErrorReport),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Players(seats) => write!(f, "{} seated", seats.len()),
            Self::Hand(cards) | Self::TableCards(cards) => {
                let cards: Vec<String> = cards.iter().map(ToString::to_string).collect();
                write!(f, "{}", cards.join(" "))
            }
            Self::TablePot(pot) => write!(f, "pot {pot}"),
            Self::ChatMessage(text) | Self::GameMessage(text) => write!(f, "{text}"),
            Self::Turn(turn) => write!(f, "seat {} to {}", turn.seat, turn.actions),
            Self::Error(report) => write!(f, "{}: {}", report.kind, report.message),
        }
    }
}
