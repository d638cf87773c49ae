//! Table-wide limits.

/// Most seats a single table can hold. With 2 hole cards each, 5 board
/// cards and 3 burns this leaves 24 cards in the deck.
pub const MAX_SEATS: usize = 10;

/// Fewest funded, connected seats needed to deal a hand.
pub const MIN_PLAYERS: usize = 2;

pub const MAX_USER_INPUT_LENGTH: usize = 32;

pub const MAX_CHAT_LENGTH: usize = 256;

/// Largest inbound websocket frame the protocol layer will parse.
pub const MAX_MESSAGE_BYTES: usize = 4096;

/// Number of finished hands a table remembers.
pub const HISTORY_LEN: usize = 32;

pub const BOARD_CARDS: usize = 5;
