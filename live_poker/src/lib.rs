//! # Live Poker
//!
//! A server-side Texas Hold'em engine for browser tables that talk JSON over
//! websockets.
//!
//! Each table is owned by one async actor. Players and spectators connect
//! as sessions; after every change the actor narrates what happened and
//! pushes each session a view that only shows its own hole cards.
//!
//! ## Hand lifecycle
//!
//! - **WaitingForPlayers**: seats fill up until a seated player starts the game
//! - **Preflop**: button moves, blinds are posted, hole cards dealt
//! - **Flop/Turn/River**: a burn card, then the board, then a betting round
//! - **Showdown**: live hands are shown and main and side pots awarded
//! - **HandComplete**: the result stays on screen until the next deal
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand evaluation, betting rules, pots and the table
//! - [`net`]: Wire protocol messages and their errors
//! - [`table`]: Table actors, sessions and the multi-table manager
//!
//! ## Example
//!
//! ```
//! use live_poker::{GameSettings, Table, entities::DisplayName};
//!
//! let mut table = Table::new(GameSettings::default());
//! table.sit(0, DisplayName::new("ann")).unwrap();
//! table.sit(1, DisplayName::new("bob")).unwrap();
//! table.start_game(0).unwrap();
//! assert_eq!(table.pot_total(), 3);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameEvent, GameSettings, HandPhase, Table, UserError,
    constants, entities, functional,
};

/// Wire protocol for browser clients.
pub mod net;
pub use net::messages;

/// Table actors and their manager.
pub mod table;
pub use table::{TableConfig, TableHandle, TableManager};
