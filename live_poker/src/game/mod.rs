//! Poker game engine.
//!
//! Leaves first: cards and seats ([`entities`]), hand evaluation
//! ([`functional`]), one street of betting ([`betting`]), pot splitting
//! ([`pot`]), the hand lifecycle ([`state_machine`]) and per-viewer
//! redaction ([`views`]).

pub mod betting;
pub mod constants;
pub mod entities;
pub mod functional;
pub mod pot;
pub mod state_machine;
pub mod views;

pub use state_machine::{GameEvent, GameSettings, HandPhase, Table, UserError};
