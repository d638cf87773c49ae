//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    GameSettings,
    constants::{MAX_SEATS, MIN_PLAYERS},
    entities::{Blinds, Chips},
    state_machine::{DEFAULT_BIG_BLIND, DEFAULT_BUY_IN, DEFAULT_SMALL_BLIND},
};

/// Table speed variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    Normal,
    Turbo,
    Hyper,
}

impl TableSpeed {
    /// Time the acting seat gets before being checked or folded.
    pub fn action_timeout(self) -> Duration {
        match self {
            TableSpeed::Normal => Duration::from_secs(30),
            TableSpeed::Turbo => Duration::from_secs(15),
            TableSpeed::Hyper => Duration::from_secs(8),
        }
    }
}

impl std::fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Number of seats (default: 10)
    pub max_seats: usize,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Chips a player sits down with
    pub buy_in: Chips,

    /// Table speed
    pub speed: TableSpeed,

    /// Overrides the speed's action timeout
    pub action_timeout_ms: Option<u64>,

    /// Pause between the end of one hand and the deal of the next
    pub hand_interval_ms: u64,

    /// Period of the actor's timer
    pub tick_ms: u64,

    /// Fixed shuffle seed, for reproducible tables
    pub seed: Option<u64>,

    /// Outbound messages buffered per connection before dropping
    pub session_buffer: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_seats: MAX_SEATS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            buy_in: DEFAULT_BUY_IN,
            speed: TableSpeed::Normal,
            action_timeout_ms: None,
            hand_interval_ms: 3_000,
            tick_ms: 250,
            seed: None,
            session_buffer: 64,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind < self.small_blind {
            return Err("Big blind must be at least the small blind".to_string());
        }

        if self.buy_in < self.big_blind {
            return Err("Buy-in must cover at least one big blind".to_string());
        }

        if !(MIN_PLAYERS..=MAX_SEATS).contains(&self.max_seats) {
            return Err(format!(
                "Max seats must be between {MIN_PLAYERS} and {MAX_SEATS}"
            ));
        }

        if self.tick_ms == 0 || self.action_timeout_ms == Some(0) {
            return Err("Tick and action timeout must be positive".to_string());
        }

        if self.session_buffer == 0 {
            return Err("Session buffer must be positive".to_string());
        }

        Ok(())
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            max_seats: self.max_seats,
            blinds: Blinds {
                small: self.small_blind,
                big: self.big_blind,
            },
            buy_in: self.buy_in,
            seed: self.seed,
        }
    }

    pub fn action_timeout(&self) -> Duration {
        self.action_timeout_ms
            .map_or_else(|| self.speed.action_timeout(), Duration::from_millis)
    }

    pub fn hand_interval(&self) -> Duration {
        Duration::from_millis(self.hand_interval_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
