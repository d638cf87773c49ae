//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use live_poker::{
    entities::Chips,
    table::{TableConfig, TableSpeed},
};
use std::{net::SocketAddr, str::FromStr};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Table defaults configuration
    pub table_defaults: TableDefaultsConfig,
    /// Number of tables to create on startup
    pub num_tables: usize,
}

/// Default table configuration
#[derive(Debug, Clone)]
pub struct TableDefaultsConfig {
    /// Seats per table
    pub max_seats: usize,
    /// Small blind amount
    pub small_blind: Chips,
    /// Big blind amount
    pub big_blind: Chips,
    /// Chips each player sits down with
    pub buy_in: Chips,
    /// Time to act before an automatic check or fold
    pub action_timeout_ms: u64,
    /// Pause between hands
    pub hand_interval_ms: u64,
}

impl TableDefaultsConfig {
    /// Table configuration for the `n`th table created at start-up.
    pub fn table_config(&self, n: usize) -> TableConfig {
        TableConfig {
            name: format!("Table {n}"),
            max_seats: self.max_seats,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            buy_in: self.buy_in,
            speed: TableSpeed::Normal,
            action_timeout_ms: Some(self.action_timeout_ms),
            hand_interval_ms: self.hand_interval_ms,
            ..TableConfig::default()
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `num_tables_override` - Optional number of tables override (from CLI args)
    /// * `metrics_bind_override` - Optional exporter address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        num_tables_override: Option<usize>,
        metrics_bind_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_or("SERVER_BIND", default_bind())?,
        };

        let metrics_bind = match metrics_bind_override {
            Some(addr) => Some(addr),
            None => parse_env("METRICS_BIND")?,
        };

        let defaults = TableConfig::default();
        let table_defaults = TableDefaultsConfig {
            max_seats: parse_env_or("TABLE_MAX_SEATS", defaults.max_seats)?,
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind)?,
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind)?,
            buy_in: parse_env_or("TABLE_BUY_IN", defaults.buy_in)?,
            action_timeout_ms: parse_env_or(
                "TABLE_ACTION_TIMEOUT_MS",
                defaults.action_timeout().as_millis() as u64,
            )?,
            hand_interval_ms: parse_env_or("TABLE_HAND_INTERVAL_MS", defaults.hand_interval_ms)?,
        };

        let num_tables = match num_tables_override {
            Some(n) => n,
            None => parse_env_or("MAX_TABLES", 1)?,
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            table_defaults,
            num_tables,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_TABLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: "Must differ from the server bind address".to_string(),
            });
        }

        self.table_defaults
            .table_config(1)
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "TABLE_*".to_string(),
                reason,
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Reads an optional variable. Set but unparsable is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("{value:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_env(key)?.unwrap_or(default))
}
