//! Wire protocol error types.

use thiserror::Error;

use crate::game::UserError;

/// Errors decoding or encoding websocket text frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame wasn't valid JSON or didn't match any known message
    #[error("invalid message: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },

    /// Frame type the protocol doesn't use
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(&'static str),
}

impl From<ProtocolError> for UserError {
    fn from(value: ProtocolError) -> Self {
        Self::MalformedAction(value.to_string())
    }
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
