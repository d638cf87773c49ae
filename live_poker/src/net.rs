//! Wire protocol spoken between browser clients and a table.
//!
//! JSON text frames over a websocket, in the `{event, data}` envelope the
//! browser client emits and listens for.

/// Protocol error types.
pub mod errors;

/// Inbound and outbound message types.
pub mod messages;
