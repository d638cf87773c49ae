//! Websocket server for live poker tables.
//!
//! Serves the browser client's websocket endpoint plus a small HTTP surface
//! for health checks and table listings. All game state lives in
//! `live_poker` table actors; this crate only wires connections to them.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
