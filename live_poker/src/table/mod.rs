//! Table module providing multi-table support with async actor model.
//!
//! This module implements:
//! - TableActor: Async actor owning a single poker table and its sessions
//! - TableManager: Registry spawning and closing table actors
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Every mutation of a table happens inside its actor. After each change
//! the actor narrates what happened and pushes each connected session its
//! own redacted view.
//!
//! ## Example
//!
//! ```no_run
//! use live_poker::table::{TableActor, TableConfig};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(1, TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let mut updates = handle.connect(Uuid::new_v4()).await.unwrap();
//!     while let Some(message) = updates.recv().await {
//!         println!("{message}");
//!     }
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod session;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableSpeed};
pub use manager::{TableManager, TableMetadata};
pub use messages::{TableId, TableMessage, TableStateResponse};
pub use session::{SessionId, SessionRegistry};
