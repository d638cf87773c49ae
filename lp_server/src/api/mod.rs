//! HTTP/WebSocket API for the table server.
//!
//! # Modules
//!
//! - [`tables`]: Read-only table listings
//! - [`websocket`]: The live table connection the browser client plays over
//!
//! # Endpoints Overview
//!
//! ```text
//! GET /health                 - Server health status
//! GET /api/tables             - List open tables
//! GET /api/tables/{table_id}  - One table's public state
//! GET /websocket              - Play at the default (lowest id) table
//! GET /ws/{table_id}          - Play at a specific table
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use live_poker::table::TableManager;
//! use lp_server::api::{AppState, create_router};
//! use std::net::SocketAddr;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState {
//!     table_manager: TableManager::new(4),
//! };
//!
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9000").await?;
//! axum::serve(
//!     listener,
//!     app.into_make_service_with_connect_info::<SocketAddr>(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; the browser client is usually served
//! from a different origin during development.

pub mod tables;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use live_poker::table::TableManager;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub table_manager: TableManager,
}

/// Create the API router with all endpoints and middleware.
///
/// The websocket routes extract the peer address, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/tables", get(tables::list_tables))
        .route("/tables/{table_id}", get(tables::get_table));

    Router::new()
        .route("/health", get(health_check))
        .route("/websocket", get(websocket::default_table_handler))
        .route("/ws/{table_id}", get(websocket::websocket_handler))
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:9000/health
/// # {"status":"healthy","version":"0.1.0","tables":1,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_count = state.table_manager.table_count().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": table_count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
