//! Table listing API handlers.
//!
//! Play itself happens over the websocket; these endpoints only let a lobby
//! or a monitor see which tables exist and how full they are.
//!
//! # Examples
//!
//! ```bash
//! curl http://localhost:9000/api/tables
//! curl http://localhost:9000/api/tables/1
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use live_poker::table::{TableId, TableMetadata, TableStateResponse};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found(error: String) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error }))
}

/// List all open tables, ordered by id.
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": 1,
///     "name": "Table 1",
///     "player_count": 3,
///     "max_players": 10,
///     "spectator_count": 1,
///     "small_blind": 1,
///     "big_blind": 2,
///     "speed": "normal",
///     "is_running": true,
///     "phase": "Flop",
///     "hands_played": 12
///   }
/// ]
/// ```
pub async fn list_tables(State(state): State<AppState>) -> Json<Vec<TableMetadata>> {
    Json(state.table_manager.list_tables().await)
}

/// Get the public state of a specific table.
///
/// # Errors
///
/// - `404 Not Found`: Table doesn't exist or has stopped
pub async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> Result<Json<TableStateResponse>, ApiError> {
    let handle = state
        .table_manager
        .get_table(table_id)
        .await
        .ok_or_else(|| not_found(format!("Table {table_id} not found")))?;

    handle.state().await.map(Json).map_err(not_found)
}
