//! Integration tests for the HTTP surface of the server.
//!
//! Requests go straight through the router with `oneshot`; no socket is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use live_poker::table::{TableConfig, TableManager};
use lp_server::api::{AppState, create_router};
use serde_json::Value;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create a router over `num_tables` fresh tables
async fn create_test_server(num_tables: usize) -> (axum::Router, TableManager) {
    let table_manager = TableManager::new(4);
    for n in 1..=num_tables {
        table_manager
            .create_table(TableConfig {
                name: format!("Table {n}"),
                ..TableConfig::default()
            })
            .await
            .unwrap();
    }

    let app = create_router(AppState {
        table_manager: table_manager.clone(),
    });

    (app, table_manager)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server(2).await;

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["tables"], 2);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_concurrent_health_checks() {
    let (app, _) = create_test_server(1).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move {
            get_json(app_clone, "/health").await.0
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
}

// ============================================================================
// Table Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_tables_endpoint() {
    let (app, _) = create_test_server(2).await;

    let (status, json) = get_json(app, "/api/tables").await;

    assert_eq!(status, StatusCode::OK);
    let tables = json.as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["id"], 1);
    assert_eq!(tables[0]["name"], "Table 1");
    assert_eq!(tables[1]["id"], 2);
    assert_eq!(tables[0]["player_count"], 0);
    assert_eq!(tables[0]["speed"], "normal");
    assert_eq!(tables[0]["is_running"], false);
}

#[tokio::test]
async fn test_list_tables_skips_closed_tables() {
    let (app, manager) = create_test_server(2).await;
    manager.close_table(1).await.unwrap();

    let (_, json) = get_json(app, "/api/tables").await;

    let tables = json.as_array().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0]["id"], 2);
}

#[tokio::test]
async fn test_get_table_endpoint() {
    let (app, _) = create_test_server(1).await;

    let (status, json) = get_json(app, "/api/tables/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["table_id"], 1);
    assert_eq!(json["pot_size"], 0);
    assert_eq!(json["players"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_get_missing_table_is_404() {
    let (app, _) = create_test_server(1).await;

    let (status, json) = get_json(app, "/api/tables/99").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Table 99 not found");
}

#[tokio::test]
async fn test_404_for_invalid_endpoint() {
    let (app, _) = create_test_server(1).await;

    let (status, _) = get_json(app, "/api/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// CORS Tests
// ============================================================================

#[tokio::test]
async fn test_cors_headers_present() {
    let (app, _) = create_test_server(1).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS headers should be present"
    );
}
