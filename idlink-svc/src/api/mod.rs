//! REST API for the identity reconciliation service
//!
//! A thin adapter over the reconciliation core: request parsing, error to
//! status-code mapping, and the standard health/status endpoints.

pub mod handlers;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved database path (reported by /status)
    pub database_path: String,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/identify", post(handlers::identify))
        .route("/health", get(health_check))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "module": "idlink-svc",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Status endpoint
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "idlink-svc",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "port": state.port,
        "database": state.database_path,
    }))
}
