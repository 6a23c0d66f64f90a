use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check: verifies database connectivity.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state
        .content()
        .ping()
        .await
        .map_err(|e| ApiError::Internal(format!("database health check failed: {e}")))?;

    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Lightweight ping without a database check.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
