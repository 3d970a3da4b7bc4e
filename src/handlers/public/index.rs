use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET / - service banner
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "boxmeup-api",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Welcome!",
    }))
}

/// GET /health - 204 while the record store answers
pub async fn health(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.store.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable(-1, "Record store unavailable.")
    })?;
    Ok(StatusCode::NO_CONTENT)
}
