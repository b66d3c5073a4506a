use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and which embedding backends are active.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-screener",
        "remote": state.config.remote_enabled(),
        "embedding": {
            "primary": state.embeddings.primary_model(),
            "fallback": state.embeddings.fallback_model(),
        },
        "screenings": state.screenings.len().await,
    }))
}
