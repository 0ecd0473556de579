//! GET /health

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe. Does not touch storage.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
