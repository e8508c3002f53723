use axum::Json;
use serde_json::{Value, json};

/// Liveness probe; does not touch the database.
pub async fn health_check_route() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
