use axum::Json;
use serde_json::json;

/// `GET /ob/api/heartbeat` (spec.md §6.2): the one response that never
/// touches the hub at all.
pub async fn heartbeat() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "error": "" }))
}
