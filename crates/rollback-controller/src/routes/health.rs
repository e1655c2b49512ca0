use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /healthz: liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /readyz: readiness probe with tracker counts.
pub async fn readyz(State(app): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = app.tracker.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "pending": snapshot.pending.len(),
        "completed": snapshot.completed.len(),
    }))
}
