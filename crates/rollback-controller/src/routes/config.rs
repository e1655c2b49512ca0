use axum::extract::State;
use axum::Json;
use rollback_core::config::ConfigWarning;
use rollback_core::RollbackConfig;

use crate::state::AppState;

/// GET /api/config: effective configuration (token omitted) and its warnings.
pub async fn get_config(State(app): State<AppState>) -> Json<serde_json::Value> {
    let config: &RollbackConfig = &app.config;
    let warnings: Vec<ConfigWarning> = config.validate();
    Json(serde_json::json!({
        "config": config,
        "warnings": warnings,
    }))
}
