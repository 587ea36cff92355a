use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{db, AppState};

/// Liveness plus a database connectivity probe.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "database": "up"})),
        ),
        Err(e) => {
            tracing::error!("health check database probe failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded", "database": "down"})),
            )
        }
    }
}
