use crate::api::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the process is serving; `cacheWarmed` tells a peer whether
/// any snapshot has landed yet.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let warmed = state.dashboard.last_update().await.is_some();
    Json(serde_json::json!({"status": "ready", "cacheWarmed": warmed}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
