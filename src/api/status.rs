use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::{AppState, Envelope};
use crate::cache::CacheKey;
use crate::error::AppError;
use crate::orchestration::CacheStatusView;

pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<Envelope<CacheStatusView>>, AppError> {
    let status = state.dashboard.cache_status().await;
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(status, last_update)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateBody {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

/// Clear the named keys, or everything when the body is absent or names
/// none. Unknown key names are rejected before anything is cleared.
pub async fn invalidate(
    State(state): State<AppState>,
    body: Option<Json<InvalidateBody>>,
) -> Result<Json<Envelope<serde_json::Value>>, AppError> {
    let keys = body.and_then(|Json(b)| b.keys);
    let result = match keys {
        Some(names) if !names.is_empty() => {
            let keys = names
                .iter()
                .map(|name| name.parse::<CacheKey>())
                .collect::<Result<Vec<_>, _>>()?;
            state.dashboard.invalidate(Some(keys.clone())).await;
            json!({"invalidated": keys})
        }
        _ => {
            state.dashboard.invalidate(None).await;
            json!({"invalidated": "all"})
        }
    };
    Ok(Json(Envelope::ok(result, None)))
}
