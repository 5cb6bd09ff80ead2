use axum::extract::{Path, State};
use axum::Json;

use crate::api::period::resolve_period;
use crate::api::{AppState, Envelope};
use crate::error::AppError;
use crate::orchestration::StatsView;

pub async fn get_stats(
    Path(period): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<StatsView>>, AppError> {
    let period = resolve_period(&period)?;
    let stats = state.dashboard.stats(&period).await;
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(stats, last_update)))
}
