use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{AppState, Envelope};
use crate::domain::Decimal;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RateBody {
    pub rate: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RateResult {
    pub rate: Decimal,
}

/// Runtime exchange-rate update. Out-of-range values are rejected with a
/// 400 and the previous rate stays in effect.
pub async fn put_exchange_rate(
    State(state): State<AppState>,
    Json(body): Json<RateBody>,
) -> Result<Json<Envelope<RateResult>>, AppError> {
    let applied = state.dashboard.set_exchange_rate(body.rate).await?;
    Ok(Json(Envelope::ok(
        RateResult {
            rate: applied.get(),
        },
        None,
    )))
}
