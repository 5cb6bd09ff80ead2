use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{AppState, Envelope};
use crate::engine::CostPriceMap;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPricesResult {
    pub cost_price: CostPriceMap,
}

pub async fn get_costprices(
    State(state): State<AppState>,
) -> Result<Json<Envelope<CostPricesResult>>, AppError> {
    let cost_price = state.dashboard.cost_prices().await;
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(
        CostPricesResult { cost_price },
        last_update,
    )))
}
