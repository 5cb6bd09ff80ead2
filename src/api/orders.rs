use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::period::resolve_period;
use crate::api::{AppState, Envelope};
use crate::domain::Order;
use crate::error::AppError;

/// One listed order. Full returns stay in the listing (flagged) even
/// though aggregates never count them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub is_return: bool,
}

/// Result payload keyed like the upstream envelope so peers can ingest it.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersResult {
    pub order: Vec<OrderRow>,
}

pub async fn get_orders(
    Path(period): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<OrdersResult>>, AppError> {
    let period = resolve_period(&period)?;
    let rows = state
        .dashboard
        .orders(&period)
        .await
        .into_iter()
        .map(|order| OrderRow {
            is_return: order.is_full_return(),
            order,
        })
        .collect();
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(OrdersResult { order: rows }, last_update)))
}
