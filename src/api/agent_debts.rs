use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::{AppState, Envelope};
use crate::domain::Currency;
use crate::engine::AgentDebt;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AgentDebtsQuery {
    pub currency: Option<String>,
}

/// Per-agent debt rollup. With `?currency=` only agents owed in that
/// currency are listed, ranked by that bucket instead of the combined
/// local total.
pub async fn get_agent_debts(
    Query(params): Query<AgentDebtsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<AgentDebt>>>, AppError> {
    let currency = params
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Currency::from_str)
        .transpose()?;

    let mut rows = state.dashboard.agent_debts().await;
    if let Some(currency) = currency {
        rows.retain(|row| !row.by_currency.get(currency).is_zero());
        rows.sort_by(|a, b| b.by_currency.get(currency).cmp(&a.by_currency.get(currency)));
    }
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(rows, last_update)))
}
