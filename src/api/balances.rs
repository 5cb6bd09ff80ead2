use axum::extract::State;
use axum::Json;
use futures::join;
use serde::{Deserialize, Serialize};

use crate::api::{AppState, Envelope};
use crate::domain::BalanceRecord;
use crate::error::AppError;
use crate::orchestration::DebtOverview;

/// Raw records under the upstream key for peer ingestion, with the debt
/// summary and overdue detail flattened alongside.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalancesResult {
    pub balance: Vec<BalanceRecord>,
    #[serde(flatten)]
    pub overview: DebtOverview,
}

pub async fn get_balances(
    State(state): State<AppState>,
) -> Result<Json<Envelope<BalancesResult>>, AppError> {
    let (balance, overview) = join!(state.dashboard.balances(), state.dashboard.debt_overview());
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(
        BalancesResult { balance, overview },
        last_update,
    )))
}
