use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{AppState, Envelope};
use crate::domain::{CurrencyBuckets, PaymentRecord};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentsResult {
    pub payment: Vec<PaymentRecord>,
    pub buckets: CurrencyBuckets,
}

pub async fn get_payments(
    State(state): State<AppState>,
) -> Result<Json<Envelope<PaymentsResult>>, AppError> {
    let (payment, buckets) = state.dashboard.payments().await;
    let last_update = state.dashboard.last_update().await;
    Ok(Json(Envelope::ok(
        PaymentsResult { payment, buckets },
        last_update,
    )))
}
