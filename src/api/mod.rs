pub mod agent_debts;
pub mod balances;
pub mod costprices;
pub mod health;
pub mod orders;
pub mod payments;
pub mod period;
pub mod rate;
pub mod stats;
pub mod status;

use crate::orchestration::Dashboard;
use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

/// Response envelope shared by every `/api/cache` endpoint. Peers parse
/// this exact shape, so the field names are part of the contract.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status: bool,
    pub result: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl<T> Envelope<T> {
    pub fn ok(result: T, last_update: Option<DateTime<Utc>>) -> Self {
        Envelope {
            status: true,
            result,
            last_update,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/api/cache/status", get(status::get_status))
        .route("/api/cache/stats/:period", get(stats::get_stats))
        .route("/api/cache/orders/:period", get(orders::get_orders))
        .route("/api/cache/balances", get(balances::get_balances))
        .route("/api/cache/payments", get(payments::get_payments))
        .route("/api/cache/costprices", get(costprices::get_costprices))
        .route("/api/cache/agentDebts", get(agent_debts::get_agent_debts))
        .route("/api/cache/invalidate", post(status::invalidate))
        .route("/api/config/exchange-rate", put(rate::put_exchange_rate))
        .layer(cors)
        .with_state(state)
}
