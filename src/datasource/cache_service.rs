//! Client for a peer caching service.
//!
//! A running instance of this service (or the legacy cache process) exposes
//! the `/api/cache/*` read-through endpoints; when configured, it is
//! preferred over the direct RPC surface because its answers are
//! pre-aggregated and fast. Failure here is never fatal: callers fall back
//! to the direct source.

use super::SourceError;
use crate::domain::{BalanceRecord, Order, PaymentRecord};
use crate::engine::CostPriceMap;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// `{status, result, lastUpdate}` envelope the cache endpoints answer with.
#[derive(Debug, Clone)]
pub struct CacheAnswer {
    pub result: Value,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CacheServiceClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CacheServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// GET one cache endpoint, honoring the per-call timeout.
    pub async fn get(&self, path: &str) -> Result<CacheAnswer, SourceError> {
        let url = format!("{}/api/cache/{}", self.base_url, path);
        debug!("Querying cache service: {}", url);
        match tokio::time::timeout(self.timeout, self.get_inner(&url)).await {
            Ok(answer) => answer,
            Err(_) => Err(SourceError::Transport(format!(
                "cache service {} timed out after {:?}",
                path, self.timeout
            ))),
        }
    }

    async fn get_inner(&self, url: &str) -> Result<CacheAnswer, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: "cache service error".to_string(),
            });
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if body.get("status").and_then(Value::as_bool) != Some(true) {
            return Err(SourceError::Upstream(
                "cache service answered status=false".to_string(),
            ));
        }
        let last_update = body
            .get("lastUpdate")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<DateTime<Utc>>().ok());
        Ok(CacheAnswer {
            result: body.get("result").cloned().unwrap_or(Value::Null),
            last_update,
        })
    }

    /// Full order listing from the peer's cache.
    pub async fn fetch_orders(&self) -> Result<Vec<Order>, SourceError> {
        let answer = self.get("orders/all").await?;
        Ok(entity_rows(&answer.result, "order")
            .iter()
            .filter_map(Order::from_raw)
            .collect())
    }

    pub async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, SourceError> {
        let answer = self.get("balances").await?;
        Ok(entity_rows(&answer.result, "balance")
            .iter()
            .filter_map(BalanceRecord::from_raw)
            .collect())
    }

    pub async fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, SourceError> {
        let answer = self.get("payments").await?;
        Ok(entity_rows(&answer.result, "payment")
            .iter()
            .filter_map(PaymentRecord::from_raw)
            .collect())
    }

    /// Resolved cost-price map, already normalized by the peer.
    pub async fn fetch_cost_prices(&self) -> Result<CostPriceMap, SourceError> {
        let answer = self.get("costprices").await?;
        let map = answer
            .result
            .get("costPrice")
            .cloned()
            .unwrap_or(answer.result);
        serde_json::from_value(map).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

/// Entity rows under their upstream key, tolerating a bare array result.
fn entity_rows<'a>(result: &'a Value, key: &str) -> &'a [Value] {
    if let Some(Value::Array(rows)) = result.get(key) {
        return rows;
    }
    if let Value::Array(rows) = result {
        return rows;
    }
    &[]
}
