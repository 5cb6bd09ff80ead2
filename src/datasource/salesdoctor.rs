//! Sales Doctor RPC client.
//!
//! Every method goes through one `request` entry point: token
//! authentication, transparent re-auth with a single retry on a
//! 401-equivalent, transient-error backoff, and a hard per-call timeout.

use super::{SalesDoctorApi, SourceError};
use crate::domain::{
    Agent, BalanceRecord, Client, Order, PaymentRecord, PriceType, Product, PurchaseRecord,
};
use crate::engine::Period;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Records per page for paginated listings.
const PAGE_LIMIT: usize = 100;
/// Page ceiling for the order listing, the largest upstream dataset.
const ORDER_PAGE_CEILING: u32 = 20;
/// Page ceiling for every other paginated listing.
const PAGE_CEILING: u32 = 10;

/// HTTP client for the Sales Doctor JSON API.
#[derive(Debug)]
pub struct SalesDoctorClient {
    client: reqwest::Client,
    base_url: String,
    login: String,
    password: String,
    timeout: Duration,
    token: RwLock<Option<String>>,
}

impl SalesDoctorClient {
    pub fn new(
        base_url: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            login: login.into(),
            password: password.into(),
            timeout,
            token: RwLock::new(None),
        }
    }

    /// One RPC call, bounded by the per-call timeout. A call that outlives
    /// the budget is abandoned and reported as a transport failure.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, SourceError> {
        match tokio::time::timeout(self.timeout, self.request_inner(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Transport(format!(
                "{} timed out after {:?}",
                method, self.timeout
            ))),
        }
    }

    async fn request_inner(&self, method: &str, params: Value) -> Result<Value, SourceError> {
        let token = self.ensure_token().await?;
        match self.call(method, &params, Some(&token)).await {
            Err(SourceError::AuthExpired) => {
                warn!("Token rejected for {}, re-authenticating once", method);
                let token = self.refresh_token().await?;
                self.call(method, &params, Some(&token)).await
            }
            other => other,
        }
    }

    async fn ensure_token(&self) -> Result<String, SourceError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_token().await
    }

    /// Authenticate and replace the stored token. The write lock is held
    /// across the login so concurrent callers wait instead of stampeding.
    async fn refresh_token(&self) -> Result<String, SourceError> {
        let mut guard = self.token.write().await;
        debug!("Authenticating against {}", self.base_url);
        let result = self
            .call(
                "login",
                &json!({"login": self.login, "password": self.password}),
                None,
            )
            .await?;
        let token = result
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::Parse("login response carried no token".to_string()))?
            .to_string();
        *guard = Some(token.clone());
        Ok(token)
    }

    /// POST one call, retrying transient failures (network, 429, 5xx) with
    /// exponential backoff inside the caller's time budget.
    async fn call(
        &self,
        method: &str,
        params: &Value,
        token: Option<&str>,
    ) -> Result<Value, SourceError> {
        let mut payload = json!({"method": method, "params": params});
        if let Some(token) = token {
            payload["token"] = json!(token);
        }
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.timeout),
            ..Default::default()
        };

        let body = retry(backoff, || async {
            let response = self
                .client
                .post(&self.base_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(SourceError::Transport(e.to_string())))?;

            let status = response.status();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(backoff::Error::permanent(SourceError::AuthExpired));
            }
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(SourceError::Http {
                    status: status.as_u16(),
                    message: "Retryable upstream failure".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(SourceError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(SourceError::Parse(e.to_string())))
        })
        .await?;

        envelope_result(body)
    }

    /// Fetch pages until a short page or the safety ceiling.
    async fn fetch_paged(
        &self,
        method: &str,
        result_key: &str,
        page_ceiling: u32,
        extra: Value,
    ) -> Result<Vec<Value>, SourceError> {
        let mut rows = Vec::new();
        for page in 1..=page_ceiling {
            let result = self.request(method, paged_params(page, &extra)).await?;
            let page_rows = result
                .get(result_key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let short = page_rows.len() < PAGE_LIMIT;
            rows.extend(page_rows);
            if short {
                break;
            }
            if page == page_ceiling {
                debug!("{} stopped at the {}-page ceiling", method, page_ceiling);
            }
        }
        debug!("{} returned {} records", method, rows.len());
        Ok(rows)
    }
}

/// Build paginated params, merging method-specific extras.
fn paged_params(page: u32, extra: &Value) -> Value {
    let mut params = serde_json::Map::new();
    params.insert("page".to_string(), json!(page));
    params.insert("limit".to_string(), json!(PAGE_LIMIT));
    if let Some(obj) = extra.as_object() {
        for (k, v) in obj {
            params.insert(k.clone(), v.clone());
        }
    }
    Value::Object(params)
}

/// Unwrap the `{status, result}` envelope. A `status: false` body with a
/// 401 error code counts as expired auth; other failures surface as
/// upstream errors. Bodies without a status field pass through as-is.
fn envelope_result(body: Value) -> Result<Value, SourceError> {
    match body.get("status").and_then(Value::as_bool) {
        Some(true) => Ok(body.get("result").cloned().unwrap_or(Value::Null)),
        Some(false) => {
            let error = body.get("error").cloned().unwrap_or(Value::Null);
            if error.get("code").and_then(Value::as_i64) == Some(401) {
                return Err(SourceError::AuthExpired);
            }
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified upstream failure")
                .to_string();
            Err(SourceError::Upstream(message))
        }
        None => Ok(body),
    }
}

/// Order period filter in the upstream's parameter shape.
fn period_param(period: &Period) -> Value {
    let mut obj = serde_json::Map::new();
    if let Some(start) = &period.start {
        obj.insert("start".to_string(), json!(start.as_str()));
    }
    if let Some(end) = &period.end {
        obj.insert("end".to_string(), json!(end.as_str()));
    }
    Value::Object(obj)
}

/// Parse raw rows, skipping (and logging) records the adapter rejects.
fn parse_rows<T>(rows: &[Value], entity: &str, parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match parse(row) {
            Some(item) => out.push(item),
            None => warn!("Skipping malformed {} record", entity),
        }
    }
    out
}

#[async_trait]
impl SalesDoctorApi for SalesDoctorClient {
    async fn fetch_orders(&self, period: Option<&Period>) -> Result<Vec<Order>, SourceError> {
        let mut extra = json!({"filter": {"status": "all"}});
        if let Some(period) = period {
            if !period.is_unbounded() {
                extra["period"] = period_param(period);
            }
        }
        let rows = self
            .fetch_paged("getOrder", "order", ORDER_PAGE_CEILING, extra)
            .await?;
        Ok(parse_rows(&rows, "order", Order::from_raw))
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        let rows = self
            .fetch_paged("getProduct", "product", PAGE_CEILING, json!({}))
            .await?;
        Ok(parse_rows(&rows, "product", Product::from_raw))
    }

    async fn fetch_clients(&self) -> Result<Vec<Client>, SourceError> {
        let rows = self
            .fetch_paged("getClient", "client", PAGE_CEILING, json!({}))
            .await?;
        Ok(parse_rows(&rows, "client", Client::from_raw))
    }

    async fn fetch_purchases(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        let rows = self
            .fetch_paged("getPurchase", "warehouse", PAGE_CEILING, json!({}))
            .await?;
        Ok(parse_rows(&rows, "purchase", PurchaseRecord::from_raw))
    }

    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, SourceError> {
        let rows = self
            .fetch_paged("getBalance", "balance", PAGE_CEILING, json!({}))
            .await?;
        Ok(parse_rows(&rows, "balance", BalanceRecord::from_raw))
    }

    async fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, SourceError> {
        let rows = self
            .fetch_paged("getPayment", "payment", PAGE_CEILING, json!({}))
            .await?;
        Ok(parse_rows(&rows, "payment", PaymentRecord::from_raw))
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>, SourceError> {
        let result = self.request("getAgent", json!({"limit": PAGE_LIMIT})).await?;
        let rows = result
            .get("agent")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(parse_rows(&rows, "agent", Agent::from_raw))
    }

    async fn fetch_price_types(&self) -> Result<Vec<PriceType>, SourceError> {
        let result = self.request("getPriceType", json!({})).await?;
        let rows = result
            .get("priceType")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(parse_rows(&rows, "priceType", PriceType::from_raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SdDate;

    #[test]
    fn test_envelope_unwraps_result() {
        let body = json!({"status": true, "result": {"order": [1, 2]}});
        assert_eq!(envelope_result(body).unwrap(), json!({"order": [1, 2]}));
    }

    #[test]
    fn test_envelope_401_code_is_auth_expired() {
        let body = json!({"status": false, "error": {"code": 401, "message": "token expired"}});
        assert!(matches!(envelope_result(body), Err(SourceError::AuthExpired)));
    }

    #[test]
    fn test_envelope_failure_surfaces_message() {
        let body = json!({"status": false, "error": {"code": 500, "message": "license expired"}});
        match envelope_result(body) {
            Err(SourceError::Upstream(msg)) => assert_eq!(msg, "license expired"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_envelope_without_status_passes_through() {
        let body = json!({"order": []});
        assert_eq!(envelope_result(body.clone()).unwrap(), body);
    }

    #[test]
    fn test_paged_params_merges_extras() {
        let params = paged_params(3, &json!({"filter": {"status": "all"}}));
        assert_eq!(params["page"], json!(3));
        assert_eq!(params["limit"], json!(100));
        assert_eq!(params["filter"]["status"], json!("all"));
    }

    #[test]
    fn test_period_param_skips_open_bounds() {
        let period = Period {
            start: Some(SdDate::new("2024-06-01")),
            end: None,
        };
        assert_eq!(period_param(&period), json!({"start": "2024-06-01"}));
    }

    #[test]
    fn test_parse_rows_skips_malformed() {
        let rows = vec![
            json!({"id": 1, "name": "Agent A"}),
            json!({"name": "no id"}),
        ];
        let agents = parse_rows(&rows, "agent", Agent::from_raw);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "Agent A");
    }

    use httpmock::prelude::*;

    fn order_row(i: usize) -> Value {
        json!({"id": i, "dateCreate": "2024-06-01", "totalSumma": 1000, "status": 1})
    }

    fn order_page(count: usize) -> Value {
        let rows: Vec<Value> = (0..count).map(order_row).collect();
        json!({"status": true, "result": {"order": rows}})
    }

    fn test_client(server: &MockServer) -> SalesDoctorClient {
        SalesDoctorClient::new(server.base_url(), "user", "pass", Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_login_then_paged_fetch_stops_on_short_page() {
        let server = MockServer::start_async().await;

        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "tok1"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"page\":1");
                then.status(200).json_body(order_page(100));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"page\":2");
                then.status(200).json_body(order_page(100));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"page\":3");
                then.status(200).json_body(order_page(40));
            })
            .await;

        let client = test_client(&server);
        let orders = client.fetch_orders(None).await.unwrap();

        // Two full pages plus the short one, then no page 4 request.
        assert_eq!(orders.len(), 240);
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_order_pagination_stops_at_ceiling() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "tok1"}}));
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .body_includes("\"method\":\"getOrder\"");
                then.status(200).json_body(order_page(100));
            })
            .await;

        let client = test_client(&server);
        let orders = client.fetch_orders(None).await.unwrap();

        assert_eq!(orders.len(), 100 * ORDER_PAGE_CEILING as usize);
        data.assert_calls_async(ORDER_PAGE_CEILING as usize).await;
    }

    #[tokio::test]
    async fn test_reauth_once_on_http_401() {
        let server = MockServer::start_async().await;

        let stale = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"token\":\"stale\"");
                then.status(401);
            })
            .await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "fresh"}}));
            })
            .await;
        let fresh = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"token\":\"fresh\"");
                then.status(200).json_body(
                    json!({"status": true, "result": {"agent": [{"id": 1, "name": "Agent A"}]}}),
                );
            })
            .await;

        let client = test_client(&server);
        *client.token.write().await = Some("stale".to_string());

        let agents = client.fetch_agents().await.unwrap();
        assert_eq!(agents.len(), 1);
        stale.assert_async().await;
        login.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_reauth_on_body_401_code() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"token\":\"stale\"");
                then.status(200).json_body(
                    json!({"status": false, "error": {"code": 401, "message": "token expired"}}),
                );
            })
            .await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "fresh"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"token\":\"fresh\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"agent": []}}));
            })
            .await;

        let client = test_client(&server);
        *client.token.write().await = Some("stale".to_string());

        assert!(client.fetch_agents().await.unwrap().is_empty());
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_auth_rejection_is_hard_failure() {
        let server = MockServer::start_async().await;

        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "t1"}}));
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .body_includes("\"method\":\"getAgent\"");
                then.status(401);
            })
            .await;

        let client = test_client(&server);
        let err = client.fetch_agents().await.unwrap_err();

        assert!(matches!(err, SourceError::AuthExpired));
        // One login up front, one re-auth, one data attempt each.
        login.assert_calls_async(2).await;
        data.assert_calls_async(2).await;
    }

    #[tokio::test]
    async fn test_client_error_is_permanent() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "t1"}}));
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .body_includes("\"method\":\"getAgent\"");
                then.status(404);
            })
            .await;

        let client = test_client(&server);
        let err = client.fetch_agents().await.unwrap_err();

        assert!(matches!(err, SourceError::Http { status: 404, .. }));
        data.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("\"method\":\"login\"");
                then.status(200)
                    .json_body(json!({"status": true, "result": {"token": "t1"}}));
            })
            .await;
        let data = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .body_includes("\"method\":\"getAgent\"");
                then.status(500);
            })
            .await;

        let client = test_client(&server);
        assert!(client.fetch_agents().await.is_err());
        assert!(data.calls_async().await >= 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = SalesDoctorClient::new(
            "http://127.0.0.1:9",
            "user",
            "pass",
            Duration::from_millis(300),
        );
        let err = client.fetch_agents().await.unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)));
    }
}
