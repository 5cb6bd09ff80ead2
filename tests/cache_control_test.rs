use axum::http::StatusCode;
use sdboard::api::{self, AppState};
use sdboard::cache::SnapshotCache;
use sdboard::datasource::MockApi;
use sdboard::domain::{CurrencyPolicy, Decimal, Order, PartyRef, SdDate, SdId};
use sdboard::engine::ExchangeRate;
use sdboard::orchestration::Dashboard;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn setup_app(mock: MockApi) -> axum::Router {
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(mock),
        None,
        Arc::new(SnapshotCache::new(Duration::from_secs(300))),
        ExchangeRate::default(),
        CurrencyPolicy::standard(),
        HashSet::new(),
    ));
    api::create_router(AppState::new(dashboard))
}

fn order(id: &str) -> Order {
    Order {
        id: SdId::new(id),
        date: SdDate::new("2024-06-01"),
        due_date: None,
        status: 1,
        total: Decimal::from_i64(1000),
        total_returns: Decimal::zero(),
        client: PartyRef::new("c1", "Client c1"),
        agent: PartyRef::new("a1", "Agent a1"),
        payment_type: None,
        price_type: None,
        lines: vec![],
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(json.to_string())
        }
        None => axum::body::Body::empty(),
    };
    let res = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, v)
}

#[tokio::test]
async fn test_status_lists_every_key_with_freshness() {
    let app = setup_app(MockApi::new().with_orders(vec![order("1")]));

    // Warm the orders slot first.
    let (status, _) = request(app.clone(), "GET", "/api/cache/orders/all", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, v) = request(app, "GET", "/api/cache/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], true);

    let keys = v["result"]["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 8);
    let orders = keys.iter().find(|k| k["key"] == "orders").unwrap();
    assert_eq!(orders["fresh"], true);
    assert!(orders["lastUpdate"].is_string());
    let balances = keys.iter().find(|k| k["key"] == "balances").unwrap();
    assert_eq!(balances["fresh"], false);

    assert_eq!(v["result"]["ttlSecs"], 300);
    assert_eq!(v["result"]["exchangeRate"].as_f64().unwrap(), 12_200.0);
    assert!(v["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_invalidate_named_key_forces_refetch() {
    let mock = MockApi::new().with_orders(vec![order("1")]);
    let app = setup_app(mock.clone());

    request(app.clone(), "GET", "/api/cache/orders/all", None).await;
    request(app.clone(), "GET", "/api/cache/orders/all", None).await;
    assert_eq!(mock.call_count("orders"), 1);

    let (status, v) = request(
        app.clone(),
        "POST",
        "/api/cache/invalidate",
        Some(r#"{"keys": ["orders"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["result"]["invalidated"], serde_json::json!(["orders"]));

    request(app, "GET", "/api/cache/orders/all", None).await;
    assert_eq!(mock.call_count("orders"), 2);
}

#[tokio::test]
async fn test_invalidate_without_body_clears_everything() {
    let mock = MockApi::new().with_orders(vec![order("1")]);
    let app = setup_app(mock.clone());

    request(app.clone(), "GET", "/api/cache/orders/all", None).await;
    request(app.clone(), "GET", "/api/cache/balances", None).await;

    let (status, v) = request(app.clone(), "POST", "/api/cache/invalidate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["result"]["invalidated"], "all");

    request(app.clone(), "GET", "/api/cache/orders/all", None).await;
    request(app, "GET", "/api/cache/balances", None).await;
    assert_eq!(mock.call_count("orders"), 2);
    assert_eq!(mock.call_count("balances"), 2);
}

#[tokio::test]
async fn test_invalidate_rejects_unknown_key_without_clearing() {
    let mock = MockApi::new().with_orders(vec![order("1")]);
    let app = setup_app(mock.clone());

    request(app.clone(), "GET", "/api/cache/orders/all", None).await;

    let (status, v) = request(
        app.clone(),
        "POST",
        "/api/cache/invalidate",
        Some(r#"{"keys": ["orders", "bogus"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["status"], false);

    // The valid key named alongside the bad one was not cleared.
    request(app, "GET", "/api/cache/orders/all", None).await;
    assert_eq!(mock.call_count("orders"), 1);
}

#[tokio::test]
async fn test_exchange_rate_update_roundtrip() {
    let app = setup_app(MockApi::new());

    let (status, v) = request(
        app.clone(),
        "PUT",
        "/api/config/exchange-rate",
        Some(r#"{"rate": 12500}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["result"]["rate"].as_f64().unwrap(), 12_500.0);

    let (_, v) = request(app, "GET", "/api/cache/status", None).await;
    assert_eq!(v["result"]["exchangeRate"].as_f64().unwrap(), 12_500.0);
}

#[tokio::test]
async fn test_out_of_range_rate_rejected_and_previous_kept() {
    let app = setup_app(MockApi::new());

    for body in [r#"{"rate": 100}"#, r#"{"rate": 900000}"#] {
        let (status, v) = request(app.clone(), "PUT", "/api/config/exchange-rate", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["status"], false);
    }

    let (_, v) = request(app, "GET", "/api/cache/status", None).await;
    assert_eq!(v["result"]["exchangeRate"].as_f64().unwrap(), 12_200.0);
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = setup_app(MockApi::new().with_orders(vec![order("1")]));

    let (status, v) = request(app.clone(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");

    let (status, v) = request(app.clone(), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["cacheWarmed"], false);

    request(app.clone(), "GET", "/api/cache/orders/all", None).await;
    let (_, v) = request(app, "GET", "/ready", None).await;
    assert_eq!(v["cacheWarmed"], true);
}
