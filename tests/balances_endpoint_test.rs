use axum::http::StatusCode;
use sdboard::api::{self, AppState};
use sdboard::cache::SnapshotCache;
use sdboard::datasource::MockApi;
use sdboard::domain::{
    BalanceRecord, CurrencyAmount, CurrencyPolicy, Decimal, Order, PartyRef, PaymentRecord, SdDate,
    SdId,
};
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

fn balance(client: &str, total: i64, slices: &[(&str, i64)]) -> BalanceRecord {
    BalanceRecord {
        client: PartyRef::new(client, format!("Client {}", client)),
        balance: Decimal::from_i64(total),
        by_currency: slices
            .iter()
            .map(|(currency, amount)| CurrencyAmount {
                currency_id: SdId::new(*currency),
                amount: Decimal::from_i64(*amount),
            })
            .collect(),
    }
}

fn order_due(id: &str, client: &str, due: &str, total: i64) -> Order {
    Order {
        id: SdId::new(id),
        date: SdDate::new("2024-05-01"),
        due_date: Some(SdDate::new(due)),
        status: 1,
        total: Decimal::from_i64(total),
        total_returns: Decimal::zero(),
        client: PartyRef::new(client, format!("Client {}", client)),
        agent: PartyRef::new("a1", "Agent a1"),
        payment_type: None,
        price_type: None,
        lines: vec![],
    }
}

fn payment(id: &str, order_id: &str, amount: i64) -> PaymentRecord {
    PaymentRecord {
        id: SdId::new(id),
        date: SdDate::new("2024-05-10"),
        client: PartyRef::new("c1", "Client c1"),
        order_id: Some(SdId::new(order_id)),
        amount: Decimal::from_i64(amount),
        payment_type: Some(SdId::new("1")),
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, v)
}

#[tokio::test]
async fn test_debtor_balance_buckets_by_currency() {
    let app = setup_app(MockApi::new().with_balances(vec![
        balance("c1", -50, &[("USD", -50)]),
        balance("c2", -120_000, &[("sum", -120_000)]),
        balance("c3", 900, &[("sum", 900)]),
    ]));

    let (status, v) = get(app, "/api/cache/balances").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], true);

    let result = &v["result"];
    assert_eq!(result["debtorCount"], 2);
    assert_eq!(result["debt"]["usd"].as_f64().unwrap(), 50.0);
    assert_eq!(result["debt"]["localCash"].as_f64().unwrap(), 120_000.0);
    assert_eq!(result["balance"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_credit_slices_never_count_as_debt() {
    // A debtor with one owed currency and one in credit: only the owed
    // slice lands in the buckets.
    let app = setup_app(MockApi::new().with_balances(vec![balance(
        "c1",
        -300,
        &[("USD", -400), ("sum", 100)],
    )]));

    let (_, v) = get(app, "/api/cache/balances").await;
    assert_eq!(v["result"]["debt"]["usd"].as_f64().unwrap(), 400.0);
    assert_eq!(v["result"]["debt"]["localCash"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn test_overdue_rows_anchor_on_earliest_unpaid_due_date() {
    let mock = MockApi::new()
        .with_balances(vec![balance("c1", -100_000, &[("sum", -100_000)])])
        .with_orders(vec![
            order_due("o1", "c1", "2024-06-10", 100_000),
            order_due("o2", "c1", "2024-06-01", 100_000),
        ]);
    let app = setup_app(mock);

    let (_, v) = get(app, "/api/cache/balances").await;
    let overdue = v["result"]["overdue"].as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["client"]["id"], "c1");
    assert_eq!(overdue[0]["srok"], "2024-06-01");
    assert_eq!(overdue[0]["isOverdue"], true);
    assert!(overdue[0]["overdueDays"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_settled_orders_drop_out_of_overdue() {
    let mock = MockApi::new()
        .with_orders(vec![order_due("o1", "c1", "2024-06-01", 100_000)])
        .with_payments(vec![payment("p1", "o1", 100_000)]);
    let app = setup_app(mock);

    let (_, v) = get(app, "/api/cache/balances").await;
    assert!(v["result"]["overdue"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_overdue_sorted_most_overdue_first() {
    let mock = MockApi::new().with_orders(vec![
        order_due("o1", "c1", "2024-06-10", 100_000),
        order_due("o2", "c2", "2024-05-01", 100_000),
    ]);
    let app = setup_app(mock);

    let (_, v) = get(app, "/api/cache/balances").await;
    let overdue = v["result"]["overdue"].as_array().unwrap();
    assert_eq!(overdue.len(), 2);
    assert_eq!(overdue[0]["client"]["id"], "c2");
    assert_eq!(overdue[1]["client"]["id"], "c1");
}

#[tokio::test]
async fn test_failed_balance_fetch_degrades_to_empty_sections() {
    let app = setup_app(MockApi::new().failing("balances").failing("payments"));

    let (status, v) = get(app, "/api/cache/balances").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], true);
    assert_eq!(v["result"]["debtorCount"], 0);
    assert!(v["result"]["balance"].as_array().unwrap().is_empty());
    assert_eq!(v["result"]["debt"]["usd"].as_f64().unwrap(), 0.0);
}
