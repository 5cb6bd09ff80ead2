//! Order aggregation: period filtering, currency bucketing, rollups.

use crate::domain::{CurrencyBuckets, CurrencyPolicy, Decimal, Order, SdDate, SdId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::classify::{classify_line_amount, classify_order, normalize_order_total, ExchangeRate};
use super::costs::{unit_cost_local, CostPriceMap};
use super::profit::line_profit_record;

/// Inclusive date window. Open bounds are `None`.
///
/// Containment is lexicographic string comparison, valid because canonical
/// dates are zero-padded ISO.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Period {
    pub start: Option<SdDate>,
    pub end: Option<SdDate>,
}

impl Period {
    /// Unbounded window matching every order.
    pub fn all() -> Self {
        Period::default()
    }

    pub fn bounded(start: SdDate, end: SdDate) -> Self {
        Period {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn single_day(day: SdDate) -> Self {
        Period {
            start: Some(day.clone()),
            end: Some(day),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: &SdDate) -> bool {
        if let Some(start) = &self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Per-product rollup row. The products view ranks by sold quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: SdId,
    pub product_name: String,
    pub quantity: Decimal,
    pub sales_local: Decimal,
    pub profit: Decimal,
}

/// Per-agent or per-client rollup row. Both views rank by sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySales {
    pub id: SdId,
    pub name: String,
    pub sales_local: Decimal,
    pub profit: Decimal,
    pub order_count: u64,
}

/// Aggregated sales over one period window.
///
/// `sales` buckets hold raw amounts in their inferred denomination (the USD
/// bucket is in dollars); `total_local` is every order normalized to local
/// currency at the aggregation-time rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAggregate {
    pub sales: CurrencyBuckets,
    pub total_local: Decimal,
    pub order_count: u64,
    pub profit_total: Decimal,
    pub bonus_line_count: u64,
    /// Distinct clients with at least one in-period order (AKB).
    pub active_clients: u64,
    pub products: Vec<ProductSales>,
    pub agents: Vec<PartySales>,
    pub clients: Vec<PartySales>,
}

/// Fold orders into a period aggregate.
///
/// Full returns are excluded, then the period filter applies, then
/// accumulation runs in input order so rollup tie-breaks are deterministic.
/// `agent_filter`, when present, restricts accumulation to the named agent
/// cohort before the same rollup logic runs.
pub fn aggregate_orders(
    orders: &[Order],
    period: &Period,
    cost_prices: &CostPriceMap,
    policy: &CurrencyPolicy,
    rate: ExchangeRate,
    agent_filter: Option<&HashSet<SdId>>,
) -> SalesAggregate {
    let mut agg = SalesAggregate::default();
    let mut product_index: HashMap<SdId, usize> = HashMap::new();
    let mut agent_index: HashMap<SdId, usize> = HashMap::new();
    let mut client_index: HashMap<SdId, usize> = HashMap::new();
    let mut active: HashSet<SdId> = HashSet::new();

    for order in orders {
        if order.is_full_return() {
            continue;
        }
        if !period.contains(&order.date) {
            continue;
        }
        if let Some(allowed) = agent_filter {
            if !allowed.contains(&order.agent.id) {
                continue;
            }
        }

        agg.order_count += 1;
        let currency = classify_order(order, policy);
        agg.sales.add(currency, order.total);
        agg.total_local = agg.total_local + normalize_order_total(order, policy, rate);

        if !order.client.id.is_empty() {
            active.insert(order.client.id.clone());
        }

        let agent_row = party_row(&mut agg.agents, &mut agent_index, &order.agent.id, &order.agent.name);
        agg.agents[agent_row].order_count += 1;
        let client_row = party_row(&mut agg.clients, &mut client_index, &order.client.id, &order.client.name);
        agg.clients[client_row].order_count += 1;

        for line in &order.lines {
            let (_, sale_local) = classify_line_amount(line.amount, rate);
            let record = line_profit_record(
                &line.product_id,
                sale_local,
                unit_cost_local(cost_prices, &line.product_id),
                line.quantity,
            );
            if record.is_bonus_item {
                agg.bonus_line_count += 1;
            }
            agg.profit_total = agg.profit_total + record.profit;

            let row = product_row(&mut agg.products, &mut product_index, line);
            agg.products[row].quantity = agg.products[row].quantity + line.quantity;
            agg.products[row].sales_local = agg.products[row].sales_local + sale_local;
            agg.products[row].profit = agg.products[row].profit + record.profit;

            agg.agents[agent_row].sales_local = agg.agents[agent_row].sales_local + sale_local;
            agg.agents[agent_row].profit = agg.agents[agent_row].profit + record.profit;
            agg.clients[client_row].sales_local = agg.clients[client_row].sales_local + sale_local;
            agg.clients[client_row].profit = agg.clients[client_row].profit + record.profit;
        }
    }

    agg.active_clients = active.len() as u64;

    // Stable sorts keep encounter order on ties.
    agg.products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    agg.agents.sort_by(|a, b| b.sales_local.cmp(&a.sales_local));
    agg.clients.sort_by(|a, b| b.sales_local.cmp(&a.sales_local));
    agg
}

fn product_row(
    rows: &mut Vec<ProductSales>,
    index: &mut HashMap<SdId, usize>,
    line: &crate::domain::LineItem,
) -> usize {
    *index.entry(line.product_id.clone()).or_insert_with(|| {
        rows.push(ProductSales {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            quantity: Decimal::zero(),
            sales_local: Decimal::zero(),
            profit: Decimal::zero(),
        });
        rows.len() - 1
    })
}

fn party_row(
    rows: &mut Vec<PartySales>,
    index: &mut HashMap<SdId, usize>,
    id: &SdId,
    name: &str,
) -> usize {
    *index.entry(id.clone()).or_insert_with(|| {
        rows.push(PartySales {
            id: id.clone(),
            name: name.to_string(),
            sales_local: Decimal::zero(),
            profit: Decimal::zero(),
            order_count: 0,
        });
        rows.len() - 1
    })
}
