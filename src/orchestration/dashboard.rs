//! Dashboard service: cache read-through over the upstream source plus the
//! aggregation passes behind each endpoint.
//!
//! Snapshot policy per entity: fresh cache wins; a stale value is served
//! immediately while a background refresh runs; a cold miss awaits one
//! fetch and degrades to an empty default if that fetch fails. Endpoints
//! therefore always answer, with at worst empty sections.

use crate::cache::{CacheKey, KeyStatus, Slot, SnapshotCache};
use crate::datasource::{CacheServiceClient, SalesDoctorApi, SourceError};
use crate::domain::{
    Agent, BalanceRecord, Client, CurrencyPolicy, Order, PaymentRecord, PriceType, Product, SdDate,
    SdId,
};
use crate::engine::{
    aggregate_agent_debts, aggregate_debt, aggregate_orders, compute_overdue, resolve_cost_prices,
    AgentDebt, ClientOverdue, CostPriceMap, DebtSummary, ExchangeRate, PartySales, Period,
    RateOutOfRange, SalesAggregate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Sales statistics for one period, plus the cohort cut when configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    #[serde(flatten)]
    pub aggregate: SalesAggregate,
    /// Registered client count (OKB), from the full client listing.
    pub okb: u64,
    /// Same aggregation restricted to the iroda agent cohort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iroda: Option<SalesAggregate>,
}

/// Balance endpoint payload: summary buckets plus per-client overdue rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtOverview {
    #[serde(flatten)]
    pub summary: DebtSummary,
    /// Debtors with a due-date anchor, most overdue first.
    pub overdue: Vec<ClientOverdue>,
}

/// Cache status payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusView {
    pub keys: Vec<KeyStatus>,
    pub ttl_secs: u64,
    pub exchange_rate: crate::domain::Decimal,
}

/// The service layer behind every endpoint.
#[derive(Clone)]
pub struct Dashboard {
    source: Arc<dyn SalesDoctorApi>,
    /// Peer cache service for the pre-resolved cost-price map.
    peer: Option<Arc<CacheServiceClient>>,
    cache: Arc<SnapshotCache>,
    rate: Arc<RwLock<ExchangeRate>>,
    base_policy: CurrencyPolicy,
    iroda_agents: HashSet<SdId>,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn SalesDoctorApi>,
        peer: Option<Arc<CacheServiceClient>>,
        cache: Arc<SnapshotCache>,
        rate: ExchangeRate,
        base_policy: CurrencyPolicy,
        iroda_agents: HashSet<SdId>,
    ) -> Self {
        Self {
            source,
            peer,
            cache,
            rate: Arc::new(RwLock::new(rate)),
            base_policy,
            iroda_agents,
        }
    }

    pub async fn exchange_rate(&self) -> ExchangeRate {
        *self.rate.read().await
    }

    /// Replace the exchange rate; out-of-range input is rejected and the
    /// previous value retained.
    pub async fn set_exchange_rate(
        &self,
        rate: crate::domain::Decimal,
    ) -> Result<ExchangeRate, RateOutOfRange> {
        let validated = ExchangeRate::try_new(rate)?;
        *self.rate.write().await = validated;
        info!("Exchange rate set to {}", rate);
        // Cost prices embed the rate at resolution time.
        self.cache.cost_prices.invalidate().await;
        Ok(validated)
    }

    /// Sales statistics for a period.
    pub async fn stats(&self, period: &Period) -> StatsView {
        let (orders, cost_prices, clients, products, agents, policy, rate) = futures::join!(
            self.orders_snapshot(),
            self.cost_prices_snapshot(),
            self.clients_snapshot(),
            self.products_snapshot(),
            self.agents_snapshot(),
            self.effective_policy(),
            self.exchange_rate(),
        );
        let mut aggregate = aggregate_orders(&orders, period, &cost_prices, &policy, rate, None);
        fill_rollup_names(&mut aggregate, &products, &agents, &clients);
        let iroda = if self.iroda_agents.is_empty() {
            None
        } else {
            let mut cohort = aggregate_orders(
                &orders,
                period,
                &cost_prices,
                &policy,
                rate,
                Some(&self.iroda_agents),
            );
            fill_rollup_names(&mut cohort, &products, &agents, &clients);
            Some(cohort)
        };
        StatsView {
            aggregate,
            okb: clients.len() as u64,
            iroda,
        }
    }

    /// Canonical orders within the period, returns included.
    pub async fn orders(&self, period: &Period) -> Vec<Order> {
        self.orders_snapshot()
            .await
            .into_iter()
            .filter(|o| period.contains(&o.date))
            .collect()
    }

    /// Raw balance records, as served to peers.
    pub async fn balances(&self) -> Vec<BalanceRecord> {
        self.balances_snapshot().await
    }

    /// Debt summary plus per-client overdue anchors.
    pub async fn debt_overview(&self) -> DebtOverview {
        let (balances, payments, orders, policy) = futures::join!(
            self.balances_snapshot(),
            self.payments_snapshot(),
            self.orders_snapshot(),
            self.effective_policy(),
        );
        let summary = aggregate_debt(&balances, &payments, &policy);
        let mut overdue: Vec<ClientOverdue> =
            compute_overdue(&orders, &payments, &SdDate::today())
                .into_values()
                .collect();
        overdue.sort_by(|a, b| b.overdue_days.cmp(&a.overdue_days));
        DebtOverview { summary, overdue }
    }

    /// Payments with their currency buckets.
    pub async fn payments(&self) -> (Vec<PaymentRecord>, crate::domain::CurrencyBuckets) {
        let (payments, policy) = futures::join!(self.payments_snapshot(), self.effective_policy());
        let buckets = crate::engine::payment_buckets(&payments, &policy);
        (payments, buckets)
    }

    /// Resolved cost-price map.
    pub async fn cost_prices(&self) -> CostPriceMap {
        self.cost_prices_snapshot().await
    }

    /// Per-agent debt rollup, largest exposure first.
    pub async fn agent_debts(&self) -> Vec<AgentDebt> {
        let (balances, orders, payments, agents) = futures::join!(
            self.balances_snapshot(),
            self.orders_snapshot(),
            self.payments_snapshot(),
            self.agents_snapshot(),
        );
        let overdue = compute_overdue(&orders, &payments, &SdDate::today());
        let mut rows = aggregate_agent_debts(&balances, &orders, &overdue);
        let names = name_index(agents.iter().map(|a| (&a.id, a.name.as_str())));
        for row in &mut rows {
            fill_name(&mut row.agent.name, &row.agent.id, &names);
        }
        rows
    }

    pub async fn cache_status(&self) -> CacheStatusView {
        CacheStatusView {
            keys: self.cache.status().await,
            ttl_secs: self.cache.ttl().as_secs(),
            exchange_rate: self.exchange_rate().await.get(),
        }
    }

    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.cache.last_update_max().await
    }

    /// Manual cache clear; `None` clears everything.
    pub async fn invalidate(&self, keys: Option<Vec<CacheKey>>) {
        match keys {
            Some(keys) => {
                info!("Invalidating cache keys: {:?}", keys);
                self.cache.invalidate(&keys).await;
            }
            None => {
                info!("Invalidating all cache keys");
                self.cache.invalidate_all().await;
            }
        }
    }

    /// Classification policy with the price-type name union applied.
    async fn effective_policy(&self) -> CurrencyPolicy {
        let price_types = self.price_types_snapshot().await;
        self.base_policy.clone().with_price_types(&price_types)
    }

    async fn orders_snapshot(&self) -> Vec<Order> {
        let source = self.source.clone();
        self.snapshot(
            "orders",
            |c| &c.orders,
            move || async move { source.fetch_orders(None).await },
        )
        .await
    }

    async fn balances_snapshot(&self) -> Vec<BalanceRecord> {
        let source = self.source.clone();
        self.snapshot(
            "balances",
            |c| &c.balances,
            move || async move { source.fetch_balances().await },
        )
        .await
    }

    async fn payments_snapshot(&self) -> Vec<PaymentRecord> {
        let source = self.source.clone();
        self.snapshot(
            "payments",
            |c| &c.payments,
            move || async move { source.fetch_payments().await },
        )
        .await
    }

    async fn clients_snapshot(&self) -> Vec<Client> {
        let source = self.source.clone();
        self.snapshot(
            "clients",
            |c| &c.clients,
            move || async move { source.fetch_clients().await },
        )
        .await
    }

    async fn products_snapshot(&self) -> Vec<Product> {
        let source = self.source.clone();
        self.snapshot(
            "products",
            |c| &c.products,
            move || async move { source.fetch_products().await },
        )
        .await
    }

    async fn agents_snapshot(&self) -> Vec<Agent> {
        let source = self.source.clone();
        self.snapshot(
            "agents",
            |c| &c.agents,
            move || async move { source.fetch_agents().await },
        )
        .await
    }

    async fn price_types_snapshot(&self) -> Vec<PriceType> {
        let source = self.source.clone();
        self.snapshot(
            "priceTypes",
            |c| &c.price_types,
            move || async move { source.fetch_price_types().await },
        )
        .await
    }

    /// Cost prices come pre-resolved from the peer cache when one is
    /// configured; otherwise they are rebuilt from the purchase history at
    /// the current exchange rate.
    async fn cost_prices_snapshot(&self) -> CostPriceMap {
        let source = self.source.clone();
        let peer = self.peer.clone();
        let rate = self.exchange_rate().await;
        self.snapshot(
            "costPrices",
            |c| &c.cost_prices,
            move || async move {
                if let Some(peer) = peer {
                    match peer.fetch_cost_prices().await {
                        Ok(map) => return Ok(map),
                        Err(e) => warn!("Peer cost prices unavailable, resolving locally: {}", e),
                    }
                }
                let purchases = source.fetch_purchases().await?;
                Ok(resolve_cost_prices(&purchases, rate))
            },
        )
        .await
    }

    /// Read-through with the stale-while-refresh policy.
    async fn snapshot<T, S, F, Fut>(&self, entity: &'static str, slot_of: S, fetch: F) -> T
    where
        T: Clone + Default + Send + Sync + 'static,
        S: Fn(&SnapshotCache) -> &Slot<T> + Copy + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        let ttl = self.cache.ttl();
        let slot = slot_of(self.cache.as_ref());
        if let Some((value, fresh)) = slot.get_with_freshness(ttl).await {
            if !fresh {
                debug!("Serving stale {} while refreshing in background", entity);
                let cache = self.cache.clone();
                tokio::spawn(async move {
                    if let Err(e) = slot_of(cache.as_ref()).refresh_with(ttl, fetch).await {
                        warn!("Background {} refresh failed: {}", entity, e);
                    }
                });
            }
            return value;
        }
        match slot.refresh_with(ttl, fetch).await {
            Ok(value) => value,
            Err(e) => {
                warn!("{} fetch failed with cold cache, serving empty: {}", entity, e);
                slot.get().await.unwrap_or_default()
            }
        }
    }
}

fn name_index<'a>(pairs: impl Iterator<Item = (&'a SdId, &'a str)>) -> HashMap<&'a SdId, &'a str> {
    pairs.filter(|(_, name)| !name.is_empty()).collect()
}

fn fill_name(name: &mut String, id: &SdId, names: &HashMap<&SdId, &str>) {
    if name.is_empty() {
        if let Some(found) = names.get(id) {
            *name = (*found).to_string();
        }
    }
}

/// Orders in their flat upstream variants often carry bare ids; the catalog
/// listings supply the display names those rollup rows are missing.
fn fill_rollup_names(
    agg: &mut SalesAggregate,
    products: &[Product],
    agents: &[Agent],
    clients: &[Client],
) {
    let product_names = name_index(products.iter().map(|p| (&p.id, p.name.as_str())));
    for row in &mut agg.products {
        fill_name(&mut row.product_name, &row.product_id, &product_names);
    }
    fill_party_names(&mut agg.agents, agents.iter().map(|a| (&a.id, a.name.as_str())));
    fill_party_names(&mut agg.clients, clients.iter().map(|c| (&c.id, c.name.as_str())));
}

fn fill_party_names<'a>(
    rows: &mut [PartySales],
    pairs: impl Iterator<Item = (&'a SdId, &'a str)>,
) {
    let names = name_index(pairs);
    for row in rows {
        fill_name(&mut row.name, &row.id, &names);
    }
}
