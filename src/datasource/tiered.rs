//! Two-tier source: peer cache first, direct RPC as fallback.

use super::{CacheServiceClient, SalesDoctorApi, SourceError};
use crate::domain::{
    Agent, BalanceRecord, Client, Order, PaymentRecord, PriceType, Product, PurchaseRecord,
};
use crate::engine::Period;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Prefers the peer cache for the entities it serves (orders, balances,
/// payments) and falls through to the direct client for everything else or
/// when the peer is down or answers `status: false`.
#[derive(Debug, Clone)]
pub struct TieredSource {
    peer: Arc<CacheServiceClient>,
    direct: Arc<dyn SalesDoctorApi>,
}

impl TieredSource {
    pub fn new(peer: Arc<CacheServiceClient>, direct: Arc<dyn SalesDoctorApi>) -> Self {
        Self { peer, direct }
    }
}

#[async_trait]
impl SalesDoctorApi for TieredSource {
    async fn fetch_orders(&self, period: Option<&Period>) -> Result<Vec<Order>, SourceError> {
        // The peer serves the full listing; period filtering happens in the
        // aggregation engine, so only unbounded fetches can use it.
        if period.is_none() || period.is_some_and(Period::is_unbounded) {
            match self.peer.fetch_orders().await {
                Ok(orders) => return Ok(orders),
                Err(e) => warn!("Peer cache orders unavailable, going direct: {}", e),
            }
        }
        self.direct.fetch_orders(period).await
    }

    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, SourceError> {
        match self.peer.fetch_balances().await {
            Ok(balances) => Ok(balances),
            Err(e) => {
                warn!("Peer cache balances unavailable, going direct: {}", e);
                self.direct.fetch_balances().await
            }
        }
    }

    async fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, SourceError> {
        match self.peer.fetch_payments().await {
            Ok(payments) => Ok(payments),
            Err(e) => {
                warn!("Peer cache payments unavailable, going direct: {}", e);
                self.direct.fetch_payments().await
            }
        }
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        self.direct.fetch_products().await
    }

    async fn fetch_clients(&self) -> Result<Vec<Client>, SourceError> {
        self.direct.fetch_clients().await
    }

    async fn fetch_purchases(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        self.direct.fetch_purchases().await
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>, SourceError> {
        self.direct.fetch_agents().await
    }

    async fn fetch_price_types(&self) -> Result<Vec<PriceType>, SourceError> {
        self.direct.fetch_price_types().await
    }
}
