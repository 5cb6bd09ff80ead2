//! Mock data source for testing without network calls.

use super::{SalesDoctorApi, SourceError};
use crate::domain::{
    Agent, BalanceRecord, Client, Order, PaymentRecord, PriceType, Product, PurchaseRecord,
};
use crate::engine::Period;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock source returning predefined data, with per-entity failure
/// injection and call counting for cache-behavior tests.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    orders: Vec<Order>,
    products: Vec<Product>,
    clients: Vec<Client>,
    purchases: Vec<PurchaseRecord>,
    balances: Vec<BalanceRecord>,
    payments: Vec<PaymentRecord>,
    agents: Vec<Agent>,
    price_types: Vec<PriceType>,
    failing: HashSet<&'static str>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(mut self, orders: Vec<Order>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_clients(mut self, clients: Vec<Client>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_purchases(mut self, purchases: Vec<PurchaseRecord>) -> Self {
        self.purchases = purchases;
        self
    }

    pub fn with_balances(mut self, balances: Vec<BalanceRecord>) -> Self {
        self.balances = balances;
        self
    }

    pub fn with_payments(mut self, payments: Vec<PaymentRecord>) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_price_types(mut self, price_types: Vec<PriceType>) -> Self {
        self.price_types = price_types;
        self
    }

    /// Make one entity's fetch fail with a transport error.
    pub fn failing(mut self, entity: &'static str) -> Self {
        self.failing.insert(entity);
        self
    }

    /// How many times an entity was fetched.
    pub fn call_count(&self, entity: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(entity).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record(&self, entity: &'static str) -> Result<(), SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(entity).or_insert(0) += 1;
        }
        if self.failing.contains(entity) {
            return Err(SourceError::Transport(format!(
                "injected {} failure",
                entity
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SalesDoctorApi for MockApi {
    async fn fetch_orders(&self, period: Option<&Period>) -> Result<Vec<Order>, SourceError> {
        self.record("orders")?;
        Ok(self
            .orders
            .iter()
            .filter(|o| period.map_or(true, |p| p.contains(&o.date)))
            .cloned()
            .collect())
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        self.record("products")?;
        Ok(self.products.clone())
    }

    async fn fetch_clients(&self) -> Result<Vec<Client>, SourceError> {
        self.record("clients")?;
        Ok(self.clients.clone())
    }

    async fn fetch_purchases(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        self.record("purchases")?;
        Ok(self.purchases.clone())
    }

    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, SourceError> {
        self.record("balances")?;
        Ok(self.balances.clone())
    }

    async fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, SourceError> {
        self.record("payments")?;
        Ok(self.payments.clone())
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>, SourceError> {
        self.record("agents")?;
        Ok(self.agents.clone())
    }

    async fn fetch_price_types(&self) -> Result<Vec<PriceType>, SourceError> {
        self.record("priceTypes")?;
        Ok(self.price_types.clone())
    }
}
