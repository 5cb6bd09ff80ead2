//! TTL snapshot cache for upstream fetches.
//!
//! One slot per cached entity, each carrying its own value and last-write
//! timestamp. Reads never block on a refresh: stale values are still
//! returned, staleness only decides whether a refresh should run. A refresh
//! publishes its result atomically and only on success, so a concurrent
//! reader either sees the prior snapshot or the complete new one.

use crate::domain::{Agent, BalanceRecord, Client, Order, PaymentRecord, PriceType, Product};
use crate::engine::CostPriceMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached value with its write timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub last_updated: DateTime<Utc>,
}

/// One cached entity slot.
///
/// The refresh mutex admits at most one in-flight refresh; the entry lock
/// is held only for the swap, never across a fetch.
#[derive(Debug, Default)]
pub struct Slot<T> {
    entry: RwLock<Option<CacheEntry<T>>>,
    refresh: Mutex<()>,
}

impl<T: Clone> Slot<T> {
    pub fn new() -> Self {
        Slot {
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Current value regardless of freshness.
    pub async fn get(&self) -> Option<T> {
        self.entry.read().await.as_ref().map(|e| e.value.clone())
    }

    pub async fn get_entry(&self) -> Option<CacheEntry<T>> {
        self.entry.read().await.clone()
    }

    pub async fn put(&self, value: T) {
        *self.entry.write().await = Some(CacheEntry {
            value,
            last_updated: Utc::now(),
        });
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.entry.read().await.as_ref().map(|e| e.last_updated)
    }

    pub async fn is_fresh(&self, ttl: Duration) -> bool {
        self.fresh_value(ttl).await.is_some()
    }

    /// Value plus its freshness, read under one lock.
    pub async fn get_with_freshness(&self, ttl: Duration) -> Option<(T, bool)> {
        let guard = self.entry.read().await;
        let entry = guard.as_ref()?;
        Some((entry.value.clone(), entry_is_fresh(entry, ttl)))
    }

    async fn fresh_value(&self, ttl: Duration) -> Option<T> {
        let guard = self.entry.read().await;
        let entry = guard.as_ref()?;
        if entry_is_fresh(entry, ttl) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Run `fetch` under the single-flight guard and publish on success.
    ///
    /// A caller that lost the race to an already-running refresh finds a
    /// fresh entry once it holds the guard and returns that instead of
    /// fetching again. On fetch failure the prior entry is left untouched.
    pub async fn refresh_with<F, Fut, E>(&self, ttl: Duration, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _guard = self.refresh.lock().await;
        if let Some(value) = self.fresh_value(ttl).await {
            return Ok(value);
        }
        let value = fetch().await?;
        self.put(value.clone()).await;
        Ok(value)
    }
}

/// A write from the "future" (clock adjustment) counts as fresh.
fn entry_is_fresh<T>(entry: &CacheEntry<T>, ttl: Duration) -> bool {
    let age = Utc::now().signed_duration_since(entry.last_updated);
    match age.to_std() {
        Ok(age) => age < ttl,
        Err(_) => true,
    }
}

/// Names of the cached entities, as used by the status and invalidate
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheKey {
    Orders,
    CostPrices,
    Balances,
    Payments,
    Clients,
    Products,
    Agents,
    PriceTypes,
}

impl CacheKey {
    pub const ALL: [CacheKey; 8] = [
        CacheKey::Orders,
        CacheKey::CostPrices,
        CacheKey::Balances,
        CacheKey::Payments,
        CacheKey::Clients,
        CacheKey::Products,
        CacheKey::Agents,
        CacheKey::PriceTypes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Orders => "orders",
            CacheKey::CostPrices => "costPrices",
            CacheKey::Balances => "balances",
            CacheKey::Payments => "payments",
            CacheKey::Clients => "clients",
            CacheKey::Products => "products",
            CacheKey::Agents => "agents",
            CacheKey::PriceTypes => "priceTypes",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCacheKey(pub String);

impl fmt::Display for UnknownCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cache key: {}", self.0)
    }
}

impl std::error::Error for UnknownCacheKey {}

impl FromStr for CacheKey {
    type Err = UnknownCacheKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheKey::ALL
            .iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownCacheKey(s.to_string()))
    }
}

/// Freshness view of one slot, served by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    pub key: CacheKey,
    pub fresh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

/// The process-wide snapshot cache, one slot per upstream entity.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    pub orders: Slot<Vec<Order>>,
    pub cost_prices: Slot<CostPriceMap>,
    pub balances: Slot<Vec<BalanceRecord>>,
    pub payments: Slot<Vec<PaymentRecord>>,
    pub clients: Slot<Vec<Client>>,
    pub products: Slot<Vec<Product>>,
    pub agents: Slot<Vec<Agent>>,
    pub price_types: Slot<Vec<PriceType>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        SnapshotCache {
            ttl,
            orders: Slot::new(),
            cost_prices: Slot::new(),
            balances: Slot::new(),
            payments: Slot::new(),
            clients: Slot::new(),
            products: Slot::new(),
            agents: Slot::new(),
            price_types: Slot::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            match key {
                CacheKey::Orders => self.orders.invalidate().await,
                CacheKey::CostPrices => self.cost_prices.invalidate().await,
                CacheKey::Balances => self.balances.invalidate().await,
                CacheKey::Payments => self.payments.invalidate().await,
                CacheKey::Clients => self.clients.invalidate().await,
                CacheKey::Products => self.products.invalidate().await,
                CacheKey::Agents => self.agents.invalidate().await,
                CacheKey::PriceTypes => self.price_types.invalidate().await,
            }
        }
    }

    pub async fn invalidate_all(&self) {
        self.invalidate(&CacheKey::ALL).await;
    }

    pub async fn key_status(&self, key: CacheKey) -> KeyStatus {
        let (fresh, last_update) = match key {
            CacheKey::Orders => self.slot_status(&self.orders).await,
            CacheKey::CostPrices => self.slot_status(&self.cost_prices).await,
            CacheKey::Balances => self.slot_status(&self.balances).await,
            CacheKey::Payments => self.slot_status(&self.payments).await,
            CacheKey::Clients => self.slot_status(&self.clients).await,
            CacheKey::Products => self.slot_status(&self.products).await,
            CacheKey::Agents => self.slot_status(&self.agents).await,
            CacheKey::PriceTypes => self.slot_status(&self.price_types).await,
        };
        KeyStatus {
            key,
            fresh,
            last_update,
        }
    }

    pub async fn status(&self) -> Vec<KeyStatus> {
        let mut out = Vec::with_capacity(CacheKey::ALL.len());
        for key in CacheKey::ALL {
            out.push(self.key_status(key).await);
        }
        out
    }

    /// Most recent write across all slots, for the response envelope.
    pub async fn last_update_max(&self) -> Option<DateTime<Utc>> {
        self.status()
            .await
            .into_iter()
            .filter_map(|s| s.last_update)
            .max()
    }

    async fn slot_status<T: Clone>(&self, slot: &Slot<T>) -> (bool, Option<DateTime<Utc>>) {
        (slot.is_fresh(self.ttl).await, slot.last_updated().await)
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        SnapshotCache::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let slot: Slot<Vec<i64>> = Slot::new();
        assert_eq!(slot.get().await, None);
        slot.put(vec![1, 2, 3]).await;
        assert_eq!(slot.get().await, Some(vec![1, 2, 3]));
        assert!(slot.last_updated().await.is_some());
    }

    #[tokio::test]
    async fn test_freshness_follows_ttl() {
        let slot: Slot<i64> = Slot::new();
        assert!(!slot.is_fresh(Duration::from_secs(60)).await);
        slot.put(7).await;
        assert!(slot.is_fresh(Duration::from_secs(60)).await);
        assert!(!slot.is_fresh(Duration::ZERO).await);
        // Stale entries still read back.
        assert_eq!(slot.get().await, Some(7));
    }

    #[tokio::test]
    async fn test_invalidate_clears() {
        let slot: Slot<i64> = Slot::new();
        slot.put(7).await;
        slot.invalidate().await;
        assert_eq!(slot.get().await, None);
        assert_eq!(slot.last_updated().await, None);
    }

    #[tokio::test]
    async fn test_refresh_publishes_on_success() {
        let slot: Slot<i64> = Slot::new();
        let value = slot
            .refresh_with(Duration::from_secs(60), || async { Ok::<_, ()>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(slot.get().await, Some(42));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_prior_value() {
        let slot: Slot<i64> = Slot::new();
        slot.put(7).await;
        let result = slot
            .refresh_with(Duration::ZERO, || async { Err::<i64, _>("upstream down") })
            .await;
        assert_eq!(result, Err("upstream down"));
        assert_eq!(slot.get().await, Some(7));
    }

    #[tokio::test]
    async fn test_fresh_entry_short_circuits_refresh() {
        let slot: Slot<i64> = Slot::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            slot.refresh_with(Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(1)
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_fetch_once() {
        let slot: Arc<Slot<i64>> = Arc::new(Slot::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let refresh = |slot: Arc<Slot<i64>>, calls: Arc<AtomicUsize>| async move {
            slot.refresh_with(Duration::from_secs(60), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, ()>(9)
            })
            .await
        };

        let (a, b) = tokio::join!(
            refresh(slot.clone(), calls.clone()),
            refresh(slot.clone(), calls.clone())
        );
        assert_eq!(a, Ok(9));
        assert_eq!(b, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_snapshot_cache_status_and_invalidate() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        cache.orders.put(vec![]).await;
        cache.balances.put(vec![]).await;

        let status = cache.status().await;
        assert_eq!(status.len(), CacheKey::ALL.len());
        let orders = status.iter().find(|s| s.key == CacheKey::Orders).unwrap();
        assert!(orders.fresh);
        let payments = status.iter().find(|s| s.key == CacheKey::Payments).unwrap();
        assert!(!payments.fresh);
        assert!(cache.last_update_max().await.is_some());

        cache.invalidate(&[CacheKey::Orders]).await;
        assert_eq!(cache.orders.get().await, None);
        assert!(cache.balances.get().await.is_some());

        cache.invalidate_all().await;
        assert_eq!(cache.balances.get().await, None);
        assert_eq!(cache.last_update_max().await, None);
    }

    #[test]
    fn test_cache_key_parse() {
        assert_eq!("orders".parse::<CacheKey>().unwrap(), CacheKey::Orders);
        assert_eq!("costPrices".parse::<CacheKey>().unwrap(), CacheKey::CostPrices);
        assert_eq!("costprices".parse::<CacheKey>().unwrap(), CacheKey::CostPrices);
        assert!("junk".parse::<CacheKey>().is_err());
        assert_eq!(CacheKey::PriceTypes.to_string(), "priceTypes");
    }
}
