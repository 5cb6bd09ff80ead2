//! Data source abstraction over the Sales Doctor RPC surface.

use crate::domain::{
    Agent, BalanceRecord, Client, Order, PaymentRecord, PriceType, Product, PurchaseRecord,
};
use crate::engine::Period;
use async_trait::async_trait;
use std::fmt;

pub mod cache_service;
pub mod mock;
pub mod salesdoctor;
pub mod tiered;

pub use cache_service::CacheServiceClient;
pub use mock::MockApi;
pub use salesdoctor::SalesDoctorClient;
pub use tiered::TieredSource;

/// Upstream entity listings the dashboard consumes.
///
/// Implementations own pagination, authentication and retry; callers get
/// canonical records in fetch order (rollup tie-breaks depend on that
/// order being stable).
#[async_trait]
pub trait SalesDoctorApi: Send + Sync + fmt::Debug {
    /// Orders, optionally bounded to a period. `None` fetches the full
    /// listing (the cache layer stores the full set and filters later).
    async fn fetch_orders(&self, period: Option<&Period>) -> Result<Vec<Order>, SourceError>;

    /// Full product catalog.
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError>;

    /// Full client listing. Its length is the registered-client count (OKB).
    async fn fetch_clients(&self) -> Result<Vec<Client>, SourceError>;

    /// Warehouse purchase history, the cost-price source.
    async fn fetch_purchases(&self) -> Result<Vec<PurchaseRecord>, SourceError>;

    /// Per-client balance snapshots.
    async fn fetch_balances(&self) -> Result<Vec<BalanceRecord>, SourceError>;

    /// Received payments.
    async fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, SourceError>;

    /// Agent listing.
    async fn fetch_agents(&self) -> Result<Vec<Agent>, SourceError>;

    /// Price-type catalog; display names feed USD classification.
    async fn fetch_price_types(&self) -> Result<Vec<PriceType>, SourceError>;
}

/// Error type for upstream fetch operations.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Network failure or per-call timeout.
    Transport(String),
    /// Non-success HTTP status that is not auth-related.
    Http { status: u16, message: String },
    /// Credentials rejected; raised after the single re-auth retry failed.
    AuthExpired,
    /// Response body did not parse as the expected shape.
    Parse(String),
    /// Upstream answered with an error payload (`status: false`).
    Upstream(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Transport(msg) => write!(f, "Transport error: {}", msg),
            SourceError::Http { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            SourceError::AuthExpired => write!(f, "Authentication expired"),
            SourceError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SourceError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport error: connection refused");

        let err = SourceError::Http {
            status: 503,
            message: "Service unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Service unavailable");

        assert_eq!(SourceError::AuthExpired.to_string(), "Authentication expired");

        let err = SourceError::Upstream("license expired".to_string());
        assert_eq!(err.to_string(), "Upstream error: license expired");
    }
}
