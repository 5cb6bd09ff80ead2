pub mod api;
pub mod cache;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use cache::{CacheKey, SnapshotCache};
pub use config::Config;
pub use datasource::{
    CacheServiceClient, MockApi, SalesDoctorApi, SalesDoctorClient, SourceError, TieredSource,
};
pub use domain::{
    Currency, CurrencyBuckets, CurrencyPolicy, Decimal, Order, PartyRef, SdDate, SdId,
};
pub use engine::{ExchangeRate, Period};
pub use error::AppError;
pub use orchestration::Dashboard;
