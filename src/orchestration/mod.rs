//! Service layer wiring the cache, the upstream source, and the
//! aggregation engine into the views the API serves.

pub mod dashboard;

pub use dashboard::{CacheStatusView, Dashboard, DebtOverview, StatsView};
