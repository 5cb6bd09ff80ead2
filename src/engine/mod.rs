//! Pure aggregation engine: currency policy, costs, profit, debt.
//!
//! Nothing here does I/O. Every function is deterministic over its input
//! snapshot so aggregation passes are reproducible.

pub mod classify;
pub mod costs;
pub mod debts;
pub mod orders;
pub mod profit;

pub use classify::{
    classify_cost_price, classify_line_amount, classify_order, normalize_order_total,
    ExchangeRate, RateOutOfRange,
};
pub use costs::{resolve_cost_prices, unit_cost_local, CostPrice, CostPriceMap};
pub use debts::{
    aggregate_agent_debts, aggregate_debt, compute_overdue, payment_buckets, AgentDebt,
    ClientOverdue, DebtSummary,
};
pub use orders::{aggregate_orders, PartySales, Period, ProductSales, SalesAggregate};
pub use profit::{compute_line_profit, line_profit_record, ProfitRecord};
