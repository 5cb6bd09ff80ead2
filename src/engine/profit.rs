//! Per-line profit.
//!
//! Profit is always clamped to `[0, sale]`. The constants (50% ceiling,
//! 15% fallback margin) must stay exactly as they are for parity with
//! historical reports.

use crate::domain::{Decimal, SdId};
use rust_decimal::Decimal as RustDecimal;

/// Margin above this fraction of the sale amount is treated as a data
/// defect in the resolved cost.
fn margin_ceiling() -> Decimal {
    Decimal::new(RustDecimal::new(5, 1))
}

/// Assumed margin substituted when the ceiling trips.
fn fallback_margin() -> Decimal {
    Decimal::new(RustDecimal::new(15, 2))
}

/// Derived profit for one sold line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfitRecord {
    pub product_id: SdId,
    pub profit: Decimal,
    /// True when no resolvable cost existed and the whole sale counted as
    /// profit.
    pub is_bonus_item: bool,
}

/// Profit for one line, always in `[0, sale]`.
///
/// Rules, in order: non-positive sale earns nothing; non-positive cost means
/// a bonus item and the whole sale is profit; otherwise the raw margin is
/// floored at zero and, above 50% of the sale, replaced with a flat 15% of
/// the sale.
pub fn compute_line_profit(sale_local: Decimal, cost_local: Decimal, quantity: Decimal) -> Decimal {
    if !sale_local.is_positive() {
        return Decimal::zero();
    }
    if !cost_local.is_positive() {
        return sale_local;
    }
    let raw = sale_local - cost_local * quantity;
    if raw.is_negative() {
        return Decimal::zero();
    }
    if raw > margin_ceiling() * sale_local {
        return fallback_margin() * sale_local;
    }
    raw
}

/// Profit plus the bonus flag, for rollups that report bonus items.
pub fn line_profit_record(
    product_id: &SdId,
    sale_local: Decimal,
    cost_local: Option<Decimal>,
    quantity: Decimal,
) -> ProfitRecord {
    let cost = cost_local.unwrap_or_else(Decimal::zero);
    let is_bonus_item = sale_local.is_positive() && !cost.is_positive();
    ProfitRecord {
        product_id: product_id.clone(),
        profit: compute_line_profit(sale_local, cost, quantity),
        is_bonus_item,
    }
}
