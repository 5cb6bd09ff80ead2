//! Currency classification heuristics and the exchange rate.
//!
//! Upstream amounts carry no reliable currency tag. Classification is a
//! documented policy over payment type, price type, and magnitude; the
//! thresholds (10000 for order totals, 100 for line items and cost prices)
//! are load-bearing for parity with historical reports and must not change.

use crate::domain::{Currency, CurrencyPolicy, Decimal, Order};
use thiserror::Error;

/// Order totals below this are treated as USD.
pub fn order_usd_threshold() -> Decimal {
    Decimal::from_i64(10_000)
}

/// Line amounts at or below this are treated as USD. Unit-level amounts are
/// smaller than order totals, hence the separate constant.
pub fn line_usd_threshold() -> Decimal {
    Decimal::from_i64(100)
}

/// Purchase cost prices strictly below this are treated as USD.
pub fn cost_usd_threshold() -> Decimal {
    Decimal::from_i64(100)
}

/// USD → local exchange rate, kept inside its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("exchange rate {0} outside valid range [1000, 50000]")]
pub struct RateOutOfRange(pub Decimal);

impl ExchangeRate {
    pub const DEFAULT: i64 = 12_200;
    pub const MIN: i64 = 1_000;
    pub const MAX: i64 = 50_000;

    /// Validate a proposed rate. Out-of-range input is rejected so the
    /// caller can retain the previous value.
    pub fn try_new(rate: Decimal) -> Result<ExchangeRate, RateOutOfRange> {
        if rate < Decimal::from_i64(Self::MIN) || rate > Decimal::from_i64(Self::MAX) {
            return Err(RateOutOfRange(rate));
        }
        Ok(ExchangeRate(rate))
    }

    pub fn get(&self) -> Decimal {
        self.0
    }

    /// Convert a USD amount to local currency.
    pub fn to_local(&self, usd: Decimal) -> Decimal {
        usd * self.0
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate(Decimal::from_i64(Self::DEFAULT))
    }
}

/// Classify an order's denomination. Priority order, first match wins:
/// USD payment type, USD price type, magnitude below the order threshold;
/// otherwise the payment type's local bucket.
pub fn classify_order(order: &Order, policy: &CurrencyPolicy) -> Currency {
    if policy.is_usd_payment_type(order.payment_type.as_ref()) {
        return Currency::Usd;
    }
    if policy.is_usd_price_type(order.price_type.as_ref()) {
        return Currency::Usd;
    }
    if order.total < order_usd_threshold() {
        return Currency::Usd;
    }
    policy.payment_currency(order.payment_type.as_ref())
}

/// Order total in local currency units.
pub fn normalize_order_total(order: &Order, policy: &CurrencyPolicy, rate: ExchangeRate) -> Decimal {
    if classify_order(order, policy).is_usd() {
        rate.to_local(order.total)
    } else {
        order.total
    }
}

/// Classify a line-level amount by magnitude and return it in local units.
pub fn classify_line_amount(raw: Decimal, rate: ExchangeRate) -> (Currency, Decimal) {
    if raw <= line_usd_threshold() {
        (Currency::Usd, rate.to_local(raw))
    } else {
        (Currency::LocalCash, raw)
    }
}

/// Classify a purchase cost price (strictly below the threshold → USD) and
/// return it in local units.
pub fn classify_cost_price(raw: Decimal, rate: ExchangeRate) -> (Currency, Decimal) {
    if raw < cost_usd_threshold() {
        (Currency::Usd, rate.to_local(raw))
    } else {
        (Currency::LocalCash, raw)
    }
}
