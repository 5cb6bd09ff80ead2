//! Currency enumeration and the classification sets that drive bucketing.
//!
//! The upstream system has no trustworthy currency tags; a small closed set
//! of payment-type / price-type / currency identifiers is mapped onto the
//! `Currency` enum here. Unknown identifiers fall back to `LocalCash`;
//! that fallback is intended behavior, not an accident.

use crate::domain::{Decimal, PriceType, SdId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Closed currency set used by all bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Currency {
    /// Local currency, cash. Also the fallback for unknown identifiers.
    LocalCash,
    /// Local currency via bank transfer / terminal.
    LocalNoncash,
    /// US dollars.
    Usd,
    /// Click and other local e-payment channels.
    Click,
}

impl Currency {
    pub fn is_usd(&self) -> bool {
        matches!(self, Currency::Usd)
    }

    /// Map an upstream currency identifier (as found on balance records) to
    /// the closed set. Matching is by case-insensitive substring because the
    /// upstream mixes ids, codes and display names in the same field.
    pub fn from_upstream_id(id: &SdId) -> Currency {
        let s = id.as_str().to_lowercase();
        if s.contains("usd") || s.contains('$') || s.contains("dollar") {
            Currency::Usd
        } else if s.contains("click") {
            Currency::Click
        } else if s.contains("terminal") || s.contains("card") || s.contains("noncash") {
            Currency::LocalNoncash
        } else {
            Currency::LocalCash
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Currency::LocalCash => "local-cash",
            Currency::LocalNoncash => "local-noncash",
            Currency::Usd => "usd",
            Currency::Click => "click",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyParseError(pub String);

impl fmt::Display for CurrencyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown currency: {}", self.0)
    }
}

impl std::error::Error for CurrencyParseError {}

impl FromStr for Currency {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local-cash" => Ok(Currency::LocalCash),
            "local-noncash" => Ok(Currency::LocalNoncash),
            "usd" => Ok(Currency::Usd),
            "click" => Ok(Currency::Click),
            other => Err(CurrencyParseError(other.to_string())),
        }
    }
}

/// Classification sets for payment types and price types.
///
/// The id sets are deployment configuration (the upstream type catalog is
/// opaque); the USD price-type set is additionally unioned at runtime with
/// every price type whose display name looks dollar-denominated.
#[derive(Debug, Clone, Default)]
pub struct CurrencyPolicy {
    pub usd_payment_types: HashSet<SdId>,
    pub noncash_payment_types: HashSet<SdId>,
    pub click_payment_types: HashSet<SdId>,
    pub usd_price_types: HashSet<SdId>,
}

impl CurrencyPolicy {
    /// Deployment defaults for the standard Sales Doctor type catalog.
    pub fn standard() -> Self {
        CurrencyPolicy {
            usd_payment_types: [SdId::new("4")].into_iter().collect(),
            noncash_payment_types: [SdId::new("2")].into_iter().collect(),
            click_payment_types: [SdId::new("3")].into_iter().collect(),
            usd_price_types: HashSet::new(),
        }
    }

    /// Currency bucket for a payment-type id. Unknown ids land in
    /// local-cash (documented fallback).
    pub fn payment_currency(&self, payment_type: Option<&SdId>) -> Currency {
        match payment_type {
            Some(id) if self.usd_payment_types.contains(id) => Currency::Usd,
            Some(id) if self.noncash_payment_types.contains(id) => Currency::LocalNoncash,
            Some(id) if self.click_payment_types.contains(id) => Currency::Click,
            _ => Currency::LocalCash,
        }
    }

    pub fn is_usd_payment_type(&self, payment_type: Option<&SdId>) -> bool {
        payment_type.is_some_and(|id| self.usd_payment_types.contains(id))
    }

    pub fn is_usd_price_type(&self, price_type: Option<&SdId>) -> bool {
        price_type.is_some_and(|id| self.usd_price_types.contains(id))
    }

    /// Union the static USD price-type set with every listed price type
    /// whose display name contains "$" or "dollar" (case-insensitive).
    pub fn with_price_types(mut self, price_types: &[PriceType]) -> Self {
        for pt in price_types {
            let name = pt.name.to_lowercase();
            if name.contains('$') || name.contains("dollar") {
                self.usd_price_types.insert(pt.id.clone());
            }
        }
        self
    }
}

/// Per-currency accumulator over the closed set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyBuckets {
    pub local_cash: Decimal,
    pub local_noncash: Decimal,
    pub usd: Decimal,
    pub click: Decimal,
}

impl CurrencyBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, currency: Currency, amount: Decimal) {
        let slot = match currency {
            Currency::LocalCash => &mut self.local_cash,
            Currency::LocalNoncash => &mut self.local_noncash,
            Currency::Usd => &mut self.usd,
            Currency::Click => &mut self.click,
        };
        *slot = *slot + amount;
    }

    pub fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::LocalCash => self.local_cash,
            Currency::LocalNoncash => self.local_noncash,
            Currency::Usd => self.usd,
            Currency::Click => self.click,
        }
    }
}
