//! Cost-price resolution from warehouse purchase history.
//!
//! Every product gets at most one effective cost price: the one from the
//! most recent purchase document that priced it. Profit math downstream
//! consumes the resolved map and falls back to a margin estimate for
//! products that never appear here.

use crate::domain::{Currency, Decimal, PurchaseRecord, SdDate, SdId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::classify::{classify_cost_price, ExchangeRate};

/// Effective cost price of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPrice {
    /// Unit cost as entered on the purchase document.
    pub raw: Decimal,
    /// Inferred denomination of `raw`.
    pub currency: Currency,
    /// Unit cost in local currency at the resolution-time rate.
    pub local: Decimal,
    /// Date of the purchase document the price came from.
    pub source_date: SdDate,
}

pub type CostPriceMap = HashMap<SdId, CostPrice>;

/// Fold purchase documents into a per-product cost map.
///
/// A later document replaces an earlier one only when its date is strictly
/// greater; on equal dates the first-seen price stands. Non-positive prices
/// never enter the map.
pub fn resolve_cost_prices(purchases: &[PurchaseRecord], rate: ExchangeRate) -> CostPriceMap {
    let mut map: CostPriceMap = HashMap::new();
    for record in purchases {
        for line in &record.lines {
            if !line.price.is_positive() {
                continue;
            }
            let newer = match map.get(&line.product_id) {
                Some(existing) => record.date > existing.source_date,
                None => true,
            };
            if !newer {
                continue;
            }
            let (currency, local) = classify_cost_price(line.price, rate);
            map.insert(
                line.product_id.clone(),
                CostPrice {
                    raw: line.price,
                    currency,
                    local,
                    source_date: record.date.clone(),
                },
            );
        }
    }
    map
}

/// Local-currency cost of one unit, if a cost price is known.
pub fn unit_cost_local(map: &CostPriceMap, product_id: &SdId) -> Option<Decimal> {
    map.get(product_id).map(|cp| cp.local)
}
