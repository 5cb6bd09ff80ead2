//! Warehouse purchase records, the source of cost prices.

use crate::domain::raw;
use crate::domain::{Decimal, SdDate, SdId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One incoming warehouse document with its priced detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: SdId,
    pub date: SdDate,
    pub lines: Vec<PurchaseLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: SdId,
    /// Unit cost as entered upstream; currency inferred by magnitude.
    pub price: Decimal,
}

impl PurchaseRecord {
    pub fn from_raw(v: &Value) -> Option<PurchaseRecord> {
        let id = raw::id_field(v, &["id", "warehouseId", "_id"])?;
        let date = raw::str_field(v, &["date", "dateCreate", "dateDocument"])
            .map(|s| SdDate::from_raw(&s))
            .unwrap_or_else(|| SdDate::new(""));
        let lines = raw::array_field(v, &["details", "items", "products", "lines"])
            .iter()
            .filter_map(PurchaseLine::from_raw)
            .collect();
        Some(PurchaseRecord { id, date, lines })
    }
}

impl PurchaseLine {
    pub fn from_raw(v: &Value) -> Option<PurchaseLine> {
        let product = raw::party_field(v, "product", &["productId"], &["productName", "name"]);
        if product.id.is_empty() {
            return None;
        }
        Some(PurchaseLine {
            product_id: product.id,
            price: raw::num_field(v, &["price", "costPrice", "summa"]),
        })
    }
}
