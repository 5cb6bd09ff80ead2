//! Canonical order type and its ingestion adapter.

use crate::domain::raw;
use crate::domain::{Decimal, PartyRef, SdDate, SdId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upstream status codes that mark an order as fully reversed.
const RETURN_STATUSES: [i64; 2] = [4, 5];

/// A sales order, normalized from the upstream shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: SdId,
    /// Document date, date-only ISO. Canonicalized from whichever of the
    /// upstream date fields is present.
    pub date: SdDate,
    /// Debt repayment due date (srok), when the order carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<SdDate>,
    pub status: i64,
    /// Order total. Currency is ambiguous upstream; see the classifier.
    pub total: Decimal,
    /// Total returned against this order.
    pub total_returns: Decimal,
    pub client: PartyRef,
    pub agent: PartyRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<SdId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_type: Option<SdId>,
    pub lines: Vec<LineItem>,
}

/// One sold line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: SdId,
    pub product_name: String,
    pub quantity: Decimal,
    /// Line amount. USD when ≤ 100, local otherwise (unit-level amounts are
    /// smaller than order totals, hence the separate threshold).
    pub amount: Decimal,
}

impl Order {
    /// Full-return check: reversed status, or the returned amount equals a
    /// positive total. Such orders contribute to no aggregate.
    pub fn is_full_return(&self) -> bool {
        if RETURN_STATUSES.contains(&self.status) {
            return true;
        }
        self.total.is_positive() && self.total_returns == self.total
    }

    /// Normalize one raw upstream order. Returns None only when the record
    /// carries no usable id; every other defect degrades field-by-field.
    pub fn from_raw(v: &Value) -> Option<Order> {
        let id = raw::id_field(v, &["id", "orderId", "_id"])?;

        let date = raw::str_field(v, &["dateCreate", "dateDocument", "orderCreated", "date"])
            .map(|s| SdDate::from_raw(&s))
            .unwrap_or_else(|| SdDate::new(""));

        let due_date = raw::str_field(v, &["srok", "srokDate", "dueDate"])
            .map(|s| SdDate::from_raw(&s))
            .filter(|d| !d.as_str().is_empty());

        let lines = raw::array_field(v, &["lineItems", "products", "items", "lines"])
            .iter()
            .filter_map(LineItem::from_raw)
            .collect();

        Some(Order {
            id,
            date,
            due_date,
            status: raw::int_field(v, &["status"]),
            total: raw::num_field(v, &["totalSumma", "total", "summa"]),
            total_returns: raw::num_field(v, &["totalReturnsSumma", "returnsSumma", "totalReturns"]),
            client: raw::party_field(v, "client", &["clientId"], &["clientName"]),
            agent: raw::party_field(v, "agent", &["agentId"], &["agentName"]),
            payment_type: raw::type_ref_field(v, "paymentType", "paymentTypeId"),
            price_type: raw::type_ref_field(v, "priceType", "priceTypeId"),
            lines,
        })
    }
}

impl LineItem {
    pub fn from_raw(v: &Value) -> Option<LineItem> {
        let product = raw::party_field(v, "product", &["productId"], &["productName", "name"]);
        if product.id.is_empty() {
            return None;
        }
        Some(LineItem {
            product_id: product.id,
            product_name: product.name,
            quantity: raw::num_field(v, &["quantity", "qty", "count"]),
            amount: raw::num_field(v, &["summa", "amount", "sum"]),
        })
    }
}
