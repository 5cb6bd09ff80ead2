//! Incoming payment records.

use crate::domain::raw;
use crate::domain::{Decimal, PartyRef, SdDate, SdId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One received payment, optionally matched to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: SdId,
    pub date: SdDate,
    pub client: PartyRef,
    /// Order this payment settles, when upstream recorded the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<SdId>,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<SdId>,
}

impl PaymentRecord {
    pub fn from_raw(v: &Value) -> Option<PaymentRecord> {
        let id = raw::id_field(v, &["id", "paymentId", "_id"])?;
        let payment_type = raw::type_ref_field(v, "paymentType", "paymentTypeId");
        let order_id = raw::type_ref_field(v, "order", "orderId");
        Some(PaymentRecord {
            id,
            date: raw::str_field(v, &["date", "dateCreate", "datePayment"])
                .map(|s| SdDate::from_raw(&s))
                .unwrap_or_else(|| SdDate::new("")),
            client: raw::party_field(v, "client", &["clientId"], &["clientName"]),
            order_id,
            amount: raw::num_field(v, &["amount", "summa", "sum"]),
            payment_type,
        })
    }
}
