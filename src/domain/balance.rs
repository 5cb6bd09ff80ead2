//! Client balance records from the upstream balance listing.

use crate::domain::raw;
use crate::domain::{Decimal, PartyRef, SdId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One client's balance snapshot. Negative balance means the client owes
/// (is a debtor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    pub client: PartyRef,
    pub balance: Decimal,
    pub by_currency: Vec<CurrencyAmount>,
}

/// One currency slice of a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
    pub currency_id: SdId,
    pub amount: Decimal,
}

impl BalanceRecord {
    pub fn from_raw(v: &Value) -> Option<BalanceRecord> {
        let client = raw::party_field(v, "client", &["clientId", "id"], &["clientName", "name"]);
        if client.id.is_empty() {
            return None;
        }
        let by_currency = raw::array_field(v, &["byCurrency", "currencies", "balances"])
            .iter()
            .filter_map(CurrencyAmount::from_raw)
            .collect();
        Some(BalanceRecord {
            client,
            balance: raw::num_field(v, &["balance", "balanceTotal", "total"]),
            by_currency,
        })
    }

    pub fn is_debtor(&self) -> bool {
        self.balance.is_negative()
    }
}

impl CurrencyAmount {
    pub fn from_raw(v: &Value) -> Option<CurrencyAmount> {
        let currency_id = raw::id_field(v, &["currencyId", "currency", "id"])?;
        Some(CurrencyAmount {
            currency_id,
            amount: raw::num_field(v, &["amount", "summa", "balance"]),
        })
    }
}
