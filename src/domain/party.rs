//! Catalog listings: clients, agents, products, price types.

use crate::domain::raw;
use crate::domain::SdId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registered client (the full listing backs the OKB count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: SdId,
    pub name: String,
}

/// Sales agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: SdId,
    pub name: String,
}

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: SdId,
    pub name: String,
}

/// Price type from the upstream catalog; display names feed the USD
/// price-type classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceType {
    pub id: SdId,
    pub name: String,
}

fn named_from_raw(v: &Value) -> Option<(SdId, String)> {
    let id = raw::id_field(v, &["id", "_id"])?;
    let name = raw::str_field(v, &["name", "fullName", "title"]).unwrap_or_default();
    Some((id, name))
}

impl Client {
    pub fn from_raw(v: &Value) -> Option<Client> {
        named_from_raw(v).map(|(id, name)| Client { id, name })
    }
}

impl Agent {
    pub fn from_raw(v: &Value) -> Option<Agent> {
        named_from_raw(v).map(|(id, name)| Agent { id, name })
    }
}

impl Product {
    pub fn from_raw(v: &Value) -> Option<Product> {
        named_from_raw(v).map(|(id, name)| Product { id, name })
    }
}

impl PriceType {
    pub fn from_raw(v: &Value) -> Option<PriceType> {
        named_from_raw(v).map(|(id, name)| PriceType { id, name })
    }
}
