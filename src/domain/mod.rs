//! Canonical domain types for the Sales Doctor analytics engine.
//!
//! This module provides:
//! - Lossless amount handling via the Decimal wrapper
//! - Domain primitives: SdId, SdDate, PartyRef
//! - The closed Currency set and its classification policy
//! - Canonical entity types with lenient raw-JSON adapters; everything past
//!   this boundary operates on canonical types only

pub mod balance;
pub mod currency;
pub mod money;
pub mod order;
pub mod party;
pub mod payment;
pub mod primitives;
pub mod purchase;
pub mod raw;

pub use balance::{BalanceRecord, CurrencyAmount};
pub use currency::{Currency, CurrencyBuckets, CurrencyParseError, CurrencyPolicy};
pub use money::Decimal;
pub use order::{LineItem, Order};
pub use party::{Agent, Client, PriceType, Product};
pub use payment::PaymentRecord;
pub use primitives::{PartyRef, SdDate, SdId};
pub use purchase::{PurchaseLine, PurchaseRecord};
