//! Domain primitives: SdId, SdDate, PartyRef.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Opaque Sales Doctor entity identifier (agent, client, product, ...).
///
/// Upstream serves these as strings or numbers depending on the endpoint;
/// they are normalized to strings at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SdId(pub String);

impl SdId {
    pub fn new(id: impl Into<String>) -> Self {
        SdId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Date-only value in zero-padded ISO form (`YYYY-MM-DD`).
///
/// Ordering is lexicographic string comparison, which is correct exactly
/// because every date passing the ingestion boundary is zero-padded ISO.
/// Period filtering and due-date anchoring rely on this.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SdDate(pub String);

/// Due dates earlier than this are upstream placeholders, not real dates.
const SENTINEL_FLOOR: &str = "2000-01-01";

impl SdDate {
    pub fn new(date: impl Into<String>) -> Self {
        SdDate(date.into())
    }

    /// Normalize a raw upstream timestamp to its date part.
    ///
    /// Upstream mixes `2024-05-01`, `2024-05-01 12:33:10` and
    /// `2024-05-01T12:33:10`; everything past the date is dropped.
    pub fn from_raw(raw: &str) -> Self {
        let date = raw
            .split(|c| c == ' ' || c == 'T')
            .next()
            .unwrap_or("")
            .to_string();
        SdDate(date)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Current business date (server-local; the dashboard reports in the
    /// deployment's timezone).
    pub fn today() -> Self {
        SdDate(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string())
    }

    pub fn as_naive(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }

    /// Epoch-era placeholder or unparseable value. Such due dates carry no
    /// information and are discarded by the overdue computation.
    pub fn is_sentinel(&self) -> bool {
        if self.0.is_empty() || self.0.as_str() < SENTINEL_FLOOR {
            return true;
        }
        self.as_naive().is_none()
    }

    /// Whole days from `self` to `later`; negative when `later` precedes
    /// `self`. None if either side fails to parse.
    pub fn days_until(&self, later: &SdDate) -> Option<i64> {
        Some((later.as_naive()? - self.as_naive()?).num_days())
    }

    /// First day of this date's calendar month.
    pub fn month_start(&self) -> Option<SdDate> {
        let d = self.as_naive()?.with_day(1)?;
        Some(SdDate(d.format("%Y-%m-%d").to_string()))
    }

    /// Monday of this date's ISO week.
    pub fn week_start(&self) -> Option<SdDate> {
        let d = self.as_naive()?;
        let monday = d - chrono::Duration::days(d.weekday().num_days_from_monday() as i64);
        Some(SdDate(monday.format("%Y-%m-%d").to_string()))
    }

    pub fn pred(&self) -> Option<SdDate> {
        let d = self.as_naive()?.pred_opt()?;
        Some(SdDate(d.format("%Y-%m-%d").to_string()))
    }
}

impl std::fmt::Display for SdDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an upstream party (client or agent) as carried on orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRef {
    pub id: SdId,
    pub name: String,
}

impl PartyRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        PartyRef {
            id: SdId::new(id),
            name: name.into(),
        }
    }

    /// Placeholder for records where the party field is absent or malformed.
    pub fn unknown() -> Self {
        PartyRef {
            id: SdId::new(""),
            name: String::new(),
        }
    }
}
