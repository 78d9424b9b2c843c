//! Ledger entries pulled from the aggregator or entered manually.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::balance::RecordSource;

/// Direction of a ledger entry, derived from the sign of its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    /// Inflow: zero or positive amount.
    Credit,
    /// Outflow: negative amount.
    Debit,
}

impl EntryDirection {
    /// Classify a signed amount.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::EntryDirection;
    ///
    /// assert_eq!(EntryDirection::from_amount(12.50), EntryDirection::Credit);
    /// assert_eq!(EntryDirection::from_amount(-3.99), EntryDirection::Debit);
    /// assert_eq!(EntryDirection::from_amount(0.0), EntryDirection::Credit);
    /// ```
    #[must_use]
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 { Self::Debit } else { Self::Credit }
    }
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for EntryDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(format!("unknown entry direction: {other}")),
        }
    }
}

/// One financial transaction on one account.
///
/// `external_id` is the aggregator's transaction identifier and the
/// natural dedup key: persistence upserts by it, so replaying the same
/// sync window is idempotent. Manual entries have no external id and are
/// plain inserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub account_id: Uuid,
    pub external_id: Option<String>,
    /// Signed amount; positive means credit/inflow.
    pub amount: f64,
    pub currency: String,
    pub booked_on: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub direction: EntryDirection,
    pub reference: Option<String>,
    pub source: RecordSource,
}
