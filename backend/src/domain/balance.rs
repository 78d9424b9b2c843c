//! Point-in-time balance snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provenance of a ledger or balance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Aggregator,
    Manual,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Aggregator => "aggregator",
            Self::Manual => "manual",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for RecordSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggregator" => Ok(Self::Aggregator),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown record source: {other}")),
        }
    }
}

/// One balance snapshot for one account on one calendar day.
///
/// Persistence upserts by `(account_id, balance_date)`, so re-syncing the
/// same day overwrites rather than appends — balance history is one row
/// per day, not a true append log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub account_id: Uuid,
    pub amount: f64,
    pub available_amount: Option<f64>,
    pub currency: String,
    pub balance_date: NaiveDate,
    pub source: RecordSource,
}
