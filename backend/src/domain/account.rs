//! Bank account aggregate and the aggregator-to-internal type mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal classification of a bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
    Investment,
    Loan,
    Other,
}

impl AccountType {
    /// Map an ISO 20022 cash-account-type code reported by the aggregator.
    ///
    /// Unknown codes fall back to [`AccountType::Other`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::AccountType;
    ///
    /// assert_eq!(AccountType::from_cash_account_type("CACC"), AccountType::Checking);
    /// assert_eq!(AccountType::from_cash_account_type("XXXX"), AccountType::Other);
    /// ```
    #[must_use]
    pub fn from_cash_account_type(code: &str) -> Self {
        match code {
            "CACC" => Self::Checking,
            "SVGS" => Self::Savings,
            "CARD" => Self::Credit,
            "LOAN" => Self::Loan,
            "MGLD" => Self::Investment,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Investment => "investment",
            Self::Loan => "loan",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit" => Ok(Self::Credit),
            "investment" => Ok(Self::Investment),
            "loan" => Ok(Self::Loan),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// How an account entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Entered by hand; balance maintained manually.
    Manual,
    /// Materialized from an aggregator requisition.
    Aggregator,
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Manual => "manual",
            Self::Aggregator => "aggregator",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "aggregator" => Ok(Self::Aggregator),
            other => Err(format!("unknown connection kind: {other}")),
        }
    }
}

/// Internal record for one bank account.
///
/// Aggregator-linked accounts carry the external account identifier and a
/// foreign key to the connection that produced them; manual accounts carry
/// neither and use `manual_balance` as their authoritative balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub connection_id: Option<Uuid>,
    pub display_name: String,
    pub bank_name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub last_four: Option<String>,
    pub connection_kind: ConnectionKind,
    /// Aggregator-assigned account identifier; present only for
    /// aggregator-linked accounts.
    pub external_id: Option<String>,
    pub is_active: bool,
    pub manual_balance: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to persist a new bank account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBankAccount {
    pub user_id: Uuid,
    pub connection_id: Option<Uuid>,
    pub display_name: String,
    pub bank_name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub last_four: Option<String>,
    pub connection_kind: ConnectionKind,
    pub external_id: Option<String>,
    pub manual_balance: Option<f64>,
}

/// Derive a display name for a freshly linked account.
///
/// Preference order: aggregator-provided name, then product label, then a
/// masked IBAN suffix, then the last four characters of the external id.
#[must_use]
pub fn derive_display_name(
    name: Option<&str>,
    product: Option<&str>,
    iban: Option<&str>,
    external_id: &str,
) -> String {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_owned();
    }
    if let Some(product) = product.map(str::trim).filter(|p| !p.is_empty()) {
        return product.to_owned();
    }
    if let Some(iban) = iban.map(str::trim).filter(|i| i.len() >= 4) {
        return format!("Account …{}", tail(iban, 4));
    }
    format!("Account …{}", tail(external_id, 4))
}

/// Last four characters of an account number, for masked display.
#[must_use]
pub fn last_four(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (trimmed.len() >= 4).then(|| tail(trimmed, 4))
}

fn tail(value: &str, n: usize) -> String {
    value
        .chars()
        .rev()
        .take(n)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}
