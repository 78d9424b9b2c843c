//! Port for the external open-banking aggregator.
//!
//! All network communication with the aggregator goes through this trait:
//! institution discovery, the requisition (authorization session)
//! lifecycle, and per-account reads. Token acquisition and caching are an
//! adapter concern and never surface here.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::define_port_error;

/// Requisition status value the aggregator reports once the end user has
/// authorized the session.
pub const REQUISITION_LINKED: &str = "LN";

define_port_error! {
    /// Errors raised by aggregator gateway adapters.
    pub enum BankGatewayError {
        /// Credential exchange was rejected by the aggregator.
        AuthenticationFailed { detail: String } =>
            "aggregator authentication failed: {detail}",
        /// The aggregator returned a non-2xx response.
        Api { status: u16, detail: String } =>
            "aggregator error {status}: {detail}",
        /// The request never completed (connect, timeout, TLS).
        Transport { message: String } =>
            "aggregator transport failure: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "aggregator response decode failure: {message}",
    }
}

/// A banking institution available for linking in one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub bic: Option<String>,
    pub logo: Option<String>,
    /// How many days of transaction history the institution exposes.
    pub transaction_total_days: Option<u32>,
}

/// Parameters for creating an authorization session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequisitionRequest {
    pub institution_id: String,
    pub redirect_url: String,
    pub user_language: Option<String>,
    /// Caller-minted opaque reference the aggregator echoes back in its
    /// redirect; may replace the requisition id in the callback.
    pub reference: Option<String>,
    pub agreement_id: Option<String>,
}

/// Freshly created authorization session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequisitionSession {
    pub id: String,
    /// End-user authorization URL to open out-of-band.
    pub link: String,
}

/// Current state of an authorization session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requisition {
    pub id: String,
    /// Aggregator status code; [`REQUISITION_LINKED`] once authorized.
    pub status: String,
    /// External account ids surfaced after authorization.
    pub accounts: Vec<String>,
}

/// Descriptive metadata for one external account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalAccountDetails {
    pub name: Option<String>,
    pub product: Option<String>,
    pub iban: Option<String>,
    pub currency: Option<String>,
    pub cash_account_type: Option<String>,
    pub owner_name: Option<String>,
}

/// One balance entry reported for an external account.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReading {
    pub amount: f64,
    pub currency: String,
    /// Aggregator balance type, e.g. `interimAvailable` or `closingBooked`.
    pub balance_type: Option<String>,
    pub reference_date: Option<NaiveDate>,
}

impl BalanceReading {
    /// Choose the reading to persist: `interimAvailable` when present,
    /// otherwise the first entry.
    #[must_use]
    pub fn preferred(readings: &[BalanceReading]) -> Option<&BalanceReading> {
        readings
            .iter()
            .find(|reading| reading.balance_type.as_deref() == Some("interimAvailable"))
            .or_else(|| readings.first())
    }

    /// Amount of the `interimAvailable` entry, when reported.
    #[must_use]
    pub fn available_amount(readings: &[BalanceReading]) -> Option<f64> {
        readings
            .iter()
            .find(|reading| reading.balance_type.as_deref() == Some("interimAvailable"))
            .map(|reading| reading.amount)
    }
}

/// One booked (settled) transaction reported for an external account.
#[derive(Debug, Clone, PartialEq)]
pub struct BookedTransaction {
    pub external_id: String,
    pub amount: f64,
    pub currency: String,
    pub booked_on: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub reference: Option<String>,
}

/// Port for typed access to the aggregator's REST API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BankDataGateway: Send + Sync {
    /// List institutions available for the given ISO country code.
    async fn list_institutions(&self, country: &str)
    -> Result<Vec<Institution>, BankGatewayError>;

    /// Create an authorization session and return its end-user link.
    async fn create_requisition(
        &self,
        request: &RequisitionRequest,
    ) -> Result<RequisitionSession, BankGatewayError>;

    /// Fetch the current state of an authorization session.
    async fn fetch_requisition(&self, requisition_id: &str)
    -> Result<Requisition, BankGatewayError>;

    /// Revoke an authorization session.
    async fn delete_requisition(&self, requisition_id: &str) -> Result<(), BankGatewayError>;

    /// Fetch descriptive metadata for an external account.
    async fn account_details(
        &self,
        external_id: &str,
    ) -> Result<ExternalAccountDetails, BankGatewayError>;

    /// Fetch current balances for an external account.
    async fn account_balances(
        &self,
        external_id: &str,
    ) -> Result<Vec<BalanceReading>, BankGatewayError>;

    /// Fetch booked transactions for an external account within a window.
    async fn account_transactions(
        &self,
        external_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<BookedTransaction>, BankGatewayError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;

    #[test]
    fn api_error_formats_status_and_detail() {
        let err = BankGatewayError::api(429_u16, "rate limit exceeded");
        assert_eq!(err.to_string(), "aggregator error 429: rate limit exceeded");
    }

    #[test]
    fn authentication_error_carries_detail() {
        let err = BankGatewayError::authentication_failed("bad secret");
        assert!(err.to_string().contains("bad secret"));
    }

    fn reading(balance_type: Option<&str>, amount: f64) -> BalanceReading {
        BalanceReading {
            amount,
            currency: "EUR".to_owned(),
            balance_type: balance_type.map(str::to_owned),
            reference_date: None,
        }
    }

    #[test]
    fn preferred_reading_prefers_interim_available() {
        let readings = vec![
            reading(Some("closingBooked"), 90.0),
            reading(Some("interimAvailable"), 100.0),
        ];
        let chosen = BalanceReading::preferred(&readings).expect("reading chosen");
        assert_eq!(chosen.amount, 100.0);
        assert_eq!(BalanceReading::available_amount(&readings), Some(100.0));
    }

    #[test]
    fn preferred_reading_falls_back_to_first_entry() {
        let readings = vec![reading(Some("closingBooked"), 90.0), reading(None, 80.0)];
        let chosen = BalanceReading::preferred(&readings).expect("reading chosen");
        assert_eq!(chosen.amount, 90.0);
        assert_eq!(BalanceReading::available_amount(&readings), None);
        assert!(BalanceReading::preferred(&[]).is_none());
    }
}
