//! DTOs for decoding GoCardless Bank Account Data responses.
//!
//! The adapter decodes into these transport DTOs first, then maps into the
//! domain gateway types in one pass. Requisition and token payloads use
//! snake_case; the Berlin-Group account endpoints use camelCase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    BalanceReading, BookedTransaction, ExternalAccountDetails, Institution, Requisition,
    RequisitionSession,
};

#[derive(Debug, Serialize)]
pub(super) struct TokenRequestDto<'a> {
    pub(super) secret_id: &'a str,
    pub(super) secret_key: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenPairDto {
    pub(super) access: String,
    /// Lifetime of the access token in seconds.
    pub(super) access_expires: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct InstitutionDto {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) bic: Option<String>,
    pub(super) logo: Option<String>,
    /// Reported as a decimal string, e.g. `"730"`.
    pub(super) transaction_total_days: Option<String>,
}

impl InstitutionDto {
    pub(super) fn into_domain(self) -> Institution {
        let transaction_total_days = self
            .transaction_total_days
            .and_then(|days| days.parse().ok());
        Institution {
            id: self.id,
            name: self.name,
            bic: self.bic,
            logo: self.logo,
            transaction_total_days,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RequisitionRequestDto<'a> {
    pub(super) institution_id: &'a str,
    pub(super) redirect: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) reference: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) user_language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) agreement: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RequisitionDto {
    pub(super) id: String,
    pub(super) status: String,
    pub(super) link: Option<String>,
    #[serde(default)]
    pub(super) accounts: Vec<String>,
}

impl RequisitionDto {
    pub(super) fn into_session(self) -> Result<RequisitionSession, String> {
        let link = self
            .link
            .ok_or_else(|| format!("requisition {} missing authorization link", self.id))?;
        Ok(RequisitionSession { id: self.id, link })
    }

    pub(super) fn into_domain(self) -> Requisition {
        Requisition {
            id: self.id,
            status: self.status,
            accounts: self.accounts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AccountDetailsEnvelopeDto {
    pub(super) account: AccountDetailsDto,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountDetailsDto {
    pub(super) name: Option<String>,
    pub(super) product: Option<String>,
    pub(super) iban: Option<String>,
    pub(super) currency: Option<String>,
    pub(super) cash_account_type: Option<String>,
    pub(super) owner_name: Option<String>,
}

impl AccountDetailsDto {
    pub(super) fn into_domain(self) -> ExternalAccountDetails {
        ExternalAccountDetails {
            name: self.name,
            product: self.product,
            iban: self.iban,
            currency: self.currency,
            cash_account_type: self.cash_account_type,
            owner_name: self.owner_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct BalancesEnvelopeDto {
    #[serde(default)]
    pub(super) balances: Vec<BalanceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BalanceDto {
    pub(super) balance_amount: AmountDto,
    pub(super) balance_type: Option<String>,
    pub(super) reference_date: Option<NaiveDate>,
}

impl BalanceDto {
    pub(super) fn into_domain(self) -> Result<BalanceReading, String> {
        Ok(BalanceReading {
            amount: self.balance_amount.parsed()?,
            currency: self.balance_amount.currency,
            balance_type: self.balance_type,
            reference_date: self.reference_date,
        })
    }
}

/// Monetary amounts arrive as decimal strings, e.g. `"-12.34"`.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct AmountDto {
    pub(super) amount: String,
    pub(super) currency: String,
}

impl AmountDto {
    pub(super) fn parsed(&self) -> Result<f64, String> {
        self.amount
            .parse()
            .map_err(|_| format!("unparsable amount {:?}", self.amount))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionsEnvelopeDto {
    pub(super) transactions: TransactionBucketsDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionBucketsDto {
    #[serde(default)]
    pub(super) booked: Vec<TransactionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransactionDto {
    pub(super) transaction_id: Option<String>,
    pub(super) internal_transaction_id: Option<String>,
    pub(super) end_to_end_id: Option<String>,
    pub(super) transaction_amount: AmountDto,
    pub(super) booking_date: Option<NaiveDate>,
    pub(super) value_date: Option<NaiveDate>,
    pub(super) remittance_information_unstructured: Option<String>,
    #[serde(default)]
    pub(super) remittance_information_unstructured_array: Vec<String>,
    pub(super) creditor_name: Option<String>,
    pub(super) debtor_name: Option<String>,
}

impl TransactionDto {
    /// Map into a domain transaction.
    ///
    /// Returns `Ok(None)` for entries without any stable identifier; those
    /// cannot be keyed for idempotent upsert and are dropped.
    pub(super) fn into_domain(self) -> Result<Option<BookedTransaction>, String> {
        let Some(external_id) = self.transaction_id.or(self.internal_transaction_id) else {
            return Ok(None);
        };
        let amount = self.transaction_amount.parsed()?;
        let booked_on = self
            .booking_date
            .or(self.value_date)
            .ok_or_else(|| format!("transaction {external_id} missing booking date"))?;

        let description = self.remittance_information_unstructured.or_else(|| {
            if self.remittance_information_unstructured_array.is_empty() {
                None
            } else {
                Some(self.remittance_information_unstructured_array.join(" "))
            }
        });
        // Money out names the creditor; money in names the debtor.
        let counterparty = if amount < 0.0 {
            self.creditor_name
        } else {
            self.debtor_name
        };

        Ok(Some(BookedTransaction {
            external_id,
            amount,
            currency: self.transaction_amount.currency,
            booked_on,
            value_date: self.value_date,
            description,
            counterparty,
            reference: self.end_to_end_id,
        }))
    }
}
