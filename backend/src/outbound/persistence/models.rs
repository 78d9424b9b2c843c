//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{AccountType, BankAccount, Connection, ConnectionKind, ConnectionStatus};

use super::schema::{account_balances, account_transactions, bank_accounts, connections};

/// Parse a stored enum string, falling back when the value is unrecognised.
///
/// The stored form is authoritative only as long as the application wrote
/// it; a manual edit or a dropped variant should degrade to the fallback
/// rather than poison every read of the row.
fn parse_stored<T: std::str::FromStr>(value: &str, column: &str, id: Uuid, fallback: T) -> T {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(value, column, %id, "unrecognised stored value, using fallback");
        fallback
    })
}

// ---------------------------------------------------------------------------
// Connection models
// ---------------------------------------------------------------------------

/// Row struct for reading from the connections table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConnectionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institution_id: String,
    pub institution_name: String,
    pub country_code: String,
    pub requisition_id: String,
    pub status: String,
    pub agreement_accepted_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRow {
    pub(crate) fn into_domain(self) -> Connection {
        let status = parse_stored(&self.status, "status", self.id, ConnectionStatus::Error);
        Connection {
            id: self.id,
            user_id: self.user_id,
            institution_id: self.institution_id,
            institution_name: self.institution_name,
            country_code: self.country_code,
            requisition_id: self.requisition_id,
            status,
            agreement_accepted_at: self.agreement_accepted_at,
            last_sync_at: self.last_sync_at,
            last_sync_error: self.last_sync_error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insertable struct for creating new connection records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = connections)]
pub(crate) struct NewConnectionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institution_id: &'a str,
    pub institution_name: &'a str,
    pub country_code: &'a str,
    pub requisition_id: &'a str,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Bank account models
// ---------------------------------------------------------------------------

/// Row struct for reading from the bank_accounts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bank_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BankAccountRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub connection_id: Option<Uuid>,
    pub display_name: String,
    pub bank_name: String,
    pub account_type: String,
    pub currency: String,
    pub last_four: Option<String>,
    pub connection_kind: String,
    pub external_id: Option<String>,
    pub is_active: bool,
    pub manual_balance: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BankAccountRow {
    pub(crate) fn into_domain(self) -> BankAccount {
        let account_type = parse_stored(
            &self.account_type,
            "account_type",
            self.id,
            AccountType::Other,
        );
        let connection_kind = parse_stored(
            &self.connection_kind,
            "connection_kind",
            self.id,
            ConnectionKind::Manual,
        );
        BankAccount {
            id: self.id,
            user_id: self.user_id,
            connection_id: self.connection_id,
            display_name: self.display_name,
            bank_name: self.bank_name,
            account_type,
            currency: self.currency,
            last_four: self.last_four,
            connection_kind,
            external_id: self.external_id,
            is_active: self.is_active,
            manual_balance: self.manual_balance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insertable struct for creating new bank account records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bank_accounts)]
pub(crate) struct NewBankAccountRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub connection_id: Option<Uuid>,
    pub display_name: &'a str,
    pub bank_name: &'a str,
    pub account_type: String,
    pub currency: &'a str,
    pub last_four: Option<&'a str>,
    pub connection_kind: String,
    pub external_id: Option<&'a str>,
    pub is_active: bool,
    pub manual_balance: Option<f64>,
}

// ---------------------------------------------------------------------------
// Ledger models
// ---------------------------------------------------------------------------

/// Insertable struct for balance snapshot upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_balances)]
pub(crate) struct NewBalanceRow<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: f64,
    pub available_amount: Option<f64>,
    pub currency: &'a str,
    pub balance_date: NaiveDate,
    pub source: String,
}

/// Insertable struct for ledger entry upserts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_transactions)]
pub(crate) struct NewTransactionRow<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub external_id: Option<&'a str>,
    pub amount: f64,
    pub currency: &'a str,
    pub booked_on: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub description: Option<&'a str>,
    pub counterparty: Option<&'a str>,
    pub direction: String,
    pub reference: Option<&'a str>,
    pub source: String,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;

    #[test]
    fn unknown_stored_status_degrades_to_error() {
        let row = ConnectionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            institution_id: "SANDBOX_BANK".to_owned(),
            institution_name: "Sandbox Bank".to_owned(),
            country_code: "GB".to_owned(),
            requisition_id: "req-1".to_owned(),
            status: "mystery".to_owned(),
            agreement_accepted_at: None,
            last_sync_at: None,
            last_sync_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(row.into_domain().status, ConnectionStatus::Error);
    }

    #[test]
    fn stored_account_strings_round_trip() {
        let row = BankAccountRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            connection_id: None,
            display_name: "Main".to_owned(),
            bank_name: "Sandbox Bank".to_owned(),
            account_type: AccountType::Savings.to_string(),
            currency: "GBP".to_owned(),
            last_four: None,
            connection_kind: ConnectionKind::Aggregator.to_string(),
            external_id: Some("ext-1".to_owned()),
            is_active: true,
            manual_balance: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let account = row.into_domain();
        assert_eq!(account.account_type, AccountType::Savings);
        assert_eq!(account.connection_kind, ConnectionKind::Aggregator);
    }
}
