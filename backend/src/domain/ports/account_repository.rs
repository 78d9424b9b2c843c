//! Port for bank account persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{BankAccount, NewBankAccount};

use super::define_port_error;

define_port_error! {
    /// Errors raised by bank account repository adapters.
    pub enum BankAccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "bank account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "bank account repository query failed: {message}",
    }
}

/// Port for writing bank accounts and selecting sync candidates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BankAccountRepository: Send + Sync {
    /// Persist a new bank account.
    async fn insert(&self, new: &NewBankAccount)
    -> Result<BankAccount, BankAccountRepositoryError>;

    /// Active aggregator-linked accounts for a user, optionally narrowed
    /// to a single account id. Returned in stable store order.
    async fn list_active_aggregator(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<BankAccount>, BankAccountRepositoryError>;

    /// Deactivate every account materialized by one connection.
    ///
    /// Accounts are never hard-deleted; disconnect flips the active flag.
    async fn deactivate_for_connection(
        &self,
        connection_id: Uuid,
    ) -> Result<u64, BankAccountRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBankAccountRepository;

#[async_trait]
impl BankAccountRepository for FixtureBankAccountRepository {
    async fn insert(
        &self,
        new: &NewBankAccount,
    ) -> Result<BankAccount, BankAccountRepositoryError> {
        let now = chrono::Utc::now();
        Ok(BankAccount {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            connection_id: new.connection_id,
            display_name: new.display_name.clone(),
            bank_name: new.bank_name.clone(),
            account_type: new.account_type,
            currency: new.currency.clone(),
            last_four: new.last_four.clone(),
            connection_kind: new.connection_kind,
            external_id: new.external_id.clone(),
            is_active: true,
            manual_balance: new.manual_balance,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_active_aggregator(
        &self,
        _user_id: Uuid,
        _account_id: Option<Uuid>,
    ) -> Result<Vec<BankAccount>, BankAccountRepositoryError> {
        Ok(Vec::new())
    }

    async fn deactivate_for_connection(
        &self,
        _connection_id: Uuid,
    ) -> Result<u64, BankAccountRepositoryError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use crate::domain::{AccountType, ConnectionKind};

    #[tokio::test]
    async fn fixture_insert_marks_account_active() {
        let repo = FixtureBankAccountRepository;
        let new = NewBankAccount {
            user_id: Uuid::new_v4(),
            connection_id: Some(Uuid::new_v4()),
            display_name: "Main".to_owned(),
            bank_name: "Sandbox Bank".to_owned(),
            account_type: AccountType::Checking,
            currency: "GBP".to_owned(),
            last_four: Some("6819".to_owned()),
            connection_kind: ConnectionKind::Aggregator,
            external_id: Some("ext-1".to_owned()),
            manual_balance: None,
        };
        let account = repo.insert(&new).await.expect("fixture insert succeeds");
        assert!(account.is_active);
        assert_eq!(account.external_id.as_deref(), Some("ext-1"));
    }

    #[tokio::test]
    async fn fixture_list_returns_empty() {
        let repo = FixtureBankAccountRepository;
        let listed = repo
            .list_active_aggregator(Uuid::new_v4(), None)
            .await
            .expect("fixture list succeeds");
        assert!(listed.is_empty());
    }
}
