//! PostgreSQL-backed `BankAccountRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{BankAccountRepository, BankAccountRepositoryError};
use crate::domain::{BankAccount, ConnectionKind, NewBankAccount};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BankAccountRow, NewBankAccountRow};
use super::pool::DbPool;
use super::schema::bank_accounts;

/// Diesel-backed implementation of the `BankAccountRepository` port.
#[derive(Clone)]
pub struct DieselBankAccountRepository {
    pool: DbPool,
}

impl DieselBankAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: super::pool::PoolError) -> BankAccountRepositoryError {
    map_pool_error(error, BankAccountRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> BankAccountRepositoryError {
    map_diesel_error(
        error,
        BankAccountRepositoryError::query,
        BankAccountRepositoryError::connection,
    )
}

#[async_trait]
impl BankAccountRepository for DieselBankAccountRepository {
    async fn insert(
        &self,
        new: &NewBankAccount,
    ) -> Result<BankAccount, BankAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = NewBankAccountRow {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            connection_id: new.connection_id,
            display_name: &new.display_name,
            bank_name: &new.bank_name,
            account_type: new.account_type.to_string(),
            currency: &new.currency,
            last_four: new.last_four.as_deref(),
            connection_kind: new.connection_kind.to_string(),
            external_id: new.external_id.as_deref(),
            is_active: true,
            manual_balance: new.manual_balance,
        };

        let created: BankAccountRow = diesel::insert_into(bank_accounts::table)
            .values(&row)
            .returning(BankAccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(created.into_domain())
    }

    async fn list_active_aggregator(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<Vec<BankAccount>, BankAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = bank_accounts::table
            .filter(bank_accounts::user_id.eq(user_id))
            .filter(bank_accounts::is_active.eq(true))
            .filter(bank_accounts::connection_kind.eq(ConnectionKind::Aggregator.to_string()))
            .select(BankAccountRow::as_select())
            .into_boxed();
        if let Some(account_id) = account_id {
            query = query.filter(bank_accounts::id.eq(account_id));
        }

        let rows: Vec<BankAccountRow> = query
            .order(bank_accounts::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(rows.into_iter().map(BankAccountRow::into_domain).collect())
    }

    async fn deactivate_for_connection(
        &self,
        connection_id: Uuid,
    ) -> Result<u64, BankAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let updated = diesel::update(bank_accounts::table)
            .filter(bank_accounts::connection_id.eq(connection_id))
            .filter(bank_accounts::is_active.eq(true))
            .set((
                bank_accounts::is_active.eq(false),
                bank_accounts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(updated as u64)
    }
}
