//! PostgreSQL-backed `LedgerRepository` implementation using Diesel ORM.
//!
//! Both writes are upserts on natural keys, so overlapping sync passes
//! converge on one row instead of duplicating: balance snapshots conflict
//! on `(account_id, balance_date)`, ledger entries on `external_id`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{LedgerRepository, LedgerRepositoryError};
use crate::domain::{BalanceSnapshot, LedgerEntry};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewBalanceRow, NewTransactionRow};
use super::pool::DbPool;
use super::schema::{account_balances, account_transactions};

/// Diesel-backed implementation of the `LedgerRepository` port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: super::pool::PoolError) -> LedgerRepositoryError {
    map_pool_error(error, LedgerRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> LedgerRepositoryError {
    map_diesel_error(
        error,
        LedgerRepositoryError::query,
        LedgerRepositoryError::connection,
    )
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn upsert_balance(
        &self,
        snapshot: &BalanceSnapshot,
    ) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = NewBalanceRow {
            id: Uuid::new_v4(),
            account_id: snapshot.account_id,
            amount: snapshot.amount,
            available_amount: snapshot.available_amount,
            currency: &snapshot.currency,
            balance_date: snapshot.balance_date,
            source: snapshot.source.to_string(),
        };

        diesel::insert_into(account_balances::table)
            .values(&row)
            .on_conflict((
                account_balances::account_id,
                account_balances::balance_date,
            ))
            .do_update()
            .set((
                account_balances::amount.eq(snapshot.amount),
                account_balances::available_amount.eq(snapshot.available_amount),
                account_balances::currency.eq(&snapshot.currency),
                account_balances::source.eq(snapshot.source.to_string()),
                account_balances::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(())
    }

    async fn upsert_entry(&self, entry: &LedgerEntry) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = NewTransactionRow {
            id: Uuid::new_v4(),
            account_id: entry.account_id,
            external_id: entry.external_id.as_deref(),
            amount: entry.amount,
            currency: &entry.currency,
            booked_on: entry.booked_on,
            value_date: entry.value_date,
            description: entry.description.as_deref(),
            counterparty: entry.counterparty.as_deref(),
            direction: entry.direction.to_string(),
            reference: entry.reference.as_deref(),
            source: entry.source.to_string(),
        };

        let insert = diesel::insert_into(account_transactions::table).values(&row);
        if entry.external_id.is_some() {
            insert
                .on_conflict(account_transactions::external_id)
                .do_update()
                .set((
                    account_transactions::amount.eq(entry.amount),
                    account_transactions::booked_on.eq(entry.booked_on),
                    account_transactions::value_date.eq(entry.value_date),
                    account_transactions::description.eq(entry.description.as_deref()),
                    account_transactions::counterparty.eq(entry.counterparty.as_deref()),
                    account_transactions::direction.eq(entry.direction.to_string()),
                    account_transactions::reference.eq(entry.reference.as_deref()),
                    account_transactions::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)
                .await
                .map_err(diesel_error)?;
        } else {
            // Manual entries have no natural key; they are plain inserts.
            insert.execute(&mut conn).await.map_err(diesel_error)?;
        }

        Ok(())
    }
}
