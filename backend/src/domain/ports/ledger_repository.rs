//! Port for balance snapshot and ledger entry persistence.

use async_trait::async_trait;

use crate::domain::{BalanceSnapshot, LedgerEntry};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger repository adapters.
    pub enum LedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ledger repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ledger repository query failed: {message}",
    }
}

/// Port for idempotent balance and transaction writes.
///
/// Both writes are upserts keyed on natural identifiers — `(account_id,
/// balance_date)` for snapshots, the external transaction id for entries —
/// so overlapping sync runs converge instead of duplicating rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Insert or overwrite the balance snapshot for the snapshot's day.
    async fn upsert_balance(&self, snapshot: &BalanceSnapshot)
    -> Result<(), LedgerRepositoryError>;

    /// Insert or overwrite a ledger entry by its external id.
    ///
    /// Entries without an external id (manual records) are plain inserts.
    async fn upsert_entry(&self, entry: &LedgerEntry) -> Result<(), LedgerRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLedgerRepository;

#[async_trait]
impl LedgerRepository for FixtureLedgerRepository {
    async fn upsert_balance(
        &self,
        _snapshot: &BalanceSnapshot,
    ) -> Result<(), LedgerRepositoryError> {
        Ok(())
    }

    async fn upsert_entry(&self, _entry: &LedgerEntry) -> Result<(), LedgerRepositoryError> {
        Ok(())
    }
}
