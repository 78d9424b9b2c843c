//! Best-effort refresh of aggregator-linked accounts.
//!
//! Accounts are processed sequentially in store order. Every failure is
//! caught at the per-account boundary and recorded in the report, so one
//! broken account never blocks refreshing the rest. Rate-limit exhaustion
//! is a recorded skip that never reaches the aggregator.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::domain::ports::{
    AccountSync, BalanceReading, BankAccountRepository, BankDataGateway, ConnectionRepository,
    LedgerRepository, SyncQuota, SyncReport, SyncRequest,
};
use crate::domain::{
    BalanceSnapshot, BankAccount, EntryDirection, Error, LedgerEntry, RecordSource,
};

use super::link_service::map_account_repo_error;

/// Trailing transaction window pulled on every sync.
const TRANSACTION_WINDOW_DAYS: i64 = 30;

/// Driven-port bundle for the sync service.
pub struct AccountSyncPorts {
    /// Outbound aggregator gateway.
    pub gateway: Arc<dyn BankDataGateway>,
    /// Bank account selection.
    pub accounts: Arc<dyn BankAccountRepository>,
    /// Per-connection sync bookkeeping.
    pub connections: Arc<dyn ConnectionRepository>,
    /// Balance and transaction persistence.
    pub ledger: Arc<dyn LedgerRepository>,
    /// Per-account aggregator quota.
    pub quota: Arc<dyn SyncQuota>,
}

/// Service implementing [`AccountSync`] over the driven ports.
pub struct AccountSyncService {
    ports: AccountSyncPorts,
}

/// Per-account tallies accumulated into the report.
struct AccountOutcome {
    balances: u32,
    transactions: u32,
}

impl AccountSyncService {
    /// Build the service from its port bundle.
    #[must_use]
    pub const fn new(ports: AccountSyncPorts) -> Self {
        Self { ports }
    }

    /// Refresh one account: balance snapshot, then the trailing
    /// transaction window. Errors are stringly typed so the caller can
    /// record them without aborting the batch.
    async fn sync_account(&self, account: &BankAccount) -> Result<AccountOutcome, String> {
        let external_id = account
            .external_id
            .as_deref()
            .ok_or_else(|| "account has no external account id".to_owned())?;

        if !self.ports.quota.check_and_consume(external_id).await {
            return Err("aggregator rate limit exhausted for this account".to_owned());
        }

        let readings = self
            .ports
            .gateway
            .account_balances(external_id)
            .await
            .map_err(|err| err.to_string())?;

        let mut balances = 0;
        if let Some(reading) = BalanceReading::preferred(&readings) {
            self.ports
                .ledger
                .upsert_balance(&BalanceSnapshot {
                    account_id: account.id,
                    amount: reading.amount,
                    available_amount: BalanceReading::available_amount(&readings),
                    currency: reading.currency.clone(),
                    balance_date: Utc::now().date_naive(),
                    source: RecordSource::Aggregator,
                })
                .await
                .map_err(|err| err.to_string())?;
            balances = 1;
        }

        let date_to = Utc::now().date_naive();
        let date_from = date_to - Duration::days(TRANSACTION_WINDOW_DAYS);
        let booked = self
            .ports
            .gateway
            .account_transactions(external_id, date_from, date_to)
            .await
            .map_err(|err| err.to_string())?;

        let mut transactions = 0;
        for tx in booked {
            let entry = LedgerEntry {
                account_id: account.id,
                external_id: Some(tx.external_id.clone()),
                amount: tx.amount,
                currency: tx.currency,
                booked_on: tx.booked_on,
                value_date: tx.value_date,
                description: tx.description,
                counterparty: tx.counterparty,
                direction: EntryDirection::from_amount(tx.amount),
                reference: tx.reference,
                source: RecordSource::Aggregator,
            };
            // A malformed transaction is skipped, never fatal for the batch.
            match self.ports.ledger.upsert_entry(&entry).await {
                Ok(()) => transactions += 1,
                Err(err) => warn!(
                    account_id = %account.id,
                    external_transaction_id = %tx.external_id,
                    error = %err,
                    "skipping transaction during sync"
                ),
            }
        }

        Ok(AccountOutcome {
            balances,
            transactions,
        })
    }

    /// Stamp the owning connection with the pass outcome. Bookkeeping
    /// only; failures are logged and swallowed.
    async fn record_outcome(&self, account: &BankAccount, error: Option<String>) {
        let Some(connection_id) = account.connection_id else {
            return;
        };
        if let Err(err) = self
            .ports
            .connections
            .record_sync_outcome(connection_id, error)
            .await
        {
            warn!(
                connection_id = %connection_id,
                error = %err,
                "failed to record sync outcome"
            );
        }
    }
}

#[async_trait::async_trait]
impl AccountSync for AccountSyncService {
    async fn sync(&self, request: SyncRequest) -> Result<SyncReport, Error> {
        let accounts = self
            .ports
            .accounts
            .list_active_aggregator(request.user_id, request.account_id)
            .await
            .map_err(map_account_repo_error)?;

        debug!(
            user_id = %request.user_id,
            candidates = accounts.len(),
            "starting sync pass"
        );

        let mut report = SyncReport::default();
        for account in &accounts {
            match self.sync_account(account).await {
                Ok(outcome) => {
                    report.accounts_synced += 1;
                    report.balances_synced += outcome.balances;
                    report.transactions_synced += outcome.transactions;
                    self.record_outcome(account, None).await;
                }
                Err(message) => {
                    warn!(
                        account_id = %account.id,
                        error = %message,
                        "account sync failed"
                    );
                    let recorded = format!("Failed to sync {}: {message}", account.display_name);
                    self.record_outcome(account, Some(recorded.clone())).await;
                    report.record_error(recorded);
                }
            }
        }

        Ok(report.finalize())
    }
}

#[cfg(test)]
#[path = "sync_service_tests.rs"]
mod tests;
