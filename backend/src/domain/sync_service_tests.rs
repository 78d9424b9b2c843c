//! Tests for the account sync service.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::*;
use crate::domain::ports::{
    BankGatewayError, BookedTransaction, FixtureLedgerRepository, MockBankAccountRepository,
    MockBankDataGateway, MockConnectionRepository, MockLedgerRepository, MockSyncQuota,
    UnlimitedSyncQuota,
};
use crate::domain::{AccountType, ConnectionKind};

fn aggregator_account(display_name: &str, external_id: Option<&str>) -> BankAccount {
    let now = Utc::now();
    BankAccount {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        connection_id: Some(Uuid::new_v4()),
        display_name: display_name.to_owned(),
        bank_name: "Sandbox Bank".to_owned(),
        account_type: AccountType::Checking,
        currency: "GBP".to_owned(),
        last_four: Some("6819".to_owned()),
        connection_kind: ConnectionKind::Aggregator,
        external_id: external_id.map(str::to_owned),
        is_active: true,
        manual_balance: None,
        created_at: now,
        updated_at: now,
    }
}

fn interim_reading(amount: f64) -> BalanceReading {
    BalanceReading {
        amount,
        currency: "GBP".to_owned(),
        balance_type: Some("interimAvailable".to_owned()),
        reference_date: None,
    }
}

fn booked(external_id: &str, amount: f64) -> BookedTransaction {
    BookedTransaction {
        external_id: external_id.to_owned(),
        amount,
        currency: "GBP".to_owned(),
        booked_on: Utc::now().date_naive(),
        value_date: None,
        description: Some("Coffee".to_owned()),
        counterparty: Some("Cafe Nero".to_owned()),
        reference: None,
    }
}

struct PortsBuilder {
    gateway: MockBankDataGateway,
    accounts: MockBankAccountRepository,
    connections: MockConnectionRepository,
    ledger: Arc<dyn LedgerRepository>,
    quota: Arc<dyn SyncQuota>,
}

impl PortsBuilder {
    fn new() -> Self {
        Self {
            gateway: MockBankDataGateway::new(),
            accounts: MockBankAccountRepository::new(),
            connections: MockConnectionRepository::new(),
            ledger: Arc::new(FixtureLedgerRepository),
            quota: Arc::new(UnlimitedSyncQuota),
        }
    }

    fn build(self) -> AccountSyncService {
        AccountSyncService::new(AccountSyncPorts {
            gateway: Arc::new(self.gateway),
            accounts: Arc::new(self.accounts),
            connections: Arc::new(self.connections),
            ledger: self.ledger,
            quota: self.quota,
        })
    }
}

fn request() -> SyncRequest {
    SyncRequest {
        user_id: Uuid::new_v4(),
        account_id: None,
    }
}

#[tokio::test]
async fn no_eligible_accounts_is_vacuously_successful() {
    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));

    let report = ports.build().sync(request()).await.expect("sync succeeds");
    assert!(report.success);
    assert_eq!(report.accounts_synced, 0);
    assert_eq!(report.balances_synced, 0);
    assert_eq!(report.transactions_synced, 0);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn one_failing_account_never_blocks_the_rest() {
    let good_one = aggregator_account("Main", Some("ext-1"));
    let bad = aggregator_account("Savings", Some("ext-2"));
    let good_two = aggregator_account("Travel", Some("ext-3"));
    let listed = vec![good_one, bad, good_two];

    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(move |_, _| Ok(listed));
    ports
        .gateway
        .expect_account_balances()
        .times(3)
        .returning(|external_id| {
            if external_id == "ext-2" {
                Err(BankGatewayError::api(500_u16, "upstream exploded"))
            } else {
                Ok(vec![interim_reading(42.0)])
            }
        });
    ports
        .gateway
        .expect_account_transactions()
        .times(2)
        .returning(|external_id, _, _| Ok(vec![booked(&format!("tx-{external_id}"), -3.2)]));
    ports
        .connections
        .expect_record_sync_outcome()
        .times(3)
        .returning(|_, _| Ok(()));

    let report = ports.build().sync(request()).await.expect("sync succeeds");
    assert!(!report.success);
    assert_eq!(report.accounts_synced, 2);
    assert_eq!(report.balances_synced, 2);
    assert_eq!(report.transactions_synced, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Failed to sync Savings:"));
}

#[tokio::test]
async fn exhausted_quota_is_recorded_without_touching_the_aggregator() {
    let account = aggregator_account("Main", Some("ext-1"));

    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(move |_, _| Ok(vec![account]));
    ports.gateway.expect_account_balances().times(0);
    ports.gateway.expect_account_transactions().times(0);
    ports
        .connections
        .expect_record_sync_outcome()
        .times(1)
        .withf(|_, error| {
            error
                .as_deref()
                .is_some_and(|message| message.contains("rate limit"))
        })
        .return_once(|_, _| Ok(()));

    let mut quota = MockSyncQuota::new();
    quota
        .expect_check_and_consume()
        .times(1)
        .withf(|key| key == "ext-1")
        .return_once(|_| false);
    ports.quota = Arc::new(quota);

    let report = ports.build().sync(request()).await.expect("sync succeeds");
    assert!(!report.success);
    assert_eq!(report.accounts_synced, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("rate limit"));
}

#[tokio::test]
async fn account_without_an_external_id_is_recorded_as_failed() {
    let account = aggregator_account("Orphan", None);

    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(move |_, _| Ok(vec![account]));
    ports
        .connections
        .expect_record_sync_outcome()
        .times(1)
        .returning(|_, _| Ok(()));

    let report = ports.build().sync(request()).await.expect("sync succeeds");
    assert!(!report.success);
    assert!(report.errors[0].starts_with("Failed to sync Orphan:"));
}

#[tokio::test]
async fn transactions_are_pulled_for_the_trailing_window() {
    let account = aggregator_account("Main", Some("ext-1"));

    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(move |_, _| Ok(vec![account]));
    ports
        .gateway
        .expect_account_balances()
        .times(1)
        .returning(|_| Ok(vec![interim_reading(42.0)]));
    ports
        .gateway
        .expect_account_transactions()
        .times(1)
        .withf(|_, date_from, date_to| (*date_to - *date_from).num_days() == 30)
        .returning(|_, _, _| Ok(vec![booked("tx-1", -3.2), booked("tx-2", 1500.0)]));
    ports
        .connections
        .expect_record_sync_outcome()
        .times(1)
        .withf(|_, error| error.is_none())
        .return_once(|_, _| Ok(()));

    let report = ports.build().sync(request()).await.expect("sync succeeds");
    assert!(report.success);
    assert_eq!(report.accounts_synced, 1);
    assert_eq!(report.transactions_synced, 2);
}

#[tokio::test]
async fn malformed_transaction_is_skipped_without_failing_the_account() {
    let account = aggregator_account("Main", Some("ext-1"));

    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(move |_, _| Ok(vec![account]));
    ports
        .gateway
        .expect_account_balances()
        .times(1)
        .returning(|_| Ok(Vec::new()));
    ports
        .gateway
        .expect_account_transactions()
        .times(1)
        .returning(|_, _, _| Ok(vec![booked("tx-good", -3.2), booked("tx-bad", 9.9)]));
    ports
        .connections
        .expect_record_sync_outcome()
        .times(1)
        .returning(|_, _| Ok(()));

    let mut ledger = MockLedgerRepository::new();
    ledger.expect_upsert_entry().times(2).returning(|entry| {
        if entry.external_id.as_deref() == Some("tx-bad") {
            Err(crate::domain::ports::LedgerRepositoryError::query(
                "duplicate key",
            ))
        } else {
            Ok(())
        }
    });
    ports.ledger = Arc::new(ledger);

    let report = ports.build().sync(request()).await.expect("sync succeeds");
    assert!(report.success);
    assert_eq!(report.accounts_synced, 1);
    assert_eq!(report.balances_synced, 0);
    assert_eq!(report.transactions_synced, 1);
}

#[tokio::test]
async fn store_outage_fails_the_whole_pass() {
    let mut ports = PortsBuilder::new();
    ports
        .accounts
        .expect_list_active_aggregator()
        .times(1)
        .return_once(|_, _| {
            Err(
                crate::domain::ports::BankAccountRepositoryError::connection(
                    "pool exhausted",
                ),
            )
        });

    let error = ports.build().sync(request()).await.expect_err("503");
    assert_eq!(error.code, crate::domain::ErrorCode::ServiceUnavailable);
}
