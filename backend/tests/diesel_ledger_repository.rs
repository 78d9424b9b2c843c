//! Integration tests for the diesel persistence adapters against embedded
//! PostgreSQL.
//!
//! The write paths promise convergence: replaying a sync window must leave
//! one balance row per `(account_id, balance_date)` and one ledger entry
//! per aggregator transaction id. Those guarantees live in the upsert SQL,
//! so they are validated here against the real schema.

use backend::domain::ports::{BankAccountRepository, ConnectionRepository, LedgerRepository};
use backend::domain::{
    AccountType, BalanceSnapshot, BankAccount, ConnectionKind, ConnectionStatus, EntryDirection,
    LedgerEntry, NewBankAccount, NewConnection, RecordSource,
};
use backend::outbound::persistence::{
    DbPool, DieselBankAccountRepository, DieselConnectionRepository, DieselLedgerRepository,
    PoolConfig,
};
use chrono::NaiveDate;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::{handle_cluster_setup_failure, provision_database, shared_cluster};

struct TestContext {
    runtime: Runtime,
    pool: DbPool,
    database_url: String,
    _database: TemporaryDatabase,
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        pool,
        database_url,
        _database: database,
    })
}

#[fixture]
fn db_context() -> Option<TestContext> {
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn new_connection(user_id: Uuid) -> NewConnection {
    NewConnection {
        user_id,
        institution_id: "SANDBOX_GB".into(),
        institution_name: "Sandbox Bank".into(),
        country_code: "GB".into(),
        requisition_id: format!("req-{}", Uuid::new_v4()),
    }
}

fn seed_account(context: &TestContext) -> BankAccount {
    let connections = DieselConnectionRepository::new(context.pool.clone());
    let accounts = DieselBankAccountRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        let connection = connections
            .create(&new_connection(Uuid::new_v4()))
            .await
            .expect("create connection");
        accounts
            .insert(&NewBankAccount {
                user_id: connection.user_id,
                connection_id: Some(connection.id),
                display_name: "Main Current Account".into(),
                bank_name: "Sandbox Bank".into(),
                account_type: AccountType::Checking,
                currency: "GBP".into(),
                last_four: Some("6819".into()),
                connection_kind: ConnectionKind::Aggregator,
                external_id: Some(format!("ext-{}", Uuid::new_v4())),
                manual_balance: None,
            })
            .await
            .expect("insert account")
    })
}

fn count_rows(url: &str, sql: &str, account_id: Uuid) -> i64 {
    let mut client = Client::connect(url, NoTls).expect("connect to test database");
    let row = client.query_one(sql, &[&account_id]).expect("count query");
    row.get(0)
}

fn balance_snapshot(account_id: Uuid, amount: f64, available: Option<f64>) -> BalanceSnapshot {
    BalanceSnapshot {
        account_id,
        amount,
        available_amount: available,
        currency: "GBP".into(),
        balance_date: NaiveDate::from_ymd_opt(2026, 8, 10).expect("valid date"),
        source: RecordSource::Aggregator,
    }
}

fn ledger_entry(account_id: Uuid, external_id: Option<&str>, description: &str) -> LedgerEntry {
    LedgerEntry {
        account_id,
        external_id: external_id.map(str::to_owned),
        amount: -9.99,
        currency: "GBP".into(),
        booked_on: NaiveDate::from_ymd_opt(2026, 8, 9).expect("valid date"),
        value_date: None,
        description: Some(description.to_owned()),
        counterparty: Some("Coffee Roasters Ltd".into()),
        direction: EntryDirection::Debit,
        reference: None,
        source: RecordSource::Aggregator,
    }
}

#[rstest]
fn replayed_balance_converges_on_one_row_per_day(db_context: Option<TestContext>) {
    let Some(context) = db_context else {
        eprintln!("SKIP-TEST-CLUSTER: replayed_balance_converges_on_one_row_per_day skipped");
        return;
    };

    let account = seed_account(&context);
    let ledger = DieselLedgerRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        ledger
            .upsert_balance(&balance_snapshot(account.id, 100.0, None))
            .await
            .expect("first upsert");
        ledger
            .upsert_balance(&balance_snapshot(account.id, 125.5, Some(120.0)))
            .await
            .expect("replayed upsert");
    });

    let count = count_rows(
        context.database_url.as_str(),
        "SELECT COUNT(*) FROM account_balances WHERE account_id = $1",
        account.id,
    );
    assert_eq!(count, 1, "replay must not duplicate the daily snapshot");

    let mut client =
        Client::connect(context.database_url.as_str(), NoTls).expect("connect to test database");
    let row = client
        .query_one(
            "SELECT amount, available_amount FROM account_balances WHERE account_id = $1",
            &[&account.id],
        )
        .expect("read snapshot");
    let amount: f64 = row.get(0);
    let available: Option<f64> = row.get(1);
    assert!((amount - 125.5).abs() < f64::EPSILON);
    assert_eq!(available, Some(120.0));
}

#[rstest]
fn replayed_transaction_converges_on_its_external_id(db_context: Option<TestContext>) {
    let Some(context) = db_context else {
        eprintln!("SKIP-TEST-CLUSTER: replayed_transaction_converges_on_its_external_id skipped");
        return;
    };

    let account = seed_account(&context);
    let ledger = DieselLedgerRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        ledger
            .upsert_entry(&ledger_entry(account.id, Some("tx-1"), "COFFEE 09/08"))
            .await
            .expect("first upsert");
        ledger
            .upsert_entry(&ledger_entry(account.id, Some("tx-1"), "Coffee Roasters"))
            .await
            .expect("replayed upsert");
    });

    let count = count_rows(
        context.database_url.as_str(),
        "SELECT COUNT(*) FROM account_transactions WHERE account_id = $1",
        account.id,
    );
    assert_eq!(count, 1, "replay must not duplicate the keyed entry");

    let mut client =
        Client::connect(context.database_url.as_str(), NoTls).expect("connect to test database");
    let row = client
        .query_one(
            "SELECT description FROM account_transactions WHERE account_id = $1",
            &[&account.id],
        )
        .expect("read entry");
    let description: Option<String> = row.get(0);
    assert_eq!(description.as_deref(), Some("Coffee Roasters"));
}

#[rstest]
fn manual_entries_without_a_key_insert_fresh_rows(db_context: Option<TestContext>) {
    let Some(context) = db_context else {
        eprintln!("SKIP-TEST-CLUSTER: manual_entries_without_a_key_insert_fresh_rows skipped");
        return;
    };

    let account = seed_account(&context);
    let ledger = DieselLedgerRepository::new(context.pool.clone());

    context.runtime.block_on(async {
        ledger
            .upsert_entry(&ledger_entry(account.id, None, "Cash withdrawal"))
            .await
            .expect("first insert");
        ledger
            .upsert_entry(&ledger_entry(account.id, None, "Cash withdrawal"))
            .await
            .expect("second insert");
    });

    let count = count_rows(
        context.database_url.as_str(),
        "SELECT COUNT(*) FROM account_transactions WHERE account_id = $1",
        account.id,
    );
    assert_eq!(count, 2, "unkeyed entries have no natural key to converge on");
}

#[rstest]
fn mark_linked_stamps_agreement_and_sync_timestamps(db_context: Option<TestContext>) {
    let Some(context) = db_context else {
        eprintln!("SKIP-TEST-CLUSTER: mark_linked_stamps_agreement_and_sync_timestamps skipped");
        return;
    };

    let connections = DieselConnectionRepository::new(context.pool.clone());
    let linked = context.runtime.block_on(async {
        let created = connections
            .create(&new_connection(Uuid::new_v4()))
            .await
            .expect("create connection");
        assert_eq!(created.status, ConnectionStatus::Created);
        assert!(created.agreement_accepted_at.is_none());

        connections
            .mark_linked(created.requisition_id.as_str())
            .await
            .expect("mark linked")
            .expect("connection exists")
    });

    assert_eq!(linked.status, ConnectionStatus::Linked);
    assert!(linked.agreement_accepted_at.is_some());
    assert!(linked.last_sync_at.is_some());
}
