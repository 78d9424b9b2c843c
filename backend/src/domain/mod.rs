//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities for bank connections,
//! accounts, balances, and ledger entries, plus the services that drive
//! the aggregator linking and synchronisation flows. Keep types immutable
//! and document invariants and serialisation contracts (serde) in each
//! type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode — API error response payload and stable identifiers.
//! - Connection / ConnectionStatus — aggregator connection aggregate and
//!   its lifecycle state machine.
//! - BankAccount / AccountType — linked account aggregate and category
//!   mapping from ISO 20022 cash account types.
//! - BalanceSnapshot / LedgerEntry — point-in-time balance and booked
//!   transaction records.
//! - ConnectionLinkService / AccountSyncService — implementations of the
//!   driving ports in [`ports`].

pub mod account;
pub mod balance;
pub mod connection;
pub mod error;
pub mod link_service;
pub mod ports;
pub mod sync_service;
pub mod transaction;

pub use self::account::{
    AccountType, BankAccount, ConnectionKind, NewBankAccount, derive_display_name, last_four,
};
pub use self::balance::{BalanceSnapshot, RecordSource};
pub use self::connection::{
    Connection, ConnectionStatus, NewConnection, mint_user_reference, parse_user_reference,
};
pub use self::error::{Error, ErrorCode};
pub use self::link_service::{ConnectionLinkPorts, ConnectionLinkService};
pub use self::ports::Institution;
pub use self::sync_service::{AccountSyncPorts, AccountSyncService};
pub use self::transaction::{EntryDirection, LedgerEntry};
