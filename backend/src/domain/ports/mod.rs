//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod account_sync;
mod bank_gateway;
mod connection_link;
mod connection_repository;
mod ledger_repository;
mod sync_quota;

pub use account_repository::{
    BankAccountRepository, BankAccountRepositoryError, FixtureBankAccountRepository,
};
pub use account_sync::{AccountSync, FixtureAccountSync, SyncReport, SyncRequest};
pub use bank_gateway::{
    BalanceReading, BankDataGateway, BankGatewayError, BookedTransaction, ExternalAccountDetails,
    Institution, REQUISITION_LINKED, Requisition, RequisitionRequest, RequisitionSession,
};
pub use connection_link::{
    CompleteLinkResponse, ConnectionLink, FixtureConnectionLink, InitiateLinkRequest,
    InitiateLinkResponse, LinkStatusResponse, LinkedAccountSummary,
};
pub use connection_repository::{
    ConnectionRepository, ConnectionRepositoryError, FixtureConnectionRepository,
};
pub use ledger_repository::{FixtureLedgerRepository, LedgerRepository, LedgerRepositoryError};
pub use sync_quota::{SyncQuota, UnlimitedSyncQuota};

#[cfg(test)]
pub use account_repository::MockBankAccountRepository;
#[cfg(test)]
pub use account_sync::MockAccountSync;
#[cfg(test)]
pub use connection_link::MockConnectionLink;
#[cfg(test)]
pub use bank_gateway::MockBankDataGateway;
#[cfg(test)]
pub use connection_repository::MockConnectionRepository;
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
#[cfg(test)]
pub use sync_quota::MockSyncQuota;
