//! Composition root: builds adapters and wires them into the HTTP state.

pub mod config;

pub use config::{ConfigError, ServerConfig};

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    AccountSyncPorts, AccountSyncService, ConnectionLinkPorts, ConnectionLinkService,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::gocardless::GoCardlessHttpGateway;
use crate::outbound::persistence::{
    DbPool, DieselBankAccountRepository, DieselConnectionRepository, DieselLedgerRepository,
    PoolConfig, PoolError,
};
use crate::outbound::quota::InMemorySyncQuota;

/// Failure while wiring the application together.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("database pool: {0}")]
    Pool(#[from] PoolError),
    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build the database pool from the configured connection string.
pub async fn build_pool(config: &ServerConfig) -> Result<DbPool, BootstrapError> {
    let pool = DbPool::new(PoolConfig::new(&config.database_url)).await?;
    Ok(pool)
}

/// Wire concrete adapters into the services behind the HTTP state.
pub fn build_state(config: &ServerConfig, pool: DbPool) -> Result<HttpState, BootstrapError> {
    let gateway = Arc::new(GoCardlessHttpGateway::new(
        config.endpoint.clone(),
        config.credentials.clone(),
    )?);
    let connections = Arc::new(DieselConnectionRepository::new(pool.clone()));
    let accounts = Arc::new(DieselBankAccountRepository::new(pool.clone()));
    let ledger = Arc::new(DieselLedgerRepository::new(pool));
    let quota = Arc::new(InMemorySyncQuota::default());

    let link = ConnectionLinkService::new(ConnectionLinkPorts {
        gateway: gateway.clone(),
        connections: connections.clone(),
        accounts: accounts.clone(),
        ledger: ledger.clone(),
    });
    let sync = AccountSyncService::new(AccountSyncPorts {
        gateway,
        accounts,
        connections,
        ledger,
        quota,
    });

    info!(endpoint = %config.endpoint, "application state wired");
    Ok(HttpState::new(
        Arc::new(link),
        Arc::new(sync),
        config.callback_url.clone(),
    ))
}
