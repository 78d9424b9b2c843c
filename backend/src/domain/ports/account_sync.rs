//! Driving port for the best-effort account refresh.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Error;

/// Parameters for one sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    pub user_id: Uuid,
    /// Narrow the pass to one internal account id.
    pub account_id: Option<Uuid>,
}

/// Machine-readable summary of one sync pass.
///
/// `success` is true iff `errors` is empty — including the case of zero
/// eligible accounts, which is vacuously successful by policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success: bool,
    pub accounts_synced: u32,
    pub balances_synced: u32,
    pub transactions_synced: u32,
    pub errors: Vec<String>,
}

impl SyncReport {
    /// Record a per-account failure.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Finalize the pass: success iff no errors were recorded.
    #[must_use]
    pub fn finalize(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

/// Driving port for refreshing balances and transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountSync: Send + Sync {
    /// Refresh some or all of a user's aggregator-linked accounts.
    ///
    /// Per-account failures are recorded in the report, never raised; the
    /// returned error covers only failures to start the pass at all.
    async fn sync(&self, request: SyncRequest) -> Result<SyncReport, Error>;
}

/// Fixture implementation reporting a vacuously successful pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountSync;

#[async_trait]
impl AccountSync for FixtureAccountSync {
    async fn sync(&self, _request: SyncRequest) -> Result<SyncReport, Error> {
        Ok(SyncReport::default().finalize())
    }
}
