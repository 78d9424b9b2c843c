//! Driving port for the connection lifecycle (initiate, complete,
//! disconnect, status).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AccountType, ConnectionStatus, Error, Institution};

/// Parameters for starting an authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateLinkRequest {
    pub user_id: Uuid,
    pub institution_id: String,
    pub institution_name: String,
    pub country_code: String,
    /// Where the aggregator sends the user's browser after authorization.
    pub redirect_url: String,
    pub user_language: Option<String>,
}

/// Result of starting an authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateLinkResponse {
    pub connection_id: Uuid,
    pub requisition_id: String,
    /// End-user authorization URL to open out-of-band.
    pub authorization_url: String,
    /// Caller-minted reference embedded in the aggregator redirect.
    pub reference: String,
}

/// One account materialized during link completion.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedAccountSummary {
    pub account_id: Uuid,
    pub display_name: String,
    pub bank_name: String,
    pub account_type: AccountType,
    pub currency: String,
}

/// Result of completing an authorization flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteLinkResponse {
    pub connection_id: Uuid,
    pub institution_name: String,
    /// Successfully materialized accounts; may be a partial set when
    /// individual accounts failed.
    pub accounts: Vec<LinkedAccountSummary>,
}

/// Read-only connection state for UI polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatusResponse {
    pub connection_id: Uuid,
    pub institution_name: String,
    pub status: ConnectionStatus,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
}

/// Driving port for connection lifecycle operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionLink: Send + Sync {
    /// List institutions for a country.
    async fn list_institutions(&self, country: &str) -> Result<Vec<Institution>, Error>;

    /// Start an authorization flow and persist a `created` connection.
    async fn initiate(&self, request: InitiateLinkRequest) -> Result<InitiateLinkResponse, Error>;

    /// Complete an authorization flow from a callback reference, which is
    /// either the requisition id or a caller-minted opaque reference.
    async fn complete(&self, reference: &str) -> Result<CompleteLinkResponse, Error>;

    /// Revoke the requisition, suspend the connection, and deactivate its
    /// accounts.
    async fn disconnect(&self, user_id: Uuid, requisition_id: &str) -> Result<(), Error>;

    /// Read-only lookup by requisition id.
    async fn status(&self, requisition_id: &str) -> Result<LinkStatusResponse, Error>;
}

/// Fixture implementation for tests that do not exercise the link flow.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureConnectionLink;

#[async_trait]
impl ConnectionLink for FixtureConnectionLink {
    async fn list_institutions(&self, _country: &str) -> Result<Vec<Institution>, Error> {
        Ok(Vec::new())
    }

    async fn initiate(&self, _request: InitiateLinkRequest) -> Result<InitiateLinkResponse, Error> {
        Err(Error::service_unavailable("link flow not configured"))
    }

    async fn complete(&self, _reference: &str) -> Result<CompleteLinkResponse, Error> {
        Err(Error::service_unavailable("link flow not configured"))
    }

    async fn disconnect(&self, _user_id: Uuid, _requisition_id: &str) -> Result<(), Error> {
        Err(Error::service_unavailable("link flow not configured"))
    }

    async fn status(&self, _requisition_id: &str) -> Result<LinkStatusResponse, Error> {
        Err(Error::service_unavailable("link flow not configured"))
    }
}
