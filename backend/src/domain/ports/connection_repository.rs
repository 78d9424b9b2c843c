//! Port for connection persistence and callback lookups.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Connection, NewConnection};

use super::define_port_error;

define_port_error! {
    /// Errors raised by connection repository adapters.
    pub enum ConnectionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "connection repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "connection repository query failed: {message}",
    }
}

/// Port for reading and writing connection records.
///
/// Duplicate non-terminal connections per (user, institution) are possible
/// by design; [`ConnectionRepository::latest_created_for_user`] resolves
/// the ambiguity by recency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Persist a new connection in `created` status.
    async fn create(&self, new: &NewConnection) -> Result<Connection, ConnectionRepositoryError>;

    /// Exact lookup by aggregator requisition id.
    async fn find_by_requisition(
        &self,
        requisition_id: &str,
    ) -> Result<Option<Connection>, ConnectionRepositoryError>;

    /// Newest `created`-status connection for a user.
    ///
    /// Fallback for callbacks carrying a caller-minted reference instead
    /// of the requisition id.
    async fn latest_created_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Connection>, ConnectionRepositoryError>;

    /// Transition to `linked`, stamping agreement and sync timestamps.
    async fn mark_linked(
        &self,
        requisition_id: &str,
    ) -> Result<Option<Connection>, ConnectionRepositoryError>;

    /// Transition to `suspended` for a user's requisition.
    async fn mark_suspended(
        &self,
        user_id: Uuid,
        requisition_id: &str,
    ) -> Result<(), ConnectionRepositoryError>;

    /// Record the outcome of a sync pass: stamps `last_sync_at` and sets
    /// or clears `last_sync_error`.
    async fn record_sync_outcome(
        &self,
        connection_id: Uuid,
        error: Option<String>,
    ) -> Result<(), ConnectionRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureConnectionRepository;

#[async_trait]
impl ConnectionRepository for FixtureConnectionRepository {
    async fn create(&self, new: &NewConnection) -> Result<Connection, ConnectionRepositoryError> {
        let now = chrono::Utc::now();
        Ok(Connection {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            institution_id: new.institution_id.clone(),
            institution_name: new.institution_name.clone(),
            country_code: new.country_code.clone(),
            requisition_id: new.requisition_id.clone(),
            status: crate::domain::ConnectionStatus::Created,
            agreement_accepted_at: None,
            last_sync_at: None,
            last_sync_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_requisition(
        &self,
        _requisition_id: &str,
    ) -> Result<Option<Connection>, ConnectionRepositoryError> {
        Ok(None)
    }

    async fn latest_created_for_user(
        &self,
        _user_id: Uuid,
    ) -> Result<Option<Connection>, ConnectionRepositoryError> {
        Ok(None)
    }

    async fn mark_linked(
        &self,
        _requisition_id: &str,
    ) -> Result<Option<Connection>, ConnectionRepositoryError> {
        Ok(None)
    }

    async fn mark_suspended(
        &self,
        _user_id: Uuid,
        _requisition_id: &str,
    ) -> Result<(), ConnectionRepositoryError> {
        Ok(())
    }

    async fn record_sync_outcome(
        &self,
        _connection_id: Uuid,
        _error: Option<String>,
    ) -> Result<(), ConnectionRepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;

    #[tokio::test]
    async fn fixture_create_echoes_request_in_created_status() {
        let repo = FixtureConnectionRepository;
        let new = NewConnection {
            user_id: Uuid::new_v4(),
            institution_id: "SANDBOX_BANK".to_owned(),
            institution_name: "Sandbox Bank".to_owned(),
            country_code: "GB".to_owned(),
            requisition_id: "req_123".to_owned(),
        };
        let connection = repo.create(&new).await.expect("fixture create succeeds");
        assert_eq!(connection.requisition_id, "req_123");
        assert_eq!(connection.status, crate::domain::ConnectionStatus::Created);
    }

    #[tokio::test]
    async fn fixture_lookups_return_none() {
        let repo = FixtureConnectionRepository;
        assert!(
            repo.find_by_requisition("req_123")
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
        assert!(
            repo.latest_created_for_user(Uuid::new_v4())
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
    }
}
