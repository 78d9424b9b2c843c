//! PostgreSQL-backed `ConnectionRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ConnectionRepository, ConnectionRepositoryError};
use crate::domain::{Connection, ConnectionStatus, NewConnection};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ConnectionRow, NewConnectionRow};
use super::pool::DbPool;
use super::schema::connections;

/// Diesel-backed implementation of the `ConnectionRepository` port.
#[derive(Clone)]
pub struct DieselConnectionRepository {
    pool: DbPool,
}

impl DieselConnectionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: super::pool::PoolError) -> ConnectionRepositoryError {
    map_pool_error(error, ConnectionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ConnectionRepositoryError {
    map_diesel_error(
        error,
        ConnectionRepositoryError::query,
        ConnectionRepositoryError::connection,
    )
}

#[async_trait]
impl ConnectionRepository for DieselConnectionRepository {
    async fn create(&self, new: &NewConnection) -> Result<Connection, ConnectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = NewConnectionRow {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            institution_id: &new.institution_id,
            institution_name: &new.institution_name,
            country_code: &new.country_code,
            requisition_id: &new.requisition_id,
            status: ConnectionStatus::Created.to_string(),
        };

        let created: ConnectionRow = diesel::insert_into(connections::table)
            .values(&row)
            .returning(ConnectionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(created.into_domain())
    }

    async fn find_by_requisition(
        &self,
        requisition_id: &str,
    ) -> Result<Option<Connection>, ConnectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<ConnectionRow> = connections::table
            .filter(connections::requisition_id.eq(requisition_id))
            .select(ConnectionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        Ok(row.map(ConnectionRow::into_domain))
    }

    async fn latest_created_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Connection>, ConnectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<ConnectionRow> = connections::table
            .filter(connections::user_id.eq(user_id))
            .filter(connections::status.eq(ConnectionStatus::Created.to_string()))
            .order(connections::created_at.desc())
            .select(ConnectionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        Ok(row.map(ConnectionRow::into_domain))
    }

    async fn mark_linked(
        &self,
        requisition_id: &str,
    ) -> Result<Option<Connection>, ConnectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let now = Utc::now();
        let row: Option<ConnectionRow> = diesel::update(connections::table)
            .filter(connections::requisition_id.eq(requisition_id))
            .set((
                connections::status.eq(ConnectionStatus::Linked.to_string()),
                connections::agreement_accepted_at.eq(Some(now)),
                connections::last_sync_at.eq(Some(now)),
                connections::updated_at.eq(now),
            ))
            .returning(ConnectionRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        Ok(row.map(ConnectionRow::into_domain))
    }

    async fn mark_suspended(
        &self,
        user_id: Uuid,
        requisition_id: &str,
    ) -> Result<(), ConnectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::update(connections::table)
            .filter(connections::user_id.eq(user_id))
            .filter(connections::requisition_id.eq(requisition_id))
            .set((
                connections::status.eq(ConnectionStatus::Suspended.to_string()),
                connections::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(())
    }

    async fn record_sync_outcome(
        &self,
        connection_id: Uuid,
        error: Option<String>,
    ) -> Result<(), ConnectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let now = Utc::now();
        diesel::update(connections::table)
            .filter(connections::id.eq(connection_id))
            .set((
                connections::last_sync_at.eq(Some(now)),
                connections::last_sync_error.eq(error),
                connections::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(())
    }
}
