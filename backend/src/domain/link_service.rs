//! Connection lifecycle orchestration.
//!
//! Drives the three-step authorization flow: create a requisition and a
//! `created` connection, let the user authorize out-of-band, then complete
//! by materializing one internal bank account per external account id the
//! aggregator surfaced. Completion tolerates individual account failures —
//! a partial set of accounts is still a successful link.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    BalanceReading, BankAccountRepository, BankAccountRepositoryError, BankDataGateway,
    BankGatewayError, CompleteLinkResponse, ConnectionLink, ConnectionRepository,
    ConnectionRepositoryError, InitiateLinkRequest, InitiateLinkResponse, Institution,
    LinkStatusResponse, LinkedAccountSummary, REQUISITION_LINKED, RequisitionRequest,
};
use crate::domain::{
    AccountType, BalanceSnapshot, Connection, ConnectionKind, Error, NewBankAccount,
    NewConnection, RecordSource, derive_display_name, last_four, mint_user_reference,
    parse_user_reference,
};

/// Currency recorded when neither account details nor balances carry one.
const FALLBACK_CURRENCY: &str = "EUR";

pub(crate) fn map_gateway_error(error: BankGatewayError) -> Error {
    match error {
        BankGatewayError::AuthenticationFailed { detail } => {
            Error::unauthorized(format!("aggregator rejected credentials: {detail}"))
        }
        BankGatewayError::Api { status, detail } => {
            Error::service_unavailable(format!("aggregator error: {detail}"))
                .with_details(json!({ "status": status }))
        }
        BankGatewayError::Transport { message } => {
            Error::service_unavailable(format!("aggregator unreachable: {message}"))
        }
        BankGatewayError::Decode { message } => {
            Error::internal(format!("aggregator response invalid: {message}"))
        }
    }
}

pub(crate) fn map_connection_repo_error(error: ConnectionRepositoryError) -> Error {
    match error {
        ConnectionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("connection store unavailable: {message}"))
        }
        ConnectionRepositoryError::Query { message } => {
            Error::internal(format!("connection store error: {message}"))
        }
    }
}

pub(crate) fn map_account_repo_error(error: BankAccountRepositoryError) -> Error {
    match error {
        BankAccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account store unavailable: {message}"))
        }
        BankAccountRepositoryError::Query { message } => {
            Error::internal(format!("account store error: {message}"))
        }
    }
}

/// Driven-port bundle for the link service.
pub struct ConnectionLinkPorts {
    /// Outbound aggregator gateway.
    pub gateway: Arc<dyn BankDataGateway>,
    /// Connection persistence.
    pub connections: Arc<dyn ConnectionRepository>,
    /// Bank account persistence.
    pub accounts: Arc<dyn BankAccountRepository>,
    /// Balance snapshot persistence for the initial balance row.
    pub ledger: Arc<dyn crate::domain::ports::LedgerRepository>,
}

/// Service implementing [`ConnectionLink`] over the driven ports.
pub struct ConnectionLinkService {
    ports: ConnectionLinkPorts,
}

impl ConnectionLinkService {
    /// Build the service from its port bundle.
    #[must_use]
    pub const fn new(ports: ConnectionLinkPorts) -> Self {
        Self { ports }
    }

    /// Resolve a callback reference to its connection.
    ///
    /// Exact requisition-id match first; a caller-minted
    /// `user-{uuid}-{digits}` reference falls back to the newest `created`
    /// connection for that user.
    async fn resolve_connection(&self, reference: &str) -> Result<Connection, Error> {
        if let Some(connection) = self
            .ports
            .connections
            .find_by_requisition(reference)
            .await
            .map_err(map_connection_repo_error)?
        {
            return Ok(connection);
        }

        if let Some(user_id) = parse_user_reference(reference) {
            if let Some(connection) = self
                .ports
                .connections
                .latest_created_for_user(user_id)
                .await
                .map_err(map_connection_repo_error)?
            {
                return Ok(connection);
            }
        }

        Err(Error::not_found(
            "no connection matches the callback reference",
        ))
    }

    /// Materialize one internal account from an external account id.
    ///
    /// Failures are reported as strings so the caller can log and move on
    /// to the next account.
    async fn materialize_account(
        &self,
        connection: &Connection,
        external_id: &str,
    ) -> Result<LinkedAccountSummary, String> {
        let details = self
            .ports
            .gateway
            .account_details(external_id)
            .await
            .map_err(|err| err.to_string())?;
        let readings = self
            .ports
            .gateway
            .account_balances(external_id)
            .await
            .map_err(|err| err.to_string())?;

        let display_name = derive_display_name(
            details.name.as_deref(),
            details.product.as_deref(),
            details.iban.as_deref(),
            external_id,
        );
        let account_type = details
            .cash_account_type
            .as_deref()
            .map_or(AccountType::Other, AccountType::from_cash_account_type);
        let currency = details
            .currency
            .clone()
            .or_else(|| readings.first().map(|reading| reading.currency.clone()))
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_owned());

        let account = self
            .ports
            .accounts
            .insert(&NewBankAccount {
                user_id: connection.user_id,
                connection_id: Some(connection.id),
                display_name: display_name.clone(),
                bank_name: connection.institution_name.clone(),
                account_type,
                currency: currency.clone(),
                last_four: details.iban.as_deref().and_then(last_four),
                connection_kind: ConnectionKind::Aggregator,
                external_id: Some(external_id.to_owned()),
                manual_balance: None,
            })
            .await
            .map_err(|err| err.to_string())?;

        if let Some(reading) = BalanceReading::preferred(&readings) {
            self.ports
                .ledger
                .upsert_balance(&BalanceSnapshot {
                    account_id: account.id,
                    amount: reading.amount,
                    available_amount: BalanceReading::available_amount(&readings),
                    currency: reading.currency.clone(),
                    balance_date: reading
                        .reference_date
                        .unwrap_or_else(|| Utc::now().date_naive()),
                    source: RecordSource::Aggregator,
                })
                .await
                .map_err(|err| err.to_string())?;
        }

        Ok(LinkedAccountSummary {
            account_id: account.id,
            display_name,
            bank_name: connection.institution_name.clone(),
            account_type,
            currency,
        })
    }
}

#[async_trait::async_trait]
impl ConnectionLink for ConnectionLinkService {
    async fn list_institutions(&self, country: &str) -> Result<Vec<Institution>, Error> {
        self.ports
            .gateway
            .list_institutions(country)
            .await
            .map_err(map_gateway_error)
    }

    async fn initiate(&self, request: InitiateLinkRequest) -> Result<InitiateLinkResponse, Error> {
        let reference = mint_user_reference(request.user_id, Utc::now());
        let session = self
            .ports
            .gateway
            .create_requisition(&RequisitionRequest {
                institution_id: request.institution_id.clone(),
                redirect_url: request.redirect_url,
                user_language: request.user_language,
                reference: Some(reference.clone()),
                agreement_id: None,
            })
            .await
            .map_err(map_gateway_error)?;

        let connection = self
            .ports
            .connections
            .create(&NewConnection {
                user_id: request.user_id,
                institution_id: request.institution_id,
                institution_name: request.institution_name,
                country_code: request.country_code,
                requisition_id: session.id.clone(),
            })
            .await
            .map_err(map_connection_repo_error)?;

        info!(
            connection_id = %connection.id,
            requisition_id = %session.id,
            institution = %connection.institution_name,
            "authorization flow initiated"
        );

        Ok(InitiateLinkResponse {
            connection_id: connection.id,
            requisition_id: session.id,
            authorization_url: session.link,
            reference,
        })
    }

    async fn complete(&self, reference: &str) -> Result<CompleteLinkResponse, Error> {
        let connection = self.resolve_connection(reference).await?;
        let requisition = self
            .ports
            .gateway
            .fetch_requisition(&connection.requisition_id)
            .await
            .map_err(map_gateway_error)?;

        if requisition.status != REQUISITION_LINKED {
            return Err(Error::conflict(format!(
                "requisition {} is not linked yet",
                connection.requisition_id
            ))
            .with_details(json!({ "status": requisition.status })));
        }

        let connection = self
            .ports
            .connections
            .mark_linked(&connection.requisition_id)
            .await
            .map_err(map_connection_repo_error)?
            .unwrap_or(connection);

        let mut accounts = Vec::with_capacity(requisition.accounts.len());
        for external_id in &requisition.accounts {
            match self.materialize_account(&connection, external_id).await {
                Ok(summary) => accounts.push(summary),
                Err(message) => {
                    // One bad external account never blocks the rest.
                    warn!(
                        connection_id = %connection.id,
                        external_id = %external_id,
                        error = %message,
                        "skipping external account during link completion"
                    );
                }
            }
        }

        info!(
            connection_id = %connection.id,
            linked_accounts = accounts.len(),
            "authorization flow completed"
        );

        Ok(CompleteLinkResponse {
            connection_id: connection.id,
            institution_name: connection.institution_name,
            accounts,
        })
    }

    async fn disconnect(&self, user_id: Uuid, requisition_id: &str) -> Result<(), Error> {
        let connection = self
            .ports
            .connections
            .find_by_requisition(requisition_id)
            .await
            .map_err(map_connection_repo_error)?
            .filter(|connection| connection.user_id == user_id)
            .ok_or_else(|| Error::not_found("no connection matches the requisition id"))?;

        match self.ports.gateway.delete_requisition(requisition_id).await {
            Ok(()) => {}
            // Already revoked upstream; proceed with local suspension.
            Err(BankGatewayError::Api { status: 404, .. }) => {
                warn!(requisition_id, "requisition already gone at aggregator");
            }
            Err(err) => return Err(map_gateway_error(err)),
        }

        self.ports
            .connections
            .mark_suspended(user_id, requisition_id)
            .await
            .map_err(map_connection_repo_error)?;

        let deactivated = self
            .ports
            .accounts
            .deactivate_for_connection(connection.id)
            .await
            .map_err(map_account_repo_error)?;

        info!(
            connection_id = %connection.id,
            deactivated,
            "connection suspended"
        );
        Ok(())
    }

    async fn status(&self, requisition_id: &str) -> Result<LinkStatusResponse, Error> {
        let connection = self
            .ports
            .connections
            .find_by_requisition(requisition_id)
            .await
            .map_err(map_connection_repo_error)?
            .ok_or_else(|| Error::not_found("no connection matches the requisition id"))?;

        Ok(LinkStatusResponse {
            connection_id: connection.id,
            institution_name: connection.institution_name,
            status: connection.status,
            last_sync_at: connection.last_sync_at,
            last_sync_error: connection.last_sync_error,
        })
    }
}

#[cfg(test)]
#[path = "link_service_tests.rs"]
mod tests;
