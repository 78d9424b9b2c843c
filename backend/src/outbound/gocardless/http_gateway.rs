//! Reqwest-backed GoCardless Bank Account Data gateway adapter.
//!
//! This adapter owns transport details only: bearer token acquisition and
//! caching, request serialisation, HTTP error mapping, and JSON decoding
//! into the domain gateway types.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use super::dto::{
    AccountDetailsEnvelopeDto, BalancesEnvelopeDto, InstitutionDto, RequisitionDto,
    RequisitionRequestDto, TokenPairDto, TokenRequestDto, TransactionsEnvelopeDto,
};
use crate::domain::ports::{
    BalanceReading, BankDataGateway, BankGatewayError, BookedTransaction, ExternalAccountDetails,
    Institution, Requisition, RequisitionRequest, RequisitionSession,
};

/// Production GoCardless Bank Account Data endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://bankaccountdata.gocardless.com/api/v2/";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens are refreshed this many seconds before their reported expiry so
/// an in-flight request never carries a token that lapses mid-request.
const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Secret pair issued in the GoCardless dashboard.
#[derive(Clone, PartialEq, Eq)]
pub struct GoCardlessCredentials {
    pub secret_id: String,
    pub secret_key: String,
}

impl std::fmt::Debug for GoCardlessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoCardlessCredentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

struct CachedToken {
    access: String,
    expires_at: DateTime<Utc>,
}

/// Gateway adapter performing HTTP requests against one GoCardless endpoint.
pub struct GoCardlessHttpGateway {
    client: Client,
    base_url: Url,
    credentials: GoCardlessCredentials,
    /// Held across the whole token exchange so concurrent callers wait for
    /// one refresh instead of issuing duplicates.
    token: Mutex<Option<CachedToken>>,
}

impl GoCardlessHttpGateway {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        credentials: GoCardlessCredentials,
    ) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, credentials, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build an adapter using a reqwest client with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        base_url: Url,
        credentials: GoCardlessCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            credentials,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> Result<Url, BankGatewayError> {
        self.base_url
            .join(path)
            .map_err(|error| BankGatewayError::transport(format!("invalid endpoint path: {error}")))
    }

    /// Return a valid access token, exchanging the secret pair when the
    /// cached token is absent or about to expire.
    async fn access_token(&self) -> Result<String, BankGatewayError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.access.clone());
            }
        }

        debug!("exchanging aggregator secret pair for an access token");
        let response = self
            .client
            .post(self.url("token/new/")?)
            .json(&TokenRequestDto {
                secret_id: &self.credentials.secret_id,
                secret_key: &self.credentials.secret_key,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(BankGatewayError::authentication_failed(body_preview(
                body.as_ref(),
            )));
        }
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let pair: TokenPairDto = serde_json::from_slice(body.as_ref()).map_err(|error| {
            BankGatewayError::decode(format!("invalid token payload: {error}"))
        })?;
        let lifetime = (pair.access_expires - TOKEN_EXPIRY_MARGIN_SECONDS).max(0);
        let access = pair.access.clone();
        *slot = Some(CachedToken {
            access: pair.access,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        });
        Ok(access)
    }

    async fn drop_cached_token(&self) {
        self.token.lock().await.take();
    }

    async fn send_authorized(
        &self,
        build: impl Fn(&Client, &str) -> reqwest::RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), BankGatewayError> {
        let token = self.access_token().await?;
        let response = build(&self.client, &token)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status == StatusCode::UNAUTHORIZED {
            // Stale token; the next call performs a fresh exchange.
            self.drop_cached_token().await;
        }
        Ok((status, body.to_vec()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BankGatewayError> {
        let url = self.url(path)?;
        let (status, body) = self
            .send_authorized(|client, token| {
                client.get(url.clone()).query(query).bearer_auth(token)
            })
            .await?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref())
            .map_err(|error| BankGatewayError::decode(format!("invalid JSON payload: {error}")))
    }
}

#[async_trait]
impl BankDataGateway for GoCardlessHttpGateway {
    async fn list_institutions(
        &self,
        country: &str,
    ) -> Result<Vec<Institution>, BankGatewayError> {
        let institutions: Vec<InstitutionDto> = self
            .get_json("institutions/", &[("country", country)])
            .await?;
        Ok(institutions
            .into_iter()
            .map(InstitutionDto::into_domain)
            .collect())
    }

    async fn create_requisition(
        &self,
        request: &RequisitionRequest,
    ) -> Result<RequisitionSession, BankGatewayError> {
        let url = self.url("requisitions/")?;
        let payload = RequisitionRequestDto {
            institution_id: &request.institution_id,
            redirect: &request.redirect_url,
            reference: request.reference.as_deref(),
            user_language: request.user_language.as_deref(),
            agreement: request.agreement_id.as_deref(),
        };
        let (status, body) = self
            .send_authorized(|client, token| {
                client.post(url.clone()).bearer_auth(token).json(&payload)
            })
            .await?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let requisition: RequisitionDto =
            serde_json::from_slice(body.as_ref()).map_err(|error| {
                BankGatewayError::decode(format!("invalid requisition payload: {error}"))
            })?;
        requisition.into_session().map_err(BankGatewayError::decode)
    }

    async fn fetch_requisition(
        &self,
        requisition_id: &str,
    ) -> Result<Requisition, BankGatewayError> {
        let requisition: RequisitionDto = self
            .get_json(&format!("requisitions/{requisition_id}/"), &[])
            .await?;
        Ok(requisition.into_domain())
    }

    async fn delete_requisition(&self, requisition_id: &str) -> Result<(), BankGatewayError> {
        let url = self.url(&format!("requisitions/{requisition_id}/"))?;
        let (status, body) = self
            .send_authorized(|client, token| client.delete(url.clone()).bearer_auth(token))
            .await?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(())
    }

    async fn account_details(
        &self,
        external_id: &str,
    ) -> Result<ExternalAccountDetails, BankGatewayError> {
        let envelope: AccountDetailsEnvelopeDto = self
            .get_json(&format!("accounts/{external_id}/details/"), &[])
            .await?;
        Ok(envelope.account.into_domain())
    }

    async fn account_balances(
        &self,
        external_id: &str,
    ) -> Result<Vec<BalanceReading>, BankGatewayError> {
        let envelope: BalancesEnvelopeDto = self
            .get_json(&format!("accounts/{external_id}/balances/"), &[])
            .await?;
        envelope
            .balances
            .into_iter()
            .map(|balance| balance.into_domain().map_err(BankGatewayError::decode))
            .collect()
    }

    async fn account_transactions(
        &self,
        external_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<BookedTransaction>, BankGatewayError> {
        let date_from = date_from.to_string();
        let date_to = date_to.to_string();
        let envelope: TransactionsEnvelopeDto = self
            .get_json(
                &format!("accounts/{external_id}/transactions/"),
                &[("date_from", date_from.as_str()), ("date_to", date_to.as_str())],
            )
            .await?;

        let mut booked = Vec::with_capacity(envelope.transactions.booked.len());
        for transaction in envelope.transactions.booked {
            match transaction.into_domain() {
                Ok(Some(mapped)) => booked.push(mapped),
                // Entries without a stable id cannot be upserted; drop them.
                Ok(None) => debug!(external_id, "dropping unkeyed transaction"),
                Err(message) => return Err(BankGatewayError::decode(message)),
            }
        }
        Ok(booked)
    }
}

fn map_transport_error(error: reqwest::Error) -> BankGatewayError {
    BankGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> BankGatewayError {
    let preview = body_preview(body);
    if status == StatusCode::UNAUTHORIZED {
        return BankGatewayError::authentication_failed(preview);
    }
    BankGatewayError::api(status.as_u16(), preview)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;

    #[test]
    fn unauthorized_maps_to_authentication_failure() {
        let error = map_status_error(StatusCode::UNAUTHORIZED, b"{\"detail\":\"bad token\"}");
        assert!(matches!(
            error,
            BankGatewayError::AuthenticationFailed { .. }
        ));
    }

    #[test]
    fn other_statuses_map_to_api_errors() {
        let error = map_status_error(StatusCode::NOT_FOUND, b"gone");
        assert!(matches!(error, BankGatewayError::Api { status: 404, .. }));
    }

    #[test]
    fn body_preview_compacts_and_truncates() {
        assert_eq!(body_preview(b"  spread \n over\tlines "), "spread over lines");
        let long = "x".repeat(500);
        let preview = body_preview(long.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[test]
    fn body_preview_of_empty_body_is_empty() {
        assert!(body_preview(b"").is_empty());
    }
}
