//! Connection lifecycle API handlers.
//!
//! ```text
//! GET  /api/institutions?country=GB
//! POST /api/connections {"userId":"...","institutionId":"..."}
//! GET  /api/connections/callback?ref=...
//! GET  /api/connections/{requisition_id}
//! POST /api/connections/{requisition_id}/disconnect {"userId":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::InitiateLinkRequest;
use crate::domain::{Error, ErrorCode, Institution};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// One institution available for linking.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_total_days: Option<u32>,
}

impl From<Institution> for InstitutionResponse {
    fn from(value: Institution) -> Self {
        Self {
            id: value.id,
            name: value.name,
            bic: value.bic,
            logo: value.logo,
            transaction_total_days: value.transaction_total_days,
        }
    }
}

/// Request body for `POST /api/connections`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiateConnectionRequest {
    pub user_id: Uuid,
    pub institution_id: String,
    pub institution_name: String,
    pub country_code: String,
    /// Overrides the configured callback URL when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_language: Option<String>,
}

/// Response body for `POST /api/connections`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiateConnectionResponse {
    pub connection_id: Uuid,
    pub requisition_id: String,
    /// End-user authorization URL to open in the browser.
    pub authorization_url: String,
    pub reference: String,
}

/// Request body for `POST /api/connections/{requisition_id}/disconnect`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    pub user_id: Uuid,
}

/// Response body for `GET /api/connections/{requisition_id}`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    pub connection_id: Uuid,
    pub institution_name: String,
    /// Lifecycle state label, e.g. `created`, `linked`, `suspended`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstitutionsQuery {
    country: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "ref")]
    reference: Option<String>,
    /// Error code forwarded by the aggregator when authorization failed.
    error: Option<String>,
}

/// List institutions available for linking in a country.
#[utoipa::path(
    get,
    path = "/api/institutions",
    params(("country" = String, Query, description = "Two-letter country code")),
    responses(
        (status = 200, description = "Institutions", body = [InstitutionResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Aggregator unavailable", body = Error)
    ),
    tags = ["connections"],
    operation_id = "listInstitutions"
)]
#[get("/institutions")]
pub async fn list_institutions(
    state: web::Data<HttpState>,
    query: web::Query<InstitutionsQuery>,
) -> ApiResult<web::Json<Vec<InstitutionResponse>>> {
    let institutions = state.link.list_institutions(&query.country).await?;
    Ok(web::Json(
        institutions.into_iter().map(InstitutionResponse::from).collect(),
    ))
}

/// Start an authorization flow with an institution.
#[utoipa::path(
    post,
    path = "/api/connections",
    request_body = InitiateConnectionRequest,
    responses(
        (status = 200, description = "Authorization flow started", body = InitiateConnectionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Aggregator unavailable", body = Error)
    ),
    tags = ["connections"],
    operation_id = "initiateConnection"
)]
#[post("/connections")]
pub async fn initiate_connection(
    state: web::Data<HttpState>,
    payload: web::Json<InitiateConnectionRequest>,
) -> ApiResult<web::Json<InitiateConnectionResponse>> {
    let payload = payload.into_inner();
    let redirect_url = payload
        .redirect_url
        .unwrap_or_else(|| state.callback_url.clone());
    let response = state
        .link
        .initiate(InitiateLinkRequest {
            user_id: payload.user_id,
            institution_id: payload.institution_id,
            institution_name: payload.institution_name,
            country_code: payload.country_code,
            redirect_url,
            user_language: payload.user_language,
        })
        .await?;
    Ok(web::Json(InitiateConnectionResponse {
        connection_id: response.connection_id,
        requisition_id: response.requisition_id,
        authorization_url: response.authorization_url,
        reference: response.reference,
    }))
}

/// Browser landing page after bank authorization.
///
/// The aggregator redirects the user here with a `ref` query parameter.
/// The page is meant for a popup window, so every outcome renders a
/// small self-closing HTML page rather than JSON.
#[utoipa::path(
    get,
    path = "/api/connections/callback",
    params(
        ("ref" = Option<String>, Query, description = "Requisition id or minted reference"),
        ("error" = Option<String>, Query, description = "Aggregator error code, when authorization failed")
    ),
    responses(
        (status = 200, description = "HTML landing page", content_type = "text/html")
    ),
    tags = ["connections"],
    operation_id = "connectionCallback"
)]
#[get("/connections/callback")]
pub async fn connection_callback(
    state: web::Data<HttpState>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let query = query.into_inner();
    if let Some(code) = query.error.filter(|e| !e.is_empty()) {
        warn!(code = %code, "aggregator reported an authorization error");
        return callback_page(
            "Connection failed",
            "The bank reported an authorization error. You can close this window and try again.",
        );
    }

    let Some(reference) = query.reference.filter(|r| !r.is_empty()) else {
        return callback_page(
            "Connection failed",
            "The bank did not return a reference. You can close this window and try again.",
        );
    };

    match state.link.complete(&reference).await {
        Ok(response) => {
            let names: Vec<String> = response
                .accounts
                .iter()
                .map(|account| format!("{} ({})", account.display_name, account.bank_name))
                .collect();
            let message = if names.is_empty() {
                format!(
                    "Connected to {}. This window will close automatically.",
                    response.institution_name
                )
            } else {
                format!(
                    "Linked {}. This window will close automatically.",
                    names.join(", ")
                )
            };
            callback_page("Bank connected", &message)
        }
        // The aggregator may redirect before the requisition settles.
        Err(error) if error.code == ErrorCode::Conflict => callback_page(
            "Almost there",
            "Your bank is still confirming the authorization. You can close this window; the connection will finish shortly.",
        ),
        Err(error) => {
            warn!(reference = %reference, error = %error, "link completion failed");
            callback_page(
                "Connection failed",
                "We could not complete the bank connection. You can close this window and try again.",
            )
        }
    }
}

fn callback_page(title: &str, message: &str) -> HttpResponse {
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<p>{message}</p>\n<script>setTimeout(function() {{ window.close(); }}, 3000);</script>\n</body>\n</html>\n"
    );
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Poll the lifecycle state of a connection.
#[utoipa::path(
    get,
    path = "/api/connections/{requisition_id}",
    params(("requisition_id" = String, Path, description = "Aggregator requisition id")),
    responses(
        (status = 200, description = "Connection state", body = ConnectionStatusResponse),
        (status = 404, description = "Unknown connection", body = Error)
    ),
    tags = ["connections"],
    operation_id = "connectionStatus"
)]
#[get("/connections/{requisition_id}")]
pub async fn connection_status(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ConnectionStatusResponse>> {
    let status = state.link.status(&path.into_inner()).await?;
    Ok(web::Json(ConnectionStatusResponse {
        connection_id: status.connection_id,
        institution_name: status.institution_name,
        status: status.status.to_string(),
        last_sync_at: status.last_sync_at,
        last_sync_error: status.last_sync_error,
    }))
}

/// Revoke a connection and deactivate its accounts.
#[utoipa::path(
    post,
    path = "/api/connections/{requisition_id}/disconnect",
    params(("requisition_id" = String, Path, description = "Aggregator requisition id")),
    request_body = DisconnectRequest,
    responses(
        (status = 204, description = "Connection suspended"),
        (status = 404, description = "Unknown connection or wrong user", body = Error),
        (status = 503, description = "Aggregator unavailable", body = Error)
    ),
    tags = ["connections"],
    operation_id = "disconnectConnection"
)]
#[post("/connections/{requisition_id}/disconnect")]
pub async fn disconnect_connection(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<DisconnectRequest>,
) -> ApiResult<HttpResponse> {
    state
        .link
        .disconnect(payload.user_id, &path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
