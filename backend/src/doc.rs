//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API:
//! connection lifecycle endpoints, the sync endpoint, and health probes.
//! The generated document feeds Swagger UI in debug builds.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode};
use crate::domain::ports::SyncReport;
use crate::inbound::http::connections::{
    ConnectionStatusResponse, DisconnectRequest, InitiateConnectionRequest,
    InitiateConnectionResponse, InstitutionResponse,
};
use crate::inbound::http::sync::SyncRequestBody;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bank sync backend API",
        description = "HTTP interface for bank connection lifecycle management and account synchronization."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::connections::list_institutions,
        crate::inbound::http::connections::initiate_connection,
        crate::inbound::http::connections::connection_callback,
        crate::inbound::http::connections::connection_status,
        crate::inbound::http::connections::disconnect_connection,
        crate::inbound::http::sync::sync_accounts,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        InstitutionResponse,
        InitiateConnectionRequest,
        InitiateConnectionResponse,
        ConnectionStatusResponse,
        DisconnectRequest,
        SyncRequestBody,
        SyncReport,
    )),
    tags(
        (name = "connections", description = "Bank connection lifecycle"),
        (name = "sync", description = "Balance and transaction refresh"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document structure.

    use super::*;

    #[test]
    fn every_api_path_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/institutions",
            "/api/connections",
            "/api/connections/callback",
            "/api/connections/{requisition_id}",
            "/api/connections/{requisition_id}/disconnect",
            "/api/sync",
            "/health/ready",
            "/health/live",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing documented path '{path}'"
            );
        }
    }

    #[test]
    fn error_schema_registers_its_fields() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.schemas.contains_key("Error"));
        assert!(components.schemas.contains_key("SyncReport"));
    }
}
