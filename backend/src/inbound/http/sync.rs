//! Sync API handler.
//!
//! ```text
//! POST /api/sync {"userId":"...","accountId":"..."}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::{SyncReport, SyncRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/sync`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequestBody {
    pub user_id: Uuid,
    /// Narrows the pass to a single account when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
}

/// Refresh balances and transactions for a user's linked accounts.
///
/// Per-account failures appear in the report's `errors` list; the
/// endpoint only fails outright when the pass cannot start at all.
#[utoipa::path(
    post,
    path = "/api/sync",
    request_body = SyncRequestBody,
    responses(
        (status = 200, description = "Sync report", body = SyncReport),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["sync"],
    operation_id = "syncAccounts"
)]
#[post("/sync")]
pub async fn sync_accounts(
    state: web::Data<HttpState>,
    payload: web::Json<SyncRequestBody>,
) -> ApiResult<web::Json<SyncReport>> {
    let report = state
        .sync
        .sync(SyncRequest {
            user_id: payload.user_id,
            account_id: payload.account_id,
        })
        .await?;
    Ok(web::Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAccountSync;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;
    use std::sync::Arc;

    fn app_with_sync(
        sync: MockAccountSync,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let state = HttpState {
            sync: Arc::new(sync),
            ..HttpState::default()
        };
        App::new()
            .app_data(web::Data::new(state))
            .service(web::scope("/api").service(sync_accounts))
    }

    #[actix_rt::test]
    async fn report_is_returned_verbatim() {
        let user_id = Uuid::new_v4();
        let mut sync = MockAccountSync::new();
        sync.expect_sync()
            .withf(move |request| request.user_id == user_id && request.account_id.is_none())
            .returning(|_| {
                let mut report = SyncReport {
                    accounts_synced: 2,
                    balances_synced: 2,
                    transactions_synced: 14,
                    ..SyncReport::default()
                };
                report.record_error("Failed to sync Savings: upstream timeout");
                Ok(report.finalize())
            });

        let app = actix_test::init_service(app_with_sync(sync)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/sync")
            .set_json(&SyncRequestBody {
                user_id,
                account_id: None,
            })
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["success"], false);
        assert_eq!(body["accountsSynced"], 2);
        assert_eq!(body["transactionsSynced"], 14);
        assert_eq!(
            body["errors"][0],
            "Failed to sync Savings: upstream timeout"
        );
    }

    #[actix_rt::test]
    async fn targeted_sync_passes_the_account_id_through() {
        let account_id = Uuid::new_v4();
        let mut sync = MockAccountSync::new();
        sync.expect_sync()
            .withf(move |request| request.account_id == Some(account_id))
            .returning(|_| Ok(SyncReport::default().finalize()));

        let app = actix_test::init_service(app_with_sync(sync)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/sync")
            .set_json(&SyncRequestBody {
                user_id: Uuid::new_v4(),
                account_id: Some(account_id),
            })
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["success"], true);
    }

    #[actix_rt::test]
    async fn startup_failure_surfaces_as_service_unavailable() {
        let mut sync = MockAccountSync::new();
        sync.expect_sync()
            .returning(|_| Err(Error::service_unavailable("store unavailable: pool exhausted")));

        let app = actix_test::init_service(app_with_sync(sync)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/sync")
            .set_json(&SyncRequestBody {
                user_id: Uuid::new_v4(),
                account_id: None,
            })
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), 503);
    }
}
