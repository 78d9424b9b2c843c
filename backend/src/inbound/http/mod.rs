//! HTTP inbound adapter exposing REST endpoints.

pub mod connections;
pub mod error;
pub mod health;
pub mod state;
pub mod sync;

pub use error::ApiResult;

use actix_web::web;

/// Register every API route under `/api`.
pub fn configure_api(config: &mut web::ServiceConfig) {
    config.service(
        web::scope("/api")
            .service(connections::list_institutions)
            .service(connections::initiate_connection)
            .service(connections::connection_callback)
            .service(connections::connection_status)
            .service(connections::disconnect_connection)
            .service(sync::sync_accounts),
    );
}
