//! Backend entry-point: wires adapters, REST endpoints, and OpenAPI docs.

use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::{configure_api, state::HttpState};
use backend::server::{ServerConfig, build_pool, build_state};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;
    let pool = build_pool(&config).await.map_err(std::io::Error::other)?;
    let state = build_state(&config, pool).map_err(std::io::Error::other)?;

    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness probe stays shared.
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), state.clone());
        #[cfg(feature = "metrics")]
        let app = {
            let prometheus = make_metrics();
            app.wrap(prometheus)
        };
        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    server.run().await
}

fn build_app(
    health_state: web::Data<HealthState>,
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let mut app = App::new()
        .app_data(health_state)
        .app_data(web::Data::new(state))
        .wrap(Trace)
        .configure(configure_api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    {
        app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    PrometheusMetricsBuilder::new("banksync")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
