//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerSettings;
pub use state_builders::build_user_accounts;

use state_builders::build_http_state;

use std::net::SocketAddr;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use experiences::doc::ApiDoc;
use experiences::inbound::http::api_app;
use experiences::inbound::http::health::{HealthState, live, ready};
use experiences::inbound::http::state::HttpState;
use experiences::outbound::persistence::DbPool;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Everything the server needs once settings have been resolved.
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub pool: DbPool,
    pub settings: ServerSettings,
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = api_app(http_state)
        .app_data(health_state)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server serving the REST API and health probes.
///
/// # Errors
/// Propagates [`std::io::Error`] when the media root cannot be opened or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        pool,
        settings,
    } = config;
    let http_state = web::Data::new(build_http_state(&pool, &settings)?);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
