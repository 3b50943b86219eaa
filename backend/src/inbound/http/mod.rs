//! HTTP inbound adapter exposing the REST endpoints under `/api/v1`.

pub mod auth;
pub mod error;
pub mod experiences;
pub mod experiences_dto;
pub mod health;
pub mod locations;
pub mod schemas;
pub mod state;
pub mod tags;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod users;
pub mod validation;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::NormalizePath;
use actix_web::{App, web};

use crate::middleware::Trace;

pub use error::{ApiResult, json_config, path_config, query_config};
use state::HttpState;

/// Register every `/api/v1` handler on a scope or app.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use experiences::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::register)
        .service(users::create_token)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(tags::list_tags)
        .service(tags::create_tag)
        .service(locations::list_locations)
        .service(locations::create_location)
        .service(experiences::list_experiences)
        .service(experiences::create_experience)
        .service(experiences::get_experience)
        .service(experiences::replace_experience)
        .service(experiences::update_experience)
        .service(experiences::delete_experience)
        .service(experiences::upload_image);
}

/// Application with the API mounted under `/api/v1`.
///
/// Trailing slashes are trimmed so `/api/v1/tags/` and `/api/v1/tags` reach
/// the same handler. Callers may register further services on the result.
pub fn api_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(NormalizePath::trim())
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
}
