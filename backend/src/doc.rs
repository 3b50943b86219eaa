//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every handler annotated with `#[utoipa::path]`, the
//! error envelope schemas and the token security scheme. Swagger UI serves it
//! in debug builds and `cargo run --bin openapi-dump` prints it.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the token security scheme.
pub const TOKEN_SCHEME: &str = "TokenAuth";

/// Register the `Authorization: Token <key>` scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            TOKEN_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` where the key comes from POST /api/v1/users/token.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Experiences API",
        description = "Record experiences with their tags and locations, scoped to the authenticated user."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("TokenAuth" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::create_token,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::tags::list_tags,
        crate::inbound::http::tags::create_tag,
        crate::inbound::http::locations::list_locations,
        crate::inbound::http::locations::create_location,
        crate::inbound::http::experiences::list_experiences,
        crate::inbound::http::experiences::create_experience,
        crate::inbound::http::experiences::get_experience,
        crate::inbound::http::experiences::replace_experience,
        crate::inbound::http::experiences::update_experience,
        crate::inbound::http::experiences::delete_experience,
        crate::inbound::http::experiences::upload_image,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "users", description = "Account registration, tokens and profile"),
        (name = "tags", description = "Tags owned by the caller"),
        (name = "locations", description = "Locations owned by the caller"),
        (name = "experiences", description = "Experiences owned by the caller"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
