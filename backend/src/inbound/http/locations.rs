//! Location API handlers.
//!
//! ```text
//! GET /api/v1/locations
//! POST /api/v1/locations {"name":"Harbour","description":"North pier"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AttributeName, Location, LocationDescription, LocationDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, map_attribute_validation, require};

/// Request payload for `POST /api/v1/locations`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct LocationRequest {
    #[schema(example = "Harbour")]
    pub name: Option<String>,
    /// Free text; empty when omitted.
    pub description: Option<String>,
}

impl LocationRequest {
    fn into_draft(self) -> ApiResult<LocationDraft> {
        let raw = require(self.name, FieldName::new("name"))?;
        let name = AttributeName::new(&raw).map_err(map_attribute_validation)?;
        let description = LocationDescription::new(self.description.as_deref())
            .map_err(map_attribute_validation)?;
        Ok(LocationDraft { name, description })
    }
}

/// Wire representation of a location.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub id: i64,
    #[schema(example = "Harbour")]
    pub name: String,
    pub description: String,
}

impl From<&Location> for LocationResponse {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id().get(),
            name: location.name().as_ref().to_owned(),
            description: location.description().as_ref().to_owned(),
        }
    }
}

/// List the caller's locations.
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses(
        (status = 200, description = "Locations owned by the caller", body = [LocationResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "listLocations"
)]
#[get("/locations")]
pub async fn list_locations(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<LocationResponse>>> {
    let locations = state.locations.list(auth.id()).await?;
    Ok(web::Json(
        locations.iter().map(LocationResponse::from).collect(),
    ))
}

/// Create a location owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = LocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["locations"],
    operation_id = "createLocation"
)]
#[post("/locations")]
pub async fn create_location(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<LocationRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner().into_draft()?;
    let location = state.locations.create(auth.id(), draft).await?;
    Ok(HttpResponse::Created().json(LocationResponse::from(&location)))
}
