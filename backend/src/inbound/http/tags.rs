//! Tag API handlers.
//!
//! ```text
//! GET /api/v1/tags
//! POST /api/v1/tags {"name":"Outdoors"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AttributeName, Tag, TagDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, map_attribute_validation, require};

/// Request payload for `POST /api/v1/tags`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct TagRequest {
    #[schema(example = "Outdoors")]
    pub name: Option<String>,
}

/// Wire representation of a tag.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    #[schema(example = "Outdoors")]
    pub name: String,
}

impl From<&Tag> for TagResponse {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id().get(),
            name: tag.name().as_ref().to_owned(),
        }
    }
}

/// List the caller's tags, newest name first.
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    responses(
        (status = 200, description = "Tags owned by the caller", body = [TagResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["tags"],
    operation_id = "listTags"
)]
#[get("/tags")]
pub async fn list_tags(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<Vec<TagResponse>>> {
    let tags = state.tags.list(auth.id()).await?;
    Ok(web::Json(tags.iter().map(TagResponse::from).collect()))
}

/// Create a tag owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/tags",
    request_body = TagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["tags"],
    operation_id = "createTag"
)]
#[post("/tags")]
pub async fn create_tag(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<TagRequest>,
) -> ApiResult<HttpResponse> {
    let raw = require(payload.into_inner().name, FieldName::new("name"))?;
    let name = AttributeName::new(&raw).map_err(map_attribute_validation)?;
    let tag = state.tags.create(auth.id(), TagDraft { name }).await?;
    Ok(HttpResponse::Created().json(TagResponse::from(&tag)))
}
