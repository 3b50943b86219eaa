//! Experience API handlers.
//!
//! ```text
//! GET /api/v1/experiences?tags=1,2&locations=3
//! POST /api/v1/experiences {"title":"Workshop","time_minutes":45,"price":"20.00","location":1}
//! GET|PUT|PATCH|DELETE /api/v1/experiences/{id}
//! POST /api/v1/experiences/{id}/upload-image (multipart field `image`)
//! ```
//!
//! Every handler is scoped to the authenticated owner; ids belonging to other
//! accounts answer 404.

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use futures_util::TryStreamExt as _;
use tracing::debug;

use crate::domain::{Error, ExperienceId, ImageUpload};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::experiences_dto::{
    ExperienceDetailResponse, ExperienceImageResponse, ExperienceListQuery, ExperienceRequest,
    ExperienceResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ErrorCode, FieldName, field_error, map_image_validation, missing_field_error,
};

const IMAGE: FieldName = FieldName::new("image");

/// List the caller's experiences, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/experiences",
    params(ExperienceListQuery),
    responses(
        (status = 200, description = "Experiences owned by the caller", body = [ExperienceResponse]),
        (status = 400, description = "Malformed filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "listExperiences"
)]
#[get("/experiences")]
pub async fn list_experiences(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<ExperienceListQuery>,
) -> ApiResult<web::Json<Vec<ExperienceResponse>>> {
    let filter = query.to_filter()?;
    let experiences = state.experiences.list(auth.id(), filter).await?;
    Ok(web::Json(
        experiences.iter().map(ExperienceResponse::from).collect(),
    ))
}

/// Create an experience owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/experiences",
    request_body = ExperienceRequest,
    responses(
        (status = 201, description = "Experience created", body = ExperienceResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "createExperience"
)]
#[post("/experiences")]
pub async fn create_experience(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<ExperienceRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.parse_full()?;
    let experience = state.experiences.create(auth.id(), draft).await?;
    Ok(HttpResponse::Created().json(ExperienceResponse::from(&experience)))
}

/// Fetch one experience with nested location and tags.
#[utoipa::path(
    get,
    path = "/api/v1/experiences/{id}",
    params(("id" = i64, Path, description = "Experience identifier")),
    responses(
        (status = 200, description = "Experience detail", body = ExperienceDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "getExperience"
)]
#[get("/experiences/{id}")]
pub async fn get_experience(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ExperienceDetailResponse>> {
    let id = ExperienceId::new(path.into_inner());
    let experience = state.experiences.retrieve(auth.id(), id).await?;
    Ok(web::Json(ExperienceDetailResponse::new(
        &experience,
        &state.media_url,
    )))
}

/// Replace an experience. Omitted tags and website are cleared.
#[utoipa::path(
    put,
    path = "/api/v1/experiences/{id}",
    params(("id" = i64, Path, description = "Experience identifier")),
    request_body = ExperienceRequest,
    responses(
        (status = 200, description = "Experience replaced", body = ExperienceResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "replaceExperience"
)]
#[put("/experiences/{id}")]
pub async fn replace_experience(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<ExperienceRequest>,
) -> ApiResult<web::Json<ExperienceResponse>> {
    let id = ExperienceId::new(path.into_inner());
    let draft = payload.parse_full()?;
    let experience = state.experiences.update(auth.id(), id, draft).await?;
    Ok(web::Json(ExperienceResponse::from(&experience)))
}

/// Change only the supplied fields of an experience.
#[utoipa::path(
    patch,
    path = "/api/v1/experiences/{id}",
    params(("id" = i64, Path, description = "Experience identifier")),
    request_body = ExperienceRequest,
    responses(
        (status = 200, description = "Experience updated", body = ExperienceResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "updateExperience"
)]
#[patch("/experiences/{id}")]
pub async fn update_experience(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<ExperienceRequest>,
) -> ApiResult<web::Json<ExperienceResponse>> {
    let id = ExperienceId::new(path.into_inner());
    let patch = payload.parse_partial()?;
    let experience = state
        .experiences
        .partial_update(auth.id(), id, patch)
        .await?;
    Ok(web::Json(ExperienceResponse::from(&experience)))
}

/// Delete an experience.
#[utoipa::path(
    delete,
    path = "/api/v1/experiences/{id}",
    params(("id" = i64, Path, description = "Experience identifier")),
    responses(
        (status = 204, description = "Experience deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "deleteExperience"
)]
#[delete("/experiences/{id}")]
pub async fn delete_experience(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = ExperienceId::new(path.into_inner());
    state.experiences.destroy(auth.id(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Multipart form accepted by the upload action, for documentation only.
#[derive(utoipa::ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ImageUploadForm {
    /// Image file; any format the server can decode.
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

/// Attach an image to an experience.
#[utoipa::path(
    post,
    path = "/api/v1/experiences/{id}/upload-image",
    params(("id" = i64, Path, description = "Experience identifier")),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = ExperienceImageResponse),
        (status = 400, description = "Invalid image", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["experiences"],
    operation_id = "uploadExperienceImage"
)]
#[post("/experiences/{id}/upload-image")]
pub async fn upload_image(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: Multipart,
) -> ApiResult<web::Json<ExperienceImageResponse>> {
    let id = ExperienceId::new(path.into_inner());
    let (file_name, bytes) = read_image_field(payload, state.upload_limit_bytes).await?;
    let upload = web::block(move || ImageUpload::validate(file_name.as_deref(), bytes))
        .await
        .map_err(|err| Error::internal(format!("image validation task failed: {err}")))?
        .map_err(map_image_validation)?;
    let experience = state.experiences.upload_image(auth.id(), id, upload).await?;
    Ok(web::Json(ExperienceImageResponse::new(
        &experience,
        &state.media_url,
    )))
}

fn multipart_error(err: MultipartError) -> Error {
    debug!(error = %err, "multipart body rejected");
    Error::invalid_request(format!("malformed multipart body: {err}"))
        .with_details(serde_json::json!({ "code": "parse_error" }))
}

/// Read the `image` part, skipping any other parts.
async fn read_image_field(
    mut payload: Multipart,
    limit: usize,
) -> ApiResult<(Option<String>, Vec<u8>)> {
    while let Some(field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() == Some(IMAGE.as_str()) {
            let file_name = field
                .content_disposition()
                .and_then(|disposition| disposition.get_filename())
                .map(str::to_owned);
            let bytes = collect_limited(field, limit).await?;
            return Ok((file_name, bytes));
        }
        drain(field).await?;
    }
    Err(missing_field_error(IMAGE))
}

async fn collect_limited(mut field: Field, limit: usize) -> ApiResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(field_error(
                IMAGE,
                ErrorCode::MaxSize,
                format!("the submitted file exceeds {limit} bytes"),
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn drain(mut field: Field) -> ApiResult<()> {
    while field.try_next().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

#[cfg(test)]
#[path = "experiences_tests.rs"]
mod tests;
