//! Account API handlers.
//!
//! ```text
//! POST /api/v1/users {"email":"ada@example.com","password":"secret","name":"Ada"}
//! POST /api/v1/users/token {"email":"ada@example.com","password":"secret"}
//! GET /api/v1/users/me
//! PATCH /api/v1/users/me {"name":"Ada L."}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{ProfileUpdate, RegisterUserRequest};
use crate::domain::{Email, LoginCredentials, Password, User, UserName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_credential_validation, map_user_validation, require,
};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const NAME: FieldName = FieldName::new("name");

/// Registration payload for `POST /api/v1/users`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "correct horse")]
    pub password: Option<String>,
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
}

/// Credentials for `POST /api/v1/users/token`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update for `PATCH /api/v1/users/me`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ProfilePatchRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public view of an account. The password is never echoed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email().as_ref().to_owned(),
            name: user.name().as_ref().to_owned(),
        }
    }
}

/// A freshly issued API token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b")]
    pub token: String,
}

fn parse_password(raw: &str) -> ApiResult<Password> {
    Password::new(raw).map_err(map_credential_validation)
}

fn parse_name(raw: Option<&str>) -> ApiResult<UserName> {
    UserName::new(raw.unwrap_or_default()).map_err(|err| map_user_validation(err, NAME))
}

fn parse_registration(payload: RegisterRequest) -> ApiResult<RegisterUserRequest> {
    let email = Email::parse_required(payload.email.as_deref())
        .map_err(|err| map_user_validation(err, NAME))?;
    let password = parse_password(&require(payload.password, PASSWORD)?)?;
    let name = parse_name(payload.name.as_deref())?;
    Ok(RegisterUserRequest {
        email,
        password,
        name,
    })
}

fn parse_profile_update(payload: ProfilePatchRequest) -> ApiResult<ProfileUpdate> {
    let email = payload
        .email
        .as_deref()
        .map(|raw| Email::parse(raw).map_err(|err| map_user_validation(err, NAME)))
        .transpose()?;
    let name = payload
        .name
        .as_deref()
        .map(|raw| parse_name(Some(raw)))
        .transpose()?;
    let password = payload.password.as_deref().map(parse_password).transpose()?;
    Ok(ProfileUpdate {
        email,
        name,
        password,
    })
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "registerUser",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = parse_registration(payload.into_inner())?;
    let user = state.users.register(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Exchange credentials for an API token.
///
/// Issuing a token replaces any token previously held by the account.
#[utoipa::path(
    post,
    path = "/api/v1/users/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createToken",
    security([])
)]
#[post("/users/token")]
pub async fn create_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let TokenRequest { email, password } = payload.into_inner();
    let email = require(email, EMAIL)?;
    let password = require(password, PASSWORD)?;
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_credential_validation)?;
    let token = state.users.issue_token(&credentials).await?;
    Ok(web::Json(TokenResponse {
        token: token.expose().to_owned(),
    }))
}

/// Fetch the authenticated account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.users.profile(auth.id()).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Update the authenticated account. Supplied passwords are re-hashed.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfilePatchRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<ProfilePatchRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let update = parse_profile_update(payload.into_inner())?;
    let user = state.users.update_profile(auth.id(), update).await?;
    Ok(web::Json(UserResponse::from(&user)))
}
