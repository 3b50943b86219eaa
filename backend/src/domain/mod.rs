//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities for accounts, tags, locations and
//! experiences, the ports that adapters implement, and the services behind
//! the driving ports. Nothing in here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic error payload.
//! - User, Email, Password, AuthToken: accounts and authentication.
//! - Tag, Location, OwnedAttribute: user-owned lookup attributes.
//! - Experience and its value types, drafts, patches and filters.
//! - Services implementing the driving ports in [`ports`].

pub mod attribute_catalog_service;
pub mod attributes;
pub mod auth;
pub mod error;
pub mod experience;
pub mod experience_catalog_service;
pub mod image_upload;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_account_service;

pub use self::attribute_catalog_service::AttributeCatalogService;
pub use self::attributes::{
    ATTRIBUTE_TEXT_MAX, AttributeName, AttributeValidationError, Location, LocationDescription,
    LocationDraft, LocationId, OwnedAttribute, Tag, TagDraft, TagId,
};
pub use self::auth::{
    AuthToken, CredentialValidationError, LoginCredentials, PASSWORD_MIN, Password, TokenDigest,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::experience::{
    Experience, ExperienceDraft, ExperienceFields, ExperienceFilter, ExperienceId,
    ExperiencePatch, ExperienceValidationError, IMAGE_UPLOAD_DIR, ImagePath, Price, TimeMinutes,
    Title, Website,
};
pub use self::experience_catalog_service::ExperienceCatalogService;
pub use self::image_upload::{ImageUpload, ImageValidationError};
pub use self::trace_id::TraceId;
pub use self::user::{
    Email, NewUser, User, UserChanges, UserFlags, UserId, UserName, UserValidationError,
};
pub use self::user_account_service::UserAccountService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use experiences::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
