//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hasher, image store) are implemented by
//! outbound adapters. Driving ports are implemented by the domain services and
//! called by the HTTP layer.

mod macros;
pub(crate) use macros::define_port_error;

mod attribute_catalog;
mod attribute_repository;
mod auth_token_repository;
mod experience_catalog;
mod experience_repository;
mod image_store;
mod password_hasher;
mod user_accounts;
mod user_repository;

pub use attribute_catalog::AttributeCatalog;
pub use attribute_repository::{AttributeRepositoryError, OwnedAttributeRepository};
#[cfg(test)]
pub use auth_token_repository::MockAuthTokenRepository;
pub use auth_token_repository::{AuthTokenRepository, AuthTokenRepositoryError};
pub use experience_catalog::ExperienceCatalog;
#[cfg(test)]
pub use experience_repository::MockExperienceRepository;
pub use experience_repository::{ExperienceRepository, ExperienceRepositoryError};
#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{ImageStore, ImageStoreError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
pub use user_accounts::{ProfileUpdate, RegisterUserRequest, UserAccounts};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserRepository, UserRepositoryError};
