//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Ownership scoping is expressed in the SQL filters.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: database failures map onto each port's error
//!   enum; unique and foreign key violations become domain errors where the
//!   port defines one.
//!
//! # Example
//!
//! ```ignore
//! use experiences::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/experiences")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_attribute_repository;
mod diesel_basic_error_mapping;
mod diesel_experience_repository;
mod diesel_token_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_attribute_repository::DieselAttributeRepository;
pub use diesel_experience_repository::DieselExperienceRepository;
pub use diesel_token_repository::DieselAuthTokenRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{
    MIGRATIONS, MigrationError, run_pending_migrations, run_pending_migrations_blocking,
};
pub use pool::{DbPool, PoolConfig, PoolError};
