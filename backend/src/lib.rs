//! Experiences backend library modules.
//!
//! Hexagonal layout: [`domain`] holds entities, ports and services;
//! [`inbound`] exposes them over HTTP; [`outbound`] implements the driven
//! ports with Diesel, Argon2 and a capability-scoped media directory.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
