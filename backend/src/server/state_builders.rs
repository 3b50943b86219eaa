//! Builders wiring the Diesel, Argon2 and media adapters into HTTP state.

use std::io;
use std::sync::Arc;

use experiences::domain::{
    AttributeCatalogService, ExperienceCatalogService, Location, Tag, UserAccountService,
};
use experiences::inbound::http::state::{HttpState, HttpStatePorts};
use experiences::outbound::media::CapStdImageStore;
use experiences::outbound::persistence::{
    DbPool, DieselAttributeRepository, DieselAuthTokenRepository, DieselExperienceRepository,
    DieselUserRepository,
};
use experiences::outbound::security::Argon2PasswordHasher;

use super::ServerSettings;

/// Account service backed by PostgreSQL and Argon2.
pub type DieselUserAccounts =
    UserAccountService<DieselUserRepository, DieselAuthTokenRepository, Argon2PasswordHasher>;

/// Build the account service used by the HTTP API and the admin command.
pub fn build_user_accounts(pool: &DbPool) -> DieselUserAccounts {
    UserAccountService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselAuthTokenRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::new()),
    )
}

/// Build the ports bundle over `pool`, storing uploads under the media root.
///
/// # Errors
/// Returns [`io::Error`] when the media directory cannot be created or opened.
pub fn build_ports(pool: &DbPool, settings: &ServerSettings) -> io::Result<HttpStatePorts> {
    let media_root = settings.media_root();
    let images = CapStdImageStore::open(&media_root).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("open media root {}: {err}", media_root.display()),
        )
    })?;
    let attributes = Arc::new(DieselAttributeRepository::new(pool.clone()));

    Ok(HttpStatePorts {
        users: Arc::new(build_user_accounts(pool)),
        tags: Arc::new(AttributeCatalogService::<Tag, _>::new(Arc::clone(
            &attributes,
        ))),
        locations: Arc::new(AttributeCatalogService::<Location, _>::new(attributes)),
        experiences: Arc::new(ExperienceCatalogService::new(
            Arc::new(DieselExperienceRepository::new(pool.clone())),
            Arc::new(images),
        )),
    })
}

/// Build HTTP state carrying the configured media URL and upload limit.
///
/// # Errors
/// See [`build_ports`].
pub fn build_http_state(pool: &DbPool, settings: &ServerSettings) -> io::Result<HttpState> {
    let ports = build_ports(pool, settings)?;
    Ok(HttpState::with_media(
        ports,
        settings.media_url(),
        settings.upload_limit_bytes(),
    ))
}
