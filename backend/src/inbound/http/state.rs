//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AttributeCatalog, ExperienceCatalog, UserAccounts};
use crate::domain::{ImagePath, Location, Tag};

/// Default public prefix of uploaded files.
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// Public URL prefix under which the media root is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrl(String);

impl MediaUrl {
    /// Normalise a prefix so it always ends with exactly one `/`.
    ///
    /// # Examples
    /// ```
    /// use experiences::inbound::http::state::MediaUrl;
    ///
    /// assert_eq!(MediaUrl::new("/media").as_str(), "/media/");
    /// assert_eq!(MediaUrl::new("https://cdn.example.com/m/").as_str(), "https://cdn.example.com/m/");
    /// ```
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        Self(format!("{trimmed}/"))
    }

    /// The prefix including its trailing slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public URL of a stored image.
    pub fn url_for(&self, path: &ImagePath) -> String {
        format!("{}{}", self.0, path.as_ref())
    }
}

impl Default for MediaUrl {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_URL)
    }
}

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserAccounts>,
    pub tags: Arc<dyn AttributeCatalog<Tag>>,
    pub locations: Arc<dyn AttributeCatalog<Location>>,
    pub experiences: Arc<dyn ExperienceCatalog>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserAccounts>,
    pub tags: Arc<dyn AttributeCatalog<Tag>>,
    pub locations: Arc<dyn AttributeCatalog<Location>>,
    pub experiences: Arc<dyn ExperienceCatalog>,
    pub media_url: MediaUrl,
    pub upload_limit_bytes: usize,
}

impl HttpState {
    /// Default cap on an uploaded image.
    pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

    /// Construct state from a ports bundle with default media settings.
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::with_media(
            ports,
            MediaUrl::default(),
            Self::DEFAULT_UPLOAD_LIMIT_BYTES,
        )
    }

    /// Construct state from a ports bundle and media settings.
    pub fn with_media(ports: HttpStatePorts, media_url: MediaUrl, upload_limit_bytes: usize) -> Self {
        let HttpStatePorts {
            users,
            tags,
            locations,
            experiences,
        } = ports;
        Self {
            users,
            tags,
            locations,
            experiences,
            media_url,
            upload_limit_bytes,
        }
    }
}
