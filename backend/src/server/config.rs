//! Server settings loaded via OrthoConfig.
//!
//! Every key is read from `EXPERIENCES_*` environment variables or a
//! configuration file; command-line arguments are handled by the binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use experiences::inbound::http::state::{DEFAULT_MEDIA_URL, MediaUrl};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MEDIA_ROOT: &str = "media";

/// Settings that cannot be turned into a runnable server.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("EXPERIENCES_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address {value:?}: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("EXPERIENCES_DB_MAX_CONNECTIONS must be at least 1")]
    EmptyPool,
}

/// Runtime configuration of the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EXPERIENCES")]
pub struct ServerSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Directory holding uploaded files.
    pub media_root: Option<PathBuf>,
    /// Public URL prefix of the media directory.
    pub media_url: Option<String>,
    /// Upper bound of pooled database connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Largest accepted image upload, in bytes.
    #[ortho_config(default = 10_485_760)]
    pub upload_limit_bytes: usize,
}

impl ServerSettings {
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                source,
            })
    }

    pub fn media_root(&self) -> PathBuf {
        self.media_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT))
    }

    pub fn media_url(&self) -> MediaUrl {
        MediaUrl::new(self.media_url.as_deref().unwrap_or(DEFAULT_MEDIA_URL))
    }

    pub fn db_max_connections(&self) -> Result<u32, SettingsError> {
        match self.db_max_connections {
            0 => Err(SettingsError::EmptyPool),
            size => Ok(size),
        }
    }

    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_bytes
    }
}
