use std::env;

use thiserror::Error;
use wishrift_collab::DiscoveryConfig;

/// Everything the server needs to know at startup, read once from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Postgres connection string. The in-memory database is used when absent.
    pub database_url: Option<String>,
    /// Shared secret the identity provider presents when handing over a verified identity.
    /// Identity hand-over is disabled when absent.
    pub identity_secret: Option<String>,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WISHRIFT_SERVER_PORT must be a port number, got \"{0}\"")]
    InvalidPort(String),
}

impl ServerConfig {
    /// The default port the server will listen on.
    pub const DEFAULT_PORT: u16 = 9050;

    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("WISHRIFT_SERVER_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port))?,
            Err(_) => Self::DEFAULT_PORT,
        };

        Ok(Self {
            port,
            database_url: non_empty_var("DATABASE_URL"),
            identity_secret: non_empty_var("WISHRIFT_IDENTITY_SECRET"),
            discovery: DiscoveryConfig::from_env(),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            database_url: None,
            identity_secret: None,
            discovery: DiscoveryConfig::default(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
