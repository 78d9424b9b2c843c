//! Server configuration loaded from the environment.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::outbound::gocardless::{DEFAULT_ENDPOINT, GoCardlessCredentials};

/// Environment variable holding the aggregator secret id.
pub const SECRET_ID_VAR: &str = "GOCARDLESS_SECRET_ID";
/// Environment variable holding the aggregator secret key.
pub const SECRET_KEY_VAR: &str = "GOCARDLESS_SECRET_KEY";
/// Environment variable holding the PostgreSQL connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variable overriding the aggregator endpoint.
pub const ENDPOINT_VAR: &str = "GOCARDLESS_ENDPOINT";
/// Environment variable overriding the listen address.
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";
/// Environment variable overriding the browser callback URL.
pub const CALLBACK_URL_VAR: &str = "CALLBACK_URL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Failure while assembling the server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },
    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {message}")]
    InvalidVar { name: &'static str, message: String },
}

/// Runtime configuration for the HTTP server and its adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub credentials: GoCardlessCredentials,
    pub endpoint: Url,
    /// Where the aggregator redirects the user's browser after
    /// authorization.
    pub callback_url: String,
}

impl ServerConfig {
    /// Load the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Fails fast when a required variable is absent or unparseable so
    /// misconfiguration is caught at startup rather than first request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            vars.get(name)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or(ConfigError::MissingVar { name })
        };

        let bind_addr: SocketAddr = vars
            .get(BIND_ADDR_VAR)
            .map_or(DEFAULT_BIND_ADDR, String::as_str)
            .parse()
            .map_err(|err| ConfigError::InvalidVar {
                name: BIND_ADDR_VAR,
                message: format!("{err}"),
            })?;

        let endpoint: Url = vars
            .get(ENDPOINT_VAR)
            .map_or(DEFAULT_ENDPOINT, String::as_str)
            .parse()
            .map_err(|err| ConfigError::InvalidVar {
                name: ENDPOINT_VAR,
                message: format!("{err}"),
            })?;

        let callback_url = vars.get(CALLBACK_URL_VAR).cloned().unwrap_or_else(|| {
            format!("http://localhost:{}/api/connections/callback", bind_addr.port())
        });

        Ok(Self {
            bind_addr,
            database_url: required(DATABASE_URL_VAR)?,
            credentials: GoCardlessCredentials {
                secret_id: required(SECRET_ID_VAR)?,
                secret_key: required(SECRET_KEY_VAR)?,
            },
            endpoint,
            callback_url,
        })
    }
}
