//! Application configuration.
//!
//! Read from the environment (after `.env` is loaded by the binary):
//! `PORT`, `JWT_SECRET`, `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
//! `GOOGLE_REDIRECT_URL`, `FRONTEND_URL`, `ALLOWED_ORIGINS`,
//! `STORE_TIMEOUT_SECS`, `SESSION_TTL_HOURS`.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Google OAuth client credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Configuration for the planner server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen port, bound on all interfaces.
    pub port: u16,
    /// HS256 secret for session credentials.
    pub jwt_secret: String,
    pub google: GoogleConfig,
    /// Where a successful login lands: `{frontend_url}/home?token=...`.
    pub frontend_url: String,
    /// CORS origins.
    pub allowed_origins: Vec<String>,
    /// Deadline for a single store operation.
    pub store_timeout: Duration,
    /// Lifetime of issued session credentials, in hours.
    pub session_ttl_hours: i64,
}

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

impl AppConfig {
    /// Creates a configuration with defaults for everything optional.
    pub fn new(jwt_secret: impl Into<String>, google: GoogleConfig) -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: jwt_secret.into(),
            google,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            allowed_origins: vec![DEFAULT_FRONTEND_URL.to_string()],
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }

    /// Sets the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the frontend URL. CORS origins follow it unless set explicitly.
    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = url.into();
        self.allowed_origins = vec![self.frontend_url.clone()];
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Sets the store deadline.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_session_ttl_hours(mut self, hours: i64) -> Self {
        self.session_ttl_hours = hours;
        self
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let google = GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            redirect_url: required("GOOGLE_REDIRECT_URL")?,
        };
        let mut config = Self::new(required("JWT_SECRET")?, google);

        if let Some(port) = get("PORT") {
            config = config.with_port(parse("PORT", &port)?);
        }
        if let Some(url) = get("FRONTEND_URL") {
            config = config.with_frontend_url(url.trim_end_matches('/'));
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            config = config.with_allowed_origins(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(secs) = get("STORE_TIMEOUT_SECS") {
            config = config.with_store_timeout(Duration::from_secs(parse(
                "STORE_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Some(hours) = get("SESSION_TTL_HOURS") {
            let hours: i64 = parse("SESSION_TTL_HOURS", &hours)?;
            if hours <= 0 {
                return Err(ConfigError::Invalid {
                    name: "SESSION_TTL_HOURS",
                    value: hours.to_string(),
                });
            }
            config = config.with_session_ttl_hours(hours);
        }

        Ok(config)
    }

    /// `0.0.0.0:{port}`.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
