//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Admin credentials
//! - `ADMIN_EMAIL` - The single administrator identity
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC string (`folio-cli hash-password`)
//!
//! Both are optional at start-up so the public site can run without them;
//! the login endpoint answers 500 until both are set.
//!
//! ## Optional
//! - `FOLIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either the server runs on in-memory stores)
//! - `FOLIO_HOST` - Bind address (default: 127.0.0.1)
//! - `FOLIO_PORT` - Listen port (default: 3000)
//! - `FOLIO_BASE_URL` - Public URL (default: <http://localhost:3000>);
//!   an `https` URL marks the session cookie `Secure`
//! - `FOLIO_SESSION_TTL_SECS` - Admin session lifetime (default: 3600)
//! - `FOLIO_MAINTENANCE_CHECK_TIMEOUT_MS` - Budget for the settings read in
//!   the request gate (default: 1500)
//! - `FOLIO_SESSION_PURGE_INTERVAL_SECS` - Expired-session sweep interval
//!   (default: 600, 0 disables)
//! - `FOLIO_STATIC_DIR` - Static assets directory (default: crates/server/static)
//! - `FOLIO_LOG_JSON` - Emit JSON logs when set to `1`/`true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use argon2::PasswordHash;
use folio_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Longest allowed admin session (30 days).
const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL (contains password). `None` selects the
    /// in-memory stores.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the site
    pub base_url: String,
    /// Administrator credentials
    pub admin: AdminConfig,
    /// Lifetime of an admin session
    pub session_ttl: Duration,
    /// Budget for the maintenance-mode settings read
    pub maintenance_check_timeout: Duration,
    /// Interval of the expired-session sweep (`None` disables it)
    pub session_purge_interval: Option<Duration>,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// The single administrator's credentials.
///
/// Either half may be missing; the credential check reports that as a
/// server misconfiguration.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    /// Administrator identity
    pub email: Option<Email>,
    /// Argon2 PHC hash of the administrator password
    pub password_hash: Option<SecretString>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin: AdminConfig::default(),
            session_ttl: Duration::from_secs(3600),
            maintenance_check_timeout: Duration::from_millis(1500),
            session_purge_interval: Some(Duration::from_secs(600)),
            static_dir: PathBuf::from("crates/server/static"),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed,
    /// including an `ADMIN_PASSWORD_HASH` that is not a PHC string.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let host = parse_env("FOLIO_HOST", defaults.host)?;
        let port = parse_env("FOLIO_PORT", defaults.port)?;
        let base_url = get_optional_env("FOLIO_BASE_URL").unwrap_or(defaults.base_url);
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FOLIO_BASE_URL".to_string(), e.to_string())
        })?;

        let session_ttl_secs: u64 = parse_env("FOLIO_SESSION_TTL_SECS", 3600)?;
        if session_ttl_secs == 0 || session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::InvalidEnvVar(
                "FOLIO_SESSION_TTL_SECS".to_string(),
                format!("must be between 1 and {MAX_SESSION_TTL_SECS}"),
            ));
        }
        let maintenance_timeout_ms: u64 = parse_env("FOLIO_MAINTENANCE_CHECK_TIMEOUT_MS", 1500)?;
        let purge_secs: u64 = parse_env("FOLIO_SESSION_PURGE_INTERVAL_SECS", 600)?;

        Ok(Self {
            database_url: get_database_url("FOLIO_DATABASE_URL"),
            host,
            port,
            base_url,
            admin: AdminConfig::from_env()?,
            session_ttl: Duration::from_secs(session_ttl_secs),
            maintenance_check_timeout: Duration::from_millis(maintenance_timeout_ms),
            session_purge_interval: (purge_secs > 0).then(|| Duration::from_secs(purge_secs)),
            static_dir: get_optional_env("FOLIO_STATIC_DIR")
                .map_or(defaults.static_dir, PathBuf::from),
            log_json: get_optional_env("FOLIO_LOG_JSON")
                .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?,
            sentry_traces_sample_rate: parse_env(
                "SENTRY_TRACES_SAMPLE_RATE",
                defaults.sentry_traces_sample_rate,
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The database URL, for tools that cannot fall back to memory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when no database is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("FOLIO_DATABASE_URL".to_string()))
    }

    /// Whether the session cookie must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = get_optional_env("ADMIN_EMAIL")
            .map(|raw| {
                Email::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let password_hash = get_optional_env("ADMIN_PASSWORD_HASH")
            .map(|raw| {
                let secret = SecretString::from(raw);
                validate_password_hash(&secret, "ADMIN_PASSWORD_HASH")?;
                Ok::<_, ConfigError>(secret)
            })
            .transpose()?;

        Ok(Self {
            email,
            password_hash,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Require an argon2 PHC string.
fn validate_password_hash(hash: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    PasswordHash::new(hash.expose_secret()).map_err(|_| {
        ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an argon2 PHC string (see `folio-cli hash-password`)".to_string(),
        )
    })?;
    Ok(())
}
