//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the defaults target local development
//! against the hosted license API.
//!
//! - `KEYWARDEN_API_URL` - License API base URL (default: `https://auth.keywarden.dev`)
//! - `KEYWARDEN_PROFILE_API_URL` - Discord profile lookup base URL (default: `https://api.neast.dev`)
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 3000)
//! - `DASHBOARD_BASE_URL` - Public URL for the dashboard (default: `http://127.0.0.1:3000`);
//!   an `https` URL turns on secure session cookies
//! - `DASHBOARD_SESSION_REVALIDATE_SECS` - Seconds a signed-in principal is
//!   trusted before the license API is asked again (default: 60)
//! - `SENTRY_DSN` - enables Sentry reporting when set
//! - `SENTRY_ENVIRONMENT` - Sentry environment (e.g., "development", "production")
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (0.0 to 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry traces sample rate (0.0 to 1.0)

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Hosted license API used when `KEYWARDEN_API_URL` is not set.
const DEFAULT_API_URL: &str = "https://auth.keywarden.dev";

/// Hosted Discord profile service used when `KEYWARDEN_PROFILE_API_URL` is not set.
const DEFAULT_PROFILE_API_URL: &str = "https://api.neast.dev";

/// Failures while reading the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Bind address for the HTTP server
    pub host: IpAddr,
    /// Listen port
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// License API base URL (no trailing slash)
    pub api_base_url: String,
    /// Discord profile lookup base URL (no trailing slash)
    pub profile_api_url: String,
    /// Seconds a stored principal is trusted before revalidation
    pub session_revalidate_secs: i64,
    /// Sentry DSN; reporting stays off when unset
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl DashboardConfig {
    /// Read every knob from the environment, `.env` first so local
    /// overrides apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DASHBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DASHBOARD_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_PORT".to_string(), e.to_string()))?;
        let base_url = normalize_base_url(
            "DASHBOARD_BASE_URL",
            &get_env_or_default("DASHBOARD_BASE_URL", "http://127.0.0.1:3000"),
        )?;
        let api_base_url = normalize_base_url(
            "KEYWARDEN_API_URL",
            &get_env_or_default("KEYWARDEN_API_URL", DEFAULT_API_URL),
        )?;
        let profile_api_url = normalize_base_url(
            "KEYWARDEN_PROFILE_API_URL",
            &get_env_or_default("KEYWARDEN_PROFILE_API_URL", DEFAULT_PROFILE_API_URL),
        )?;
        let session_revalidate_secs = get_env_or_default("DASHBOARD_SESSION_REVALIDATE_SECS", "60")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "DASHBOARD_SESSION_REVALIDATE_SECS".to_string(),
                    e.to_string(),
                )
            })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            api_base_url,
            profile_api_url,
            session_revalidate_secs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Address the listener binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// License API endpoint that starts the Discord OAuth flow.
    #[must_use]
    pub fn oauth_login_url(&self) -> String {
        format!("{}/auth/discord", self.api_base_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Env var, or `None` when unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Env var, or the given default when unset.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate a base URL and strip any trailing slash.
///
/// Joining `{base}{path}` everywhere downstream relies on the base never
/// ending in `/`.
fn normalize_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
