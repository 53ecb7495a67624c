//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either the storefront runs on an in-memory store)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `STOREFRONT_PAYMENT_APPROVAL_RATE` - Probability that a simulated payment
//!   is approved, between 0 and 1 (default: 0.8)
//! - `STOREFRONT_SEED_CATALOG` - Load the demo catalog into the in-memory
//!   store (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::services::checkout::DEFAULT_APPROVAL_RATE;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` connection URL (contains password). `None` selects the
    /// in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Probability that a simulated payment is approved
    pub payment_approval_rate: f64,
    /// Seed the demo catalog when running without a database
    pub seed_catalog: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry performance traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env
            .optional("STOREFRONT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from);
        let host = env.parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("STOREFRONT_PORT", 3000_u16)?;
        let base_url = env.parse_or(
            "STOREFRONT_BASE_URL",
            Url::parse("http://localhost:3000").map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
            })?,
        )?;

        let payment_approval_rate =
            env.parse_or("STOREFRONT_PAYMENT_APPROVAL_RATE", DEFAULT_APPROVAL_RATE)?;
        if !(0.0..=1.0).contains(&payment_approval_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_PAYMENT_APPROVAL_RATE".to_string(),
                format!("must be between 0 and 1 (got {payment_approval_rate})"),
            ));
        }

        let seed_catalog = env.flag_or("STOREFRONT_SEED_CATALOG", true)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            payment_approval_rate,
            seed_catalog,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, or use `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`).
    fn flag_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected true or false, got '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");
        assert!((config.payment_approval_rate - 0.8).abs() < f64::EPSILON);
        assert!(config.seed_catalog);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/db")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fly/db"
        );

        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://local/alpaca"),
            ("DATABASE_URL", "postgres://fly/db"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://local/alpaca"
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STOREFRONT_PORT", "tres mil")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_approval_rate_bounds() {
        let config = load(&[("STOREFRONT_PAYMENT_APPROVAL_RATE", "0.25")]).unwrap();
        assert!((config.payment_approval_rate - 0.25).abs() < f64::EPSILON);

        assert!(load(&[("STOREFRONT_PAYMENT_APPROVAL_RATE", "1.5")]).is_err());
        assert!(load(&[("STOREFRONT_PAYMENT_APPROVAL_RATE", "-0.1")]).is_err());
    }

    #[test]
    fn test_seed_flag() {
        assert!(!load(&[("STOREFRONT_SEED_CATALOG", "no")]).unwrap().seed_catalog);
        assert!(load(&[("STOREFRONT_SEED_CATALOG", "quizas")]).is_err());
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let config = load(&[("STOREFRONT_DATABASE_URL", "postgres://u:hunter2@db/alpaca")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
