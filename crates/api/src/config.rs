use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use vbc_blog_core::admin::AdminCredential;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where documents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// In-process and lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("expected `postgres` or `memory`, got `{other}`")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    pub store_backend: StoreBackend,
    /// PostgreSQL connection URL, required for the postgres backend.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub admin_email: Option<String>,
    /// Argon2 PHC string for the admin password.
    pub admin_password_hash: Option<String>,
    /// Public origin used in sitemap links.
    pub site_url: String,
    pub max_body_bytes: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable when it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_backend: StoreBackend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Postgres)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3030)?,
            store_backend,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 5)?,
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 5000)?),
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            jwt_ttl_secs: parse_or(&lookup, "JWT_TTL_SECS", 86_400)?,
            admin_email: lookup("ADMIN_EMAIL"),
            admin_password_hash: lookup("ADMIN_PASSWORD_HASH"),
            site_url: lookup("SITE_URL").unwrap_or_else(|| "https://vbcai.org".to_string()),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", 1024 * 1024)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The admin login, when both `ADMIN_EMAIL` and `ADMIN_PASSWORD_HASH` are set.
    pub fn admin_credential(&self) -> Result<Option<AdminCredential>, ConfigError> {
        match (&self.admin_email, &self.admin_password_hash) {
            (Some(email), Some(hash)) => AdminCredential::new(email, hash)
                .map(Some)
                .map_err(|e| ConfigError::Invalid {
                    var: "ADMIN_PASSWORD_HASH",
                    value: "<redacted>".to_string(),
                    reason: e.to_string(),
                }),
            _ => Ok(None),
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/blog")]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3030");
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.jwt_ttl_secs, 86_400);
        assert_eq!(config.max_body_bytes, 1_048_576);
        assert_eq!(config.site_url, "https://vbcai.org");
        assert!(config.admin_credential().unwrap().is_none());
    }

    #[test]
    fn postgres_needs_a_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(load(&[("STORE_BACKEND", "memory")]).is_ok());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = load(&[("STORE_BACKEND", "memory"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
        assert!(load(&[("STORE_BACKEND", "sqlite")]).is_err());
    }

    #[test]
    fn admin_hash_must_be_phc() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("ADMIN_EMAIL", "admin@vbcai.org"),
            ("ADMIN_PASSWORD_HASH", "hunter2"),
        ])
        .unwrap();
        assert!(config.admin_credential().is_err());
    }
}
