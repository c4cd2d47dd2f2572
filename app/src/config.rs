//! Configuration management for Eventure.
//!
//! Loads configuration from environment variables with sensible defaults.
//! `bin/server.rs` reads `.env` through `dotenvy` before calling
//! [`Config::from_env`].

use crate::aggregates::rsvp::DEFAULT_MAX_LEDGERS;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// `PostgreSQL` configuration; `None` runs on in-memory repositories
    pub postgres: Option<PostgresConfig>,
    /// Session token configuration
    pub auth: AuthConfig,
    /// Outgoing email configuration
    pub email: EmailConfig,
    /// RSVP admission configuration
    pub admission: AdmissionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Origin allowed by CORS (the single-page frontend)
    pub frontend_url: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// `PostgreSQL` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens
    pub jwt_secret: String,
    /// Session lifetime in days
    pub token_ttl_days: u64,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// SMTP username; `None` logs emails to the console instead of sending
    pub user: Option<String>,
    /// SMTP password
    pub password: Option<String>,
    /// From address (defaults to the username)
    pub from: Option<String>,
}

/// RSVP admission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// How long a request waits for its admission outcome, in milliseconds
    pub timeout_ms: u64,
    /// Seat ledgers cached before idle ones are dropped
    pub max_ledgers: usize,
}

const DEV_JWT_SECRET: &str = "eventure-dev-secret-change-me";

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        Self {
            server: ServerConfig {
                host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&lookup, "PORT").unwrap_or(5000),
                frontend_url: non_empty("FRONTEND_URL")
                    .unwrap_or_else(|| "http://localhost:5173".to_string()),
                shutdown_timeout: parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS").unwrap_or(10),
            },
            postgres: non_empty("DATABASE_URL").map(|url| PostgresConfig {
                url,
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS").unwrap_or(5),
                connect_timeout: parse_var(&lookup, "DATABASE_CONNECT_TIMEOUT").unwrap_or(30),
            }),
            auth: AuthConfig {
                jwt_secret,
                token_ttl_days: parse_var(&lookup, "JWT_TTL_DAYS").unwrap_or(7),
                cookie_secure: parse_var(&lookup, "COOKIE_SECURE").unwrap_or(false),
            },
            email: EmailConfig {
                host: non_empty("EMAIL_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: parse_var(&lookup, "EMAIL_PORT").unwrap_or(465),
                user: non_empty("EMAIL_USER"),
                password: non_empty("EMAIL_PASS"),
                from: non_empty("EMAIL_FROM"),
            },
            admission: AdmissionConfig {
                timeout_ms: parse_var(&lookup, "ADMISSION_TIMEOUT_MS").unwrap_or(5000),
                max_ledgers: parse_var(&lookup, "ADMISSION_MAX_LEDGERS").unwrap_or(DEFAULT_MAX_LEDGERS),
            },
        }
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl AuthConfig {
    /// Session lifetime.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_days * 24 * 60 * 60)
    }
}

impl AdmissionConfig {
    /// Admission wait timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ServerConfig {
    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();

        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.server.frontend_url, "http://localhost:5173");
        assert!(config.postgres.is_none());
        assert_eq!(config.email.host, "smtp.gmail.com");
        assert_eq!(config.email.port, 465);
        assert!(config.email.user.is_none());
        assert_eq!(config.auth.token_ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.admission.timeout(), Duration::from_secs(5));
        assert_eq!(config.admission.max_ledgers, 1024);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "8081"),
            ("DATABASE_URL", "postgres://localhost/eventure"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("JWT_SECRET", "s3cret"),
            ("EMAIL_USER", "events@campus.edu"),
            ("COOKIE_SECURE", "true"),
            ("ADMISSION_MAX_LEDGERS", "64"),
        ]);

        assert_eq!(config.server.port, 8081);
        let postgres = config.postgres.unwrap_or_else(|| unreachable!("DATABASE_URL was set"));
        assert_eq!(postgres.max_connections, 12);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert!(config.auth.cookie_secure);
        assert_eq!(config.email.user.as_deref(), Some("events@campus.edu"));
        assert_eq!(config.admission.max_ledgers, 64);
    }

    #[test]
    fn ignores_unparseable_and_blank_values() {
        let config = config_from(&[("PORT", "not-a-port"), ("DATABASE_URL", "  ")]);

        assert_eq!(config.server.port, 5000);
        assert!(config.postgres.is_none());
    }
}
