//! Application settings loaded from environment variables.

use std::env;
use thiserror::Error;

use crate::session::MIN_SESSION_SECRET_LENGTH;
use crate::store::DatabaseSettings;

/// Default number of connections to the session backend
pub const DEFAULT_SESSION_POOL_SIZE: usize = 10;

/// Default address the HTTP server listens on
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database: DatabaseSettings,
    pub redis_url: String,
    session_secret: String,
    pub session_pool_size: usize,
    pub server_addr: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database)
            .field("redis_url", &"[REDACTED]")
            .field("session_secret", &"[REDACTED]")
            .field("session_pool_size", &self.session_pool_size)
            .field("server_addr", &self.server_addr)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` (when present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let port = required("DB_PORT")?;
        let port = port.parse::<u16>().map_err(|e| ConfigError::Invalid {
            name: "DB_PORT",
            reason: e.to_string(),
        })?;

        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "SESSION_SECRET",
                reason: format!("must be at least {} bytes", MIN_SESSION_SECRET_LENGTH),
            });
        }

        let session_pool_size = match lookup("SESSION_POOL_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "SESSION_POOL_SIZE",
                    reason: format!("expected a positive integer, got {:?}", value),
                })?,
            None => DEFAULT_SESSION_POOL_SIZE,
        };

        Ok(Self {
            database: DatabaseSettings {
                host: required("DB_HOST")?,
                user: required("DB_USER")?,
                password: required("DB_PASSWORD")?,
                name: required("DB_NAME")?,
                port,
            },
            redis_url: required("REDIS_URL")?,
            session_secret,
            session_pool_size,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
        })
    }

    /// Secret bytes used to derive the session cookie signing key.
    pub fn session_secret_bytes(&self) -> &[u8] {
        self.session_secret.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DB_HOST", "localhost".to_string()),
            ("DB_USER", "postgres".to_string()),
            ("DB_PASSWORD", "secret".to_string()),
            ("DB_NAME", "realty".to_string()),
            ("DB_PORT", "5432".to_string()),
            ("REDIS_URL", "localhost:6379".to_string()),
            (
                "SESSION_SECRET",
                "0123456789abcdef0123456789abcdef".to_string(),
            ),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_loads_complete_environment() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "realty");
        assert_eq!(config.redis_url, "localhost:6379");
        assert_eq!(config.session_pool_size, DEFAULT_SESSION_POOL_SIZE);
        assert_eq!(config.server_addr, DEFAULT_SERVER_ADDR);
        assert_eq!(config.session_secret_bytes().len(), 32);
    }

    #[rstest]
    #[case("DB_HOST")]
    #[case("DB_USER")]
    #[case("DB_PASSWORD")]
    #[case("DB_NAME")]
    #[case("DB_PORT")]
    #[case("REDIS_URL")]
    #[case("SESSION_SECRET")]
    fn test_missing_variable_is_fatal(#[case] name: &'static str) {
        let mut env = base_env();
        env.remove(name);
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(name));

        env.insert(name, String::new());
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(name));
    }

    #[rstest]
    #[case("DB_PORT", "not-a-port")]
    #[case("DB_PORT", "70000")]
    #[case("SESSION_SECRET", "too-short")]
    #[case("SESSION_POOL_SIZE", "0")]
    #[case("SESSION_POOL_SIZE", "ten")]
    fn test_invalid_variable_is_fatal(#[case] name: &'static str, #[case] value: &str) {
        let mut env = base_env();
        env.insert(name, value.to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid { name: invalid, .. }) if invalid == name
        ));
    }

    #[test]
    fn test_optional_overrides() {
        let mut env = base_env();
        env.insert("SESSION_POOL_SIZE", "4".to_string());
        env.insert("SERVER_ADDR", "127.0.0.1:3000".to_string());

        let config = load(&env).unwrap();
        assert_eq!(config.session_pool_size, 4);
        assert_eq!(config.server_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("0123456789abcdef"));
        assert!(!debug.contains("localhost:6379"));
        assert!(!debug.contains("secret\""));
    }
}
