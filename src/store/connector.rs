use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::StoreError;

/// Idle connections above the retained minimum are closed after this long
const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Discrete connection parameters for the relational store
#[derive(Clone, PartialEq)]
pub struct DatabaseSettings {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub port: u16,
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("port", &self.port)
            .finish()
    }
}

impl DatabaseSettings {
    /// Connection options with TLS off and every session pinned to UTC
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(PgSslMode::Disable)
            .options([("TimeZone", "UTC")])
    }
}

/// Bounds of the connection pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub max_open: u32,
    pub max_idle: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open: 100,
            max_idle: 10,
            max_lifetime: Duration::from_secs(60 * 60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolSettings {
    /// sqlx keeps `min_connections` open and reaps idle connections beyond
    /// it, so `max_idle` maps onto that floor.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_open)
            .min_connections(self.max_idle.min(self.max_open))
            .max_lifetime(self.max_lifetime)
            .idle_timeout(IDLE_TIMEOUT)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Opens the pool and checks that the store answers
#[instrument(skip_all, fields(host = %settings.host, database = %settings.name))]
pub async fn connect(settings: &DatabaseSettings, pool: &PoolSettings) -> Result<PgPool, StoreError> {
    let db = pool
        .pool_options()
        .connect_with(settings.connect_options())
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open database pool");
            StoreError::Connect(e)
        })?;

    sqlx::query("SELECT 1")
        .execute(&db)
        .await
        .map_err(StoreError::Connect)?;

    info!(
        max_open = pool.max_open,
        max_idle = pool.max_idle,
        max_lifetime_secs = pool.max_lifetime.as_secs(),
        "Database connected"
    );
    Ok(db)
}
