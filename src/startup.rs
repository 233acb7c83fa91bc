use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::session::SessionStore;
use crate::shared::{AppState, StartupError};
use crate::store::{self, PoolSettings, ENTITIES};
use crate::user::repository::PostgresUserRepository;

/// Connects every backend and prepares the schema
///
/// Runs strictly in order: pool, migration, verification, session store.
/// The first failure is returned and nothing is served.
pub async fn build_state(config: &Config) -> Result<(AppState, sqlx::PgPool), StartupError> {
    let pool = store::connect(&config.database, &PoolSettings::default()).await?;
    store::migrate(&pool, &ENTITIES).await?;
    store::verify_schema(&pool, &ENTITIES).await?;
    info!("Database connected and migrated successfully");

    let sessions = SessionStore::configure(
        config.session_pool_size,
        &config.redis_url,
        config.session_secret_bytes(),
    )
    .await?;

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    Ok((AppState::new(user_repository, sessions), pool))
}
