use sqlx::PgPool;
use tracing::{error, info, instrument};

use super::StoreError;

/// Schema statements for one persisted entity
///
/// Statements must be idempotent so that migrating an up-to-date schema is a
/// no-op.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    pub name: &'static str,
    pub table: &'static str,
    pub statements: &'static [&'static str],
}

pub const USER_SCHEMA: EntitySchema = EntitySchema {
    name: "User",
    table: "users",
    statements: &[
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            CONSTRAINT users_email_key UNIQUE (email)
        )",
        "ALTER TABLE users ADD COLUMN IF NOT EXISTS phone TEXT",
    ],
};

pub const REALTOR_SCHEMA: EntitySchema = EntitySchema {
    name: "Realtor",
    table: "realtors",
    statements: &["CREATE TABLE IF NOT EXISTS realtors (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            CONSTRAINT realtors_email_key UNIQUE (email)
        )"],
};

pub const LISTING_SCHEMA: EntitySchema = EntitySchema {
    name: "Listing",
    table: "listings",
    statements: &[
        "CREATE TABLE IF NOT EXISTS listings (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            address TEXT,
            price_cents BIGINT NOT NULL DEFAULT 0,
            user_id BIGINT REFERENCES users (id) ON DELETE SET NULL,
            realtor_id BIGINT REFERENCES realtors (id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS listings_user_id_idx ON listings (user_id)",
        "CREATE INDEX IF NOT EXISTS listings_realtor_id_idx ON listings (realtor_id)",
    ],
};

/// Every entity the application persists, in dependency order
pub const ENTITIES: [EntitySchema; 3] = [USER_SCHEMA, REALTOR_SCHEMA, LISTING_SCHEMA];

/// Applies the schema of every entity inside one transaction
///
/// Either all entities are migrated or none: the first failing statement
/// rolls back everything applied before it.
#[instrument(skip_all, fields(entities = entities.len()))]
pub async fn migrate(pool: &PgPool, entities: &[EntitySchema]) -> Result<(), StoreError> {
    info!("Migrating entities");
    let mut tx = pool.begin().await.map_err(StoreError::Transaction)?;

    for entity in entities {
        info!(entity = entity.name, table = entity.table, "Migrating entity");
        for statement in entity.statements.iter().copied() {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|source| {
                    error!(entity = entity.name, error = %source, "Entity migration failed");
                    StoreError::Migration {
                        entity: entity.name,
                        source,
                    }
                })?;
        }
    }

    tx.commit().await.map_err(StoreError::Transaction)?;
    info!("Entities migrated");
    Ok(())
}

/// Whether `table` exists in the connection's current schema
pub async fn has_table(pool: &PgPool, table: &str) -> Result<bool, StoreError> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = $1
        )",
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .map_err(StoreError::Verification)
}

/// Checks that every entity's table exists after migration
#[instrument(skip_all)]
pub async fn verify_schema(pool: &PgPool, entities: &[EntitySchema]) -> Result<(), StoreError> {
    for entity in entities {
        if !has_table(pool, entity.table).await? {
            error!(entity = entity.name, table = entity.table, "Table missing after migration");
            return Err(StoreError::MissingTable(entity.table));
        }
    }

    info!("Schema verified");
    Ok(())
}
