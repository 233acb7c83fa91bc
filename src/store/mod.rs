//! Relational store setup: pooled connection, schema migration and
//! verification. Everything here runs once at startup and is fatal on error.

pub use connector::{connect, DatabaseSettings, PoolSettings};
pub use migrations::{
    has_table, migrate, verify_schema, EntitySchema, ENTITIES, LISTING_SCHEMA, REALTOR_SCHEMA,
    USER_SCHEMA,
};

mod connector;
mod migrations;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to migrate {entity}: {source}")]
    Migration {
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration transaction failed: {0}")]
    Transaction(#[source] sqlx::Error),

    #[error("Failed to verify schema: {0}")]
    Verification(#[source] sqlx::Error),

    #[error("{0} table does not exist")]
    MissingTable(&'static str),
}
