use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use super::models::{NewUser, User};
use crate::shared::AppError;

/// Message reported when no row matches a lookup
pub const RECORD_NOT_FOUND: &str = "record not found";

/// Trait for user repository operations
///
/// The repository is the only component that reads or writes the users
/// table. It applies no normalization: emails are matched exactly as given.
#[async_trait]
pub trait UserRepository {
    async fn create(&self, user: &NewUser) -> Result<(), AppError>;
    async fn get_by_email(&self, email: &str) -> Result<User, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    state: Mutex<InMemoryUsers>,
}

#[derive(Default)]
struct InMemoryUsers {
    by_email: HashMap<String, User>,
    next_id: i64,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryUsers::default()),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.state.lock().map(|s| s.by_email.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryUsers>, AppError> {
        self.state.lock().map_err(|_| {
            error!("In-memory user map lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: &NewUser) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state.by_email.contains_key(&user.email) {
            warn!("User email already exists in memory");
            return Err(AppError::DatabaseError(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }

        state.next_id += 1;
        let record = User {
            id: state.next_id,
            email: user.email.clone(),
            password: user.password.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        state.by_email.insert(record.email.clone(), record);

        debug!("User created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User, AppError> {
        match self.lock()?.by_email.get(email) {
            Some(user) => {
                debug!(user_id = user.id, "User found in memory");
                Ok(user.clone())
            }
            None => {
                debug!("User not found in memory");
                Err(AppError::NotFound(RECORD_NOT_FOUND.to_string()))
            }
        }
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: &NewUser) -> Result<(), AppError> {
        debug!("Creating user in database");

        sqlx::query(
            "INSERT INTO users (email, password, first_name, last_name, phone, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $6)"
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!("User created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<User, AppError> {
        debug!("Fetching user from database");

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, first_name, last_name, phone, created_at, updated_at FROM users WHERE email = $1 LIMIT 1"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })?;

        match user {
            Some(user) => {
                debug!(user_id = user.id, "User found in database");
                Ok(user)
            }
            None => {
                debug!("User not found in database");
                Err(AppError::NotFound(RECORD_NOT_FOUND.to_string()))
            }
        }
    }
}
