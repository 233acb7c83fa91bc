use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::types::CreateUserInput;

/// Database model for users table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Unique identity key
    pub email: String,
    /// Opaque credential, stored as provided
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the user with its credential cleared, ready to send to a client
    pub fn sanitized(mut self) -> Self {
        self.password.clear();
        self
    }
}

/// Row values for inserting a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Builds the row for `input`, stamped with the current UTC time
    pub fn from_input(input: CreateUserInput) -> Self {
        Self {
            email: input.email,
            password: input.password,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            created_at: Utc::now(),
        }
    }
}
