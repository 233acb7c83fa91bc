use serde::{Deserialize, Serialize};
use validator::Validate;

use super::models::User;

/// Request payload for creating a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Response for a successful user creation
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateUserResponse {
    pub status: String,
    pub data: String,
}

impl CreateUserResponse {
    pub fn created() -> Self {
        Self {
            status: "OK".to_string(),
            data: "User created!".to_string(),
        }
    }
}

/// Response wrapping a single user
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub data: User,
}
