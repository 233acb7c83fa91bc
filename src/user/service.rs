use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{NewUser, User},
    repository::UserRepository,
    types::CreateUserInput,
};
use crate::shared::AppError;

/// Service for handling user account logic
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Persists a new user from validated input
    ///
    /// The credential is stored exactly as received.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<(), AppError> {
        let new_user = NewUser::from_input(input);

        match self.repository.create(&new_user).await {
            Ok(()) => {
                info!("User created");
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "User creation failed");
                Err(error)
            }
        }
    }

    /// Looks up a user by email and clears the credential for display
    #[instrument(skip(self))]
    pub async fn get_user(&self, email: &str) -> Result<User, AppError> {
        let user = self.repository.get_by_email(email).await.map_err(|error| {
            warn!(error = %error, "User lookup failed");
            error
        })?;

        info!(user_id = user.id, "User found");
        Ok(user.sanitized())
    }
}
