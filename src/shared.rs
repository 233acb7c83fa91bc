use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionStore;
use crate::store::StoreError;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            user_repository,
            sessions,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    /// A failed operation reported to the client under a fixed title,
    /// carrying the raw message of the underlying error.
    #[error("{error}: {message}")]
    Failed {
        error: &'static str,
        message: String,
    },

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Wraps `source` under a client-facing title, keeping only its raw message.
    pub fn failed(error: &'static str, source: AppError) -> Self {
        AppError::Failed {
            error,
            message: source.detail(),
        }
    }

    /// The underlying message without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            AppError::InvalidInput(msg)
            | AppError::Unauthorized(msg)
            | AppError::DatabaseError(msg)
            | AppError::NotFound(msg)
            | AppError::SessionStore(msg) => msg.clone(),
            AppError::Failed { message, .. } => message.clone(),
            AppError::Internal => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "Invalid input", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg),
            AppError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error", msg)
            }
            // A missing row is a failed lookup, never a client-visible 404
            AppError::NotFound(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "Not found", msg),
            AppError::SessionStore(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Session store error", msg)
            }
            AppError::Failed { error, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, message)
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error,
            "message": message
        }));

        (status, body).into_response()
    }
}

/// Errors that abort the process before it serves traffic
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to configure session store: {0}")]
    Sessions(#[from] AppError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
