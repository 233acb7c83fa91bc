use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    service::UserService,
    types::{CreateUserInput, CreateUserResponse, UserResponse},
};
use crate::extractors::ValidatedJson;
use crate::session::Session;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new user
///
/// POST /users
#[instrument(name = "create_user", skip(state, input))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateUserInput>,
) -> Result<Json<CreateUserResponse>, AppError> {
    info!(email = %input.email, "Creating new user");

    let service = UserService::new(Arc::clone(&state.user_repository));
    service
        .create_user(input)
        .await
        .map_err(|e| AppError::failed("Failed to create user", e))?;

    Ok(Json(CreateUserResponse::created()))
}

/// HTTP handler for the signed-in user's own record
///
/// GET /dashboard
/// Requires a session holding the user's email
#[instrument(name = "dashboard", skip(state, session))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserResponse>, AppError> {
    let email = session.authenticated_email().ok_or_else(|| {
        warn!("Dashboard requested without a signed-in session");
        AppError::Unauthorized("Please sign in".to_string())
    })?;

    info!(email = %email, "Loading dashboard");

    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service
        .get_user(&email)
        .await
        .map_err(|e| AppError::failed("Failed to get user", e))?;

    Ok(Json(UserResponse { data: user }))
}

/// HTTP handler for looking up a user by email
///
/// GET /users/:email
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service
        .get_user(&email)
        .await
        .map_err(|e| AppError::failed("Failed to get user", e))?;

    info!(user_id = user.id, "User fetched");
    Ok(Json(UserResponse { data: user }))
}
