//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::shared::AppError;

/// Message returned for any body that is missing, malformed or incomplete
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please provide required fields";

/// JSON body that deserialized and passed validation
///
/// Every rejection maps to `AppError::InvalidInput` so clients see a single
/// 400 shape; the precise reason is only logged.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            debug!(reason = %e.body_text(), "Rejected request body");
            AppError::InvalidInput(REQUIRED_FIELDS_MESSAGE.to_string())
        })?;

        value.validate().map_err(|e| {
            debug!(reason = %format_validation_errors(&e), "Request body failed validation");
            AppError::InvalidInput(REQUIRED_FIELDS_MESSAGE.to_string())
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Format validation errors into a single log line
fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}
