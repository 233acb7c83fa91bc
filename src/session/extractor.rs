use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    models::{SessionData, SessionKey, USER_EMAIL},
    store::SessionStore,
};
use crate::shared::{AppError, AppState};

/// The session attached to the current request
///
/// Extracting it never fails for a missing or invalid cookie; such requests
/// get an empty, unsaved session. Only a backend failure rejects.
pub struct Session {
    id: Option<String>,
    data: SessionData,
    store: SessionStore,
}

impl Session {
    pub(super) fn new(id: Option<String>, data: SessionData, store: SessionStore) -> Self {
        Self { id, data, store }
    }

    /// Id of the persisted session, `None` until the session is saved
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn get<T: DeserializeOwned>(&self, key: SessionKey<T>) -> Option<T> {
        self.data.get(key)
    }

    /// The signed-in user's email, if the session holds a non-empty one
    pub fn authenticated_email(&self) -> Option<String> {
        self.get(USER_EMAIL).filter(|email| !email.is_empty())
    }

    pub fn insert<T: Serialize>(&mut self, key: SessionKey<T>, value: &T) -> Result<(), AppError> {
        self.data.insert(key, value)
    }

    pub fn remove<T>(&mut self, key: SessionKey<T>) -> bool {
        self.data.remove(key)
    }

    /// Persists the attributes and adds the session cookie to `jar`
    #[instrument(skip_all, fields(session_id = ?self.id))]
    pub async fn save(self, jar: SignedCookieJar) -> Result<SignedCookieJar, AppError> {
        let session_id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let policy = self.store.policy();

        self.store
            .repository()
            .save(&session_id, &self.data, policy.ttl())
            .await?;

        debug!(session_id = %session_id, attributes = self.data.len(), "Session saved");
        Ok(jar.add(policy.build_cookie(session_id)))
    }

    /// Deletes the session from the backend and expires the cookie
    #[instrument(skip_all, fields(session_id = ?self.id))]
    pub async fn destroy(self, jar: SignedCookieJar) -> Result<SignedCookieJar, AppError> {
        if let Some(session_id) = &self.id {
            self.store.repository().delete(session_id).await?;
            debug!(session_id = %session_id, "Session destroyed");
        }
        Ok(jar.remove(self.store.policy().removal_cookie()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.sessions.key().clone());
        state.sessions.load(&jar).await
    }
}
