use axum_extra::extract::cookie::{Key, SignedCookieJar};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    cookie::{CookiePolicy, SESSION_COOKIE_NAME},
    extractor::Session,
    models::SessionData,
    repository::{RedisSessionRepository, SessionRepository},
};
use crate::shared::AppError;

/// Shortest secret accepted for deriving the cookie signing key
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Client side of the external session backend plus the cookie rules
///
/// Holds no session state itself; every attribute lives in the backend.
#[derive(Clone)]
pub struct SessionStore {
    repository: Arc<dyn SessionRepository + Send + Sync>,
    key: Key,
    policy: CookiePolicy,
}

impl SessionStore {
    /// Creates a store over any backend, signing cookies with a key derived from `secret`
    pub fn new(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        secret: &[u8],
    ) -> Result<Self, AppError> {
        if secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(AppError::SessionStore(format!(
                "session secret must be at least {} bytes",
                MIN_SESSION_SECRET_LENGTH
            )));
        }

        Ok(Self {
            repository,
            key: Key::derive_from(secret),
            policy: CookiePolicy::default(),
        })
    }

    /// Connects a Redis-backed store with `pool_size` connections
    ///
    /// `address` may be a bare `host:port` or a `redis://` URL.
    #[instrument(skip(address, secret))]
    pub async fn configure(
        pool_size: usize,
        address: &str,
        secret: &[u8],
    ) -> Result<Self, AppError> {
        let repository = RedisSessionRepository::connect(address, pool_size)
            .await
            .map_err(|e| AppError::SessionStore(e.to_string()))?;

        let store = Self::new(Arc::new(repository), secret)?;
        info!(pool_size, "Session store configured");
        Ok(store)
    }

    /// Replaces the cookie policy applied to every session cookie
    pub fn with_cookie_policy(mut self, policy: CookiePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub(super) fn repository(&self) -> &Arc<dyn SessionRepository + Send + Sync> {
        &self.repository
    }

    /// Starts a fresh session that is not yet persisted
    pub fn start(&self) -> Session {
        Session::new(None, SessionData::new(), self.clone())
    }

    /// Resolves the session referenced by the signed cookie in `jar`
    ///
    /// A missing, tampered or expired cookie yields a fresh empty session.
    #[instrument(skip(self, jar))]
    pub async fn load(&self, jar: &SignedCookieJar) -> Result<Session, AppError> {
        let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
            debug!("Request carries no valid session cookie");
            return Ok(self.start());
        };

        let session_id = cookie.value().to_string();
        match self.repository.load(&session_id).await? {
            Some(data) => {
                debug!(session_id = %session_id, "Session loaded");
                Ok(Session::new(Some(session_id), data, self.clone()))
            }
            None => {
                warn!(session_id = %session_id, "Session cookie refers to unknown or expired session");
                Ok(self.start())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::USER_EMAIL;
    use crate::session::repository::InMemorySessionRepository;
    use crate::shared::test_utils::{FailingSessionRepository, TEST_SESSION_SECRET};
    use axum_extra::extract::cookie::{Cookie, SameSite};

    fn store() -> SessionStore {
        SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            TEST_SESSION_SECRET,
        )
        .unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = SessionStore::new(Arc::new(InMemorySessionRepository::new()), b"short");
        assert!(matches!(result, Err(AppError::SessionStore(_))));
    }

    #[tokio::test]
    async fn test_load_without_cookie_is_empty() {
        let store = store();
        let jar = SignedCookieJar::new(store.key().clone());

        let session = store.load(&jar).await.unwrap();
        assert!(session.id().is_none());
        assert!(session.authenticated_email().is_none());
    }

    #[tokio::test]
    async fn test_saved_session_loads_back() {
        let store = store();
        let mut session = store.start();
        session
            .insert(USER_EMAIL, &"a@b.com".to_string())
            .unwrap();
        let jar = session
            .save(SignedCookieJar::new(store.key().clone()))
            .await
            .unwrap();

        let loaded = store.load(&jar).await.unwrap();
        assert!(loaded.id().is_some());
        assert_eq!(loaded.authenticated_email(), Some("a@b.com".to_string()));
    }

    #[tokio::test]
    async fn test_unsigned_cookie_is_ignored() {
        let store = store();
        let mut session = store.start();
        session
            .insert(USER_EMAIL, &"a@b.com".to_string())
            .unwrap();
        let signed = session
            .save(SignedCookieJar::new(store.key().clone()))
            .await
            .unwrap();
        let session_id = store.load(&signed).await.unwrap().id().unwrap().to_string();

        // The raw id without a valid signature must not resolve the session
        let forged = axum::http::HeaderMap::from_iter([(
            axum::http::header::COOKIE,
            format!("session={}", session_id)
                .parse::<axum::http::HeaderValue>()
                .unwrap(),
        )]);
        let jar = SignedCookieJar::from_headers(&forged, store.key().clone());

        let loaded = store.load(&jar).await.unwrap();
        assert!(loaded.id().is_none());
        assert!(loaded.authenticated_email().is_none());
    }

    #[tokio::test]
    async fn test_cookie_for_unknown_session_is_empty() {
        let store = store();
        let jar = SignedCookieJar::new(store.key().clone())
            .add(Cookie::new(SESSION_COOKIE_NAME, "never-saved"));

        let loaded = store.load(&jar).await.unwrap();
        assert!(loaded.id().is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let store = SessionStore::new(Arc::new(FailingSessionRepository), TEST_SESSION_SECRET)
            .unwrap();
        let jar = SignedCookieJar::new(store.key().clone())
            .add(Cookie::new(SESSION_COOKIE_NAME, "sid-1"));

        assert!(matches!(
            store.load(&jar).await,
            Err(AppError::SessionStore(_))
        ));

        // Without a cookie the backend is never consulted
        let empty = SignedCookieJar::new(store.key().clone());
        assert!(store.load(&empty).await.is_ok());

        let save = store
            .start()
            .save(SignedCookieJar::new(store.key().clone()))
            .await;
        assert!(matches!(save, Err(AppError::SessionStore(_))));
    }

    /// Records the field names of every span opened while installed
    struct SpanFieldNames(Arc<std::sync::Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanFieldNames {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if attrs.metadata().name() == "configure" {
                let mut names = self.0.lock().unwrap();
                names.extend(attrs.metadata().fields().iter().map(|f| f.name().to_string()));
            }
        }
    }

    #[tokio::test]
    async fn test_configure_span_omits_address_and_secret() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = Arc::new(std::sync::Mutex::new(Vec::new()));
        let subscriber =
            tracing_subscriber::registry().with(SpanFieldNames(Arc::clone(&names)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = SessionStore::configure(
            2,
            "redis://:hunter2@cache:not-a-port",
            TEST_SESSION_SECRET,
        )
        .await;
        assert!(matches!(result, Err(AppError::SessionStore(_))));

        let names = names.lock().unwrap();
        assert_eq!(names.as_slice(), ["pool_size"]);
    }

    #[test]
    fn test_with_cookie_policy() {
        let policy = CookiePolicy {
            same_site: SameSite::Lax,
            ..CookiePolicy::default()
        };
        let store = store().with_cookie_policy(policy.clone());
        assert_eq!(store.policy(), &policy);
    }
}
