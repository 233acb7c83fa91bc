use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use realty_backend::{
    app,
    session::{repository::InMemorySessionRepository, SessionStore, USER_EMAIL},
    user::repository::{InMemoryUserRepository, UserRepository},
    AppState,
};

pub const TEST_SESSION_SECRET: &[u8] = b"integration-test-secret-of-sufficient-length";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }
}

pub struct TestApp {
    pub router: Router,
    pub sessions: SessionStore,
    pub users: Arc<InMemoryUserRepository>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse { status, body }
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// Saves a session through the public session API and returns the
    /// Cookie header a browser would send back.
    pub async fn login_cookie(&self, email: Option<&str>) -> String {
        let mut session = self.sessions.start();
        if let Some(email) = email {
            session.insert(USER_EMAIL, &email.to_string()).unwrap();
        }
        let jar = session
            .save(SignedCookieJar::new(self.sessions.key().clone()))
            .await
            .unwrap();

        let response = jar.into_response();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

pub struct TestAppBuilder {
    users: Arc<InMemoryUserRepository>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }

    pub fn build(self) -> TestApp {
        let sessions = SessionStore::new(
            Arc::new(InMemorySessionRepository::new()),
            TEST_SESSION_SECRET,
        )
        .unwrap();
        let user_repository: Arc<dyn UserRepository + Send + Sync> = self.users.clone();
        let state = AppState::new(user_repository, sessions.clone());

        TestApp {
            router: app(state),
            sessions,
            users: self.users,
        }
    }
}
