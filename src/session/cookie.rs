use axum_extra::extract::cookie::{Cookie, SameSite};

/// Name of the cookie carrying the signed session id
pub const SESSION_COOKIE_NAME: &str = "session";

/// Every API route lives under this prefix, and so does the session cookie
pub const API_ROOT: &str = "/api/v1";

/// Sessions live for three days
pub const SESSION_MAX_AGE_SECONDS: i64 = 3 * 24 * 60 * 60;

/// Attributes applied to every session cookie sent to the client
#[derive(Debug, Clone, PartialEq)]
pub struct CookiePolicy {
    pub path: String,
    pub max_age_seconds: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            path: API_ROOT.to_string(),
            max_age_seconds: SESSION_MAX_AGE_SECONDS,
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
        }
    }
}

impl CookiePolicy {
    /// How long the session backend keeps a saved session
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.max_age_seconds.max(0) as u64)
    }

    /// Builds the session cookie for `session_id` under this policy
    pub fn build_cookie(&self, session_id: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, session_id))
            .path(self.path.clone())
            .max_age(time::Duration::seconds(self.max_age_seconds))
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .build()
    }

    /// Cookie matching the session cookie's path, used to expire it
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .path(self.path.clone())
            .build()
    }
}
