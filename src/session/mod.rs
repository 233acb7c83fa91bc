// Public API - what other modules can use
pub use cookie::{CookiePolicy, API_ROOT, SESSION_COOKIE_NAME, SESSION_MAX_AGE_SECONDS};
pub use extractor::Session;
pub use models::{SessionData, SessionKey, USER_EMAIL};
pub use repository::SessionRepository;
pub use store::{SessionStore, MIN_SESSION_SECRET_LENGTH};

// Internal modules
mod cookie;
mod extractor;
pub mod models;
pub mod repository;
mod store;
