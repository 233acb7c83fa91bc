// Library crate for the realty backend
// This file exposes the public API for integration tests

pub mod config;
pub mod extractors;
pub mod routes;
pub mod session;
pub mod shared;
pub mod startup;
pub mod store;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::Config;
pub use routes::app;
pub use session::{Session, SessionStore};
pub use shared::{AppError, AppState};
