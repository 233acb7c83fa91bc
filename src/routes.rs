use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::session::API_ROOT;
use crate::shared::AppState;
use crate::user;

/// Routes served under the API root
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(user::create_user))
        .route("/users/:email", get(user::get_user))
        .route("/dashboard", get(user::dashboard))
}

/// The complete application with tracing, bound to `state`
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_ROOT, api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
