//! services/api/src/web/router.rs
//!
//! Builds the application router shared by the server binary and the tests.

use axum::{
    middleware as axum_middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::web::middleware::require_user;
use crate::web::rest::{
    day_access_handler, health_handler, list_sessions_handler, save_answers_handler,
    submit_session_handler, track_progress_handler, watch_status_handler,
};
use crate::web::state::AppState;

/// All API routes with the identity middleware and request tracing applied.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no caller identity required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (x-user-id required)
    let protected_routes = Router::new()
        .route("/track", put(track_progress_handler))
        .route("/status", get(watch_status_handler))
        .route("/access", get(day_access_handler))
        .route(
            "/sessions",
            get(list_sessions_handler).post(submit_session_handler),
        )
        .route("/profile/answers", put(save_answers_handler))
        .layer(axum_middleware::from_fn(require_user));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
