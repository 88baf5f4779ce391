//! API route definitions

use super::auth_handlers;
use super::handlers::{self, ServerState};
use crate::auth::middleware::require_session;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: ServerState) -> Router {
    // Everything here requires a valid session cookie
    let protected = Router::new()
        .route("/api/me", get(handlers::me))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Auth (public)
        // ====================================================================
        .route("/auth/providers", get(auth_handlers::list_providers))
        .route("/auth/{provider}/login", get(auth_handlers::login))
        .route("/auth/{provider}/callback", post(auth_handlers::callback))
        .route("/auth/logout", post(auth_handlers::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
