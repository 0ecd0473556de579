//! Axum router configuration with middleware.
//!
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health))
        // Thread messages
        .route(
            "/threads/{id}",
            get(handlers::thread::get_messages)
                .post(handlers::thread::append_message)
                .put(handlers::thread::save_messages)
                .delete(handlers::thread::clear_thread),
        )
        .route(
            "/threads/{id}/messages/{message_id}",
            delete(handlers::thread::delete_message),
        )
        // Ownership
        .route("/users", post(handlers::user::upsert_user))
        .route(
            "/users/{user_id}/threads",
            get(handlers::user::list_threads).post(handlers::user::create_thread),
        )
        .route(
            "/users/{user_id}/threads/{thread_id}",
            get(handlers::user::get_thread).patch(handlers::user::update_thread),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
