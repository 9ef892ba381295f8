//! API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::ws::ws_handler;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Tracing layer with request timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/threads/{thread_id}/messages",
            post(handlers::load_thread_messages).get(handlers::stored_messages),
        )
        .route(
            "/api/threads/{thread_id}/check-updates",
            post(handlers::check_updates),
        )
        .route("/ws", get(ws_handler))
        .with_state(state)
        // The relay fronts a browser UI; end-user auth is out of scope, so
        // cross-origin access stays open.
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
}
