//! Router construction for the intake server.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/lookup", post(handlers::lookup::lookup))
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route("/api/sessions/:id", get(handlers::sessions::get_session))
        .route(
            "/api/sessions/:id/email",
            post(handlers::sessions::submit_email),
        )
        .route(
            "/api/sessions/:id/details",
            put(handlers::sessions::update_details),
        )
        .route(
            "/api/sessions/:id/submit",
            post(handlers::sessions::submit_details),
        )
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
