//! Axum router configuration with middleware.
//!
//! Management routes live under `/api/v1/`. Published forms are served at
//! `/public/form/{id}`, matching the public URL convention.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/forms",
            get(handlers::form::list_forms).post(handlers::form::create_form),
        )
        .route(
            "/forms/{id}",
            get(handlers::form::get_form).put(handlers::form::update_form),
        )
        .route(
            "/forms/{id}/publish",
            post(handlers::form::publish_form).delete(handlers::form::unpublish_form),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/public/form/{id}", get(handlers::public::get_public_form))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
