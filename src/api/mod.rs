//! API layer - HTTP routing
//!
//! This module assembles the application router:
//! - The HTML screens (see [`crate::views`])
//! - The read-only JSON API under `/api/v1`
//! - Embedded static assets under `/static/`
//!
//! and the shared request plumbing in [`middleware`].

pub mod common;
pub mod middleware;
pub mod newspapers;
pub mod redactors;
pub mod responses;
pub mod site;
pub mod static_files;
pub mod topics;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::views;

pub use middleware::{ApiError, AppState};

/// Build the JSON API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/topics", topics::router())
        .nest("/newspapers", newspapers::router())
        .nest("/redactors", redactors::router())
        .merge(site::router())
        .fallback(api_not_found)
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Not found")
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin '{}': {}", cors_origin, e);
            cors
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .merge(views::router())
        .nest("/api/v1", build_api_router().layer(cors))
        .route("/static/{*path}", get(static_files::serve_static))
        // Error pages need the visitor, so the session loader wraps them
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            views::render_error_pages,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
