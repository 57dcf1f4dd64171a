use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

/// Builds the service router. The body limit also caps the uploaded file size.
pub fn app(config: &config::Config) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(routes::upload::routes())
        .layer(DefaultBodyLimit::max(config.max_file_size))
        .layer(TraceLayer::new_for_http())
}
