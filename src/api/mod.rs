use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::query_engine::SearchEngine;

pub mod error;
pub mod handlers;
pub mod models;

pub fn create_router(engine: Arc<SearchEngine>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/search",
            get(handlers::search_get).post(handlers::search_post),
        )
        .route("/health", get(handlers::health))
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
