use axum::{
    routing::{get, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    let catalogue_routes = Router::new()
        .route(
            "/livros",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/livros/:id",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        .route(
            "/categorias",
            get(handlers::categories::list_categories)
                .post(handlers::categories::create_category),
        )
        .route(
            "/categorias/:id",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        );

    let operational_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/store", get(handlers::health::store_health))
        .route("/metrics", get(handlers::metrics::metrics_handler));

    Router::new()
        .merge(catalogue_routes)
        .merge(operational_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors),
        )
        .with_state(state)
}
