//! HTTP server and routes.

mod auth;
mod handlers;
mod state;

pub use state::AppState;

use axum::{Router, middleware, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let book_routes = Router::new()
        .route("/", get(handlers::books_index))
        .route("/{id}", get(handlers::book_show))
        .route("/{id}/download", get(handlers::book_download))
        .route("/{id}/cover", get(handlers::book_cover));

    let api_routes = Router::new()
        .nest("/books", book_routes)
        .route("/stats", get(handlers::api_stats));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_token,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
