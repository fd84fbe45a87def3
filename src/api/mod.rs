//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;
mod state;

pub use routes::wallet_routes;
pub use state::AppState;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check (no identity)
        .route("/health", get(health_check))
        .nest("/api/v1/wallet", wallet_routes())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
