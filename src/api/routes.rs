//! API Routes
//!
//! Configures the Axum router with all navigation endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, prefetch_handler, route_handler, routes_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /routes` - List routes and their request state
/// - `GET /routes/:name` - Activate a route and return its data
/// - `POST /routes/:name/prefetch` - Start a route's fetch without waiting
/// - `GET /stats` - Resolver statistics per route
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/routes", get(routes_handler))
        .route("/routes/:name", get(route_handler))
        .route("/routes/:name/prefetch", post(prefetch_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
