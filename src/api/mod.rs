//! API Module
//!
//! HTTP handlers and routing for the navigation API.
//!
//! # Endpoints
//! - `GET /routes` - List routes and their request state
//! - `GET /routes/:name` - Activate a route and return its data
//! - `POST /routes/:name/prefetch` - Start a route's fetch without waiting
//! - `GET /stats` - Resolver statistics per route
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
