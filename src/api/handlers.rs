//! API Handlers
//!
//! HTTP request handlers for each navigation endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::{
    HealthResponse, PrefetchResponse, RouteDataResponse, RoutesResponse, StatsResponse,
};
use crate::navigation::Navigator;

/// Application state shared across all handlers.
///
/// Resolvers synchronize internally, so the navigator is shared without a lock.
#[derive(Clone)]
pub struct AppState {
    pub navigator: Arc<Navigator>,
}

impl AppState {
    /// Creates a new AppState around the given navigator.
    pub fn new(navigator: Navigator) -> Self {
        Self {
            navigator: Arc::new(navigator),
        }
    }

    /// Creates a new AppState from configuration, with one upstream-backed
    /// resolver per configured route.
    pub fn from_config(config: &crate::config::Config) -> anyhow::Result<Self> {
        Ok(Self::new(Navigator::from_config(config)?))
    }
}

/// Handler for GET /routes/:name
///
/// Activates the route: waits for its resolver and returns the data, or the
/// resolver's failure.
pub async fn route_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RouteDataResponse>> {
    let data = state.navigator.activate(&name).await?;
    Ok(Json(RouteDataResponse::new(name, data)))
}

/// Handler for POST /routes/:name/prefetch
///
/// Starts the route's fetch without waiting for it.
pub async fn prefetch_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PrefetchResponse>> {
    let request_state = state.navigator.prefetch(&name)?;
    Ok(Json(PrefetchResponse::new(name, request_state)))
}

/// Handler for GET /routes
pub async fn routes_handler(State(state): State<AppState>) -> Json<RoutesResponse> {
    Json(RoutesResponse::new(state.navigator.states()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.navigator.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
