//! Response DTOs for the navigation API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::resolver::{RequestState, ResolveStats};

/// Response body for an activated route (GET /routes/:name)
#[derive(Debug, Clone, Serialize)]
pub struct RouteDataResponse {
    /// The activated route
    pub route: String,
    /// The route's resolved data
    pub data: Value,
}

impl RouteDataResponse {
    pub fn new(route: impl Into<String>, data: Value) -> Self {
        Self {
            route: route.into(),
            data,
        }
    }
}

/// One entry of the route listing
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub name: String,
    pub state: RequestState,
}

/// Response body for the route listing (GET /routes)
#[derive(Debug, Clone, Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteSummary>,
}

impl RoutesResponse {
    /// Creates a listing from `(name, state)` pairs
    pub fn new(states: Vec<(String, RequestState)>) -> Self {
        Self {
            routes: states
                .into_iter()
                .map(|(name, state)| RouteSummary { name, state })
                .collect(),
        }
    }
}

/// Response body for a prefetch (POST /routes/:name/prefetch)
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchResponse {
    /// The prefetched route
    pub route: String,
    /// Request state right after the prefetch
    pub state: RequestState,
}

impl PrefetchResponse {
    pub fn new(route: impl Into<String>, state: RequestState) -> Self {
        Self {
            route: route.into(),
            state,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Resolver statistics keyed by route name
    pub routes: BTreeMap<String, RouteStats>,
}

/// Statistics of one route's resolver, with its hit rate
#[derive(Debug, Clone, Serialize)]
pub struct RouteStats {
    #[serde(flatten)]
    pub stats: ResolveStats,
    /// Fraction of accesses served from the cached value
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(stats: BTreeMap<String, ResolveStats>) -> Self {
        Self {
            routes: stats
                .into_iter()
                .map(|(name, stats)| {
                    let hit_rate = stats.hit_rate();
                    (name, RouteStats { stats, hit_rate })
                })
                .collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
