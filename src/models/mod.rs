//! Response models for the navigation API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    ErrorResponse, HealthResponse, PrefetchResponse, RouteDataResponse, RouteStats,
    RouteSummary, RoutesResponse, StatsResponse,
};
