//! Error types for resolvers and the navigation layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Resolve Error Enum ==
/// Unified error type for resolution and navigation.
///
/// `Clone` because a single failed fetch cycle is delivered to every
/// accessor that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The underlying fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The fetch task ended without producing an outcome
    #[error("Fetch abandoned: {0}")]
    Abandoned(String),

    /// No resolver is registered for the route
    #[error("Route not found: {0}")]
    RouteNotFound(String),
}

impl ResolveError {
    /// Builds a `Fetch` error from a fetch implementation's error chain.
    pub fn fetch(err: anyhow::Error) -> Self {
        ResolveError::Fetch(format!("{:#}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match &self {
            ResolveError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ResolveError::Abandoned(_) => StatusCode::SERVICE_UNAVAILABLE,
            ResolveError::RouteNotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;
