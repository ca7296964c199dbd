//! Resolver Statistics Module
//!
//! Tracks how accesses to a resolver were served: fresh fetch cycles,
//! joins onto an in-flight cycle, or cache hits.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::resolver::RequestState;

// == Resolve Stats ==
/// Per-resolver access metrics.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveStats {
    /// Number of fetch cycles started
    pub fetches: u64,
    /// Number of fetch cycles that failed or were abandoned
    pub failures: u64,
    /// Number of accesses served from the cached value
    pub cache_hits: u64,
    /// Number of accesses that joined an in-flight cycle
    pub joins: u64,
    /// When the cached value was stored
    pub resolved_at: Option<DateTime<Utc>>,
    /// Request state at the time of the snapshot
    pub state: RequestState,
}

impl Default for ResolveStats {
    fn default() -> Self {
        Self {
            fetches: 0,
            failures: 0,
            cache_hits: 0,
            joins: 0,
            resolved_at: None,
            state: RequestState::Idle,
        }
    }
}

impl ResolveStats {
    // == Constructor ==
    /// Creates a new ResolveStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Accesses ==
    /// Total number of accesses, however they were served.
    pub fn accesses(&self) -> u64 {
        self.fetches + self.joins + self.cache_hits
    }

    // == Hit Rate ==
    /// Fraction of accesses served from the cached value.
    ///
    /// Returns 0.0 if no accesses have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_join(&mut self) {
        self.joins += 1;
    }

    pub fn record_resolved(&mut self, at: DateTime<Utc>) {
        self.resolved_at = Some(at);
    }
}
