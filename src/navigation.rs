//! Navigation Module
//!
//! Route table whose activation is gated by each route's resolver.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ResolveError, Result};
use crate::resolver::{RequestState, ResolveStats, SingletonResolve};
use crate::upstream::{build_client, HttpFetch};

/// Data produced by a route resolver.
pub type RouteData = Value;

// == Navigator ==
/// Maps route names to the resolvers that must succeed before the route
/// can be activated.
#[derive(Default, Clone)]
pub struct Navigator {
    routes: BTreeMap<String, SingletonResolve<RouteData>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one upstream-backed resolver per configured route.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_client(config.fetch_timeout)?;
        let mut navigator = Self::new();

        for route in &config.routes {
            let fetch = HttpFetch::new(client.clone(), route.url.clone());
            navigator.register(SingletonResolve::new(route.name.clone(), fetch));
            info!("Route '{}' registered for {}", route.name, route.url);
        }

        Ok(navigator)
    }

    /// Registers `resolver` under its own name, replacing any previous one.
    pub fn register(&mut self, resolver: SingletonResolve<RouteData>) {
        self.routes.insert(resolver.name().to_string(), resolver);
    }

    pub fn get(&self, route: &str) -> Option<&SingletonResolve<RouteData>> {
        self.routes.get(route)
    }

    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    // == Activate ==
    /// Waits for the route's data, propagating the resolver's failure.
    pub async fn activate(&self, route: &str) -> Result<RouteData> {
        let resolver = self.resolver(route)?;
        debug!("Activating route '{}' ({:?})", route, resolver.state());
        resolver.resolve_for_navigation().await
    }

    // == Prefetch ==
    /// Starts the route's fetch if needed without waiting for it.
    pub fn prefetch(&self, route: &str) -> Result<RequestState> {
        let resolver = self.resolver(route)?;
        let _ = resolver.access();
        Ok(resolver.state())
    }

    /// Route states, in route name order.
    pub fn states(&self) -> Vec<(String, RequestState)> {
        self.routes
            .iter()
            .map(|(name, resolver)| (name.clone(), resolver.state()))
            .collect()
    }

    /// Resolver statistics keyed by route name.
    pub fn stats(&self) -> BTreeMap<String, ResolveStats> {
        self.routes
            .iter()
            .map(|(name, resolver)| (name.clone(), resolver.stats()))
            .collect()
    }

    fn resolver(&self, route: &str) -> Result<&SingletonResolve<RouteData>> {
        self.routes
            .get(route)
            .ok_or_else(|| ResolveError::RouteNotFound(route.to_string()))
    }
}
