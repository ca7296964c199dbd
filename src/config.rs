//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use tracing::warn;

/// A route whose data is fetched from an upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route name used in `/routes/:name`
    pub name: String,
    /// Upstream URL returning the route's JSON data
    pub url: String,
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Routes gated by a resolver
    pub routes: Vec<RouteConfig>,
    /// Upstream request timeout in seconds
    pub fetch_timeout: u64,
    /// Seconds between warm-up retries, 0 disables warm-up
    pub warmup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ROUTES` - Comma-separated `name=url` pairs (default: none)
    /// - `FETCH_TIMEOUT` - Upstream request timeout in seconds (default: 10)
    /// - `WARMUP_INTERVAL` - Warm-up retry interval in seconds, 0 = off (default: 0)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            routes: env::var("ROUTES")
                .map(|v| parse_routes(&v))
                .unwrap_or_default(),
            fetch_timeout: env::var("FETCH_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            warmup_interval: env::var("WARMUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            routes: Vec::new(),
            fetch_timeout: 10,
            warmup_interval: 0,
        }
    }
}

/// Parses `name=url` pairs separated by commas.
///
/// Malformed pairs and duplicate names are skipped with a warning; the first
/// occurrence of a name wins.
pub fn parse_routes(raw: &str) -> Vec<RouteConfig> {
    let mut routes: Vec<RouteConfig> = Vec::new();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, url)) = pair.split_once('=') else {
            warn!("Ignoring route without '=': {}", pair);
            continue;
        };

        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            warn!("Ignoring route with empty name or url: {}", pair);
            continue;
        }

        if routes.iter().any(|r| r.name == name) {
            warn!("Ignoring duplicate route: {}", name);
            continue;
        }

        routes.push(RouteConfig {
            name: name.to_string(),
            url: url.to_string(),
        });
    }

    routes
}
