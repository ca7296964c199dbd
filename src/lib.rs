//! Singleton Resolve - fetch-once route data resolvers
//!
//! Route activation is gated on resolvers that fetch their data once, share
//! the in-flight fetch between concurrent navigations, cache the value for
//! good on success and allow a fresh attempt after a failure.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod resolver;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::ResolveError;
pub use navigation::Navigator;
pub use resolver::{AsyncValue, Fetch, RequestState, SingletonResolve};
pub use tasks::spawn_warmup_task;
