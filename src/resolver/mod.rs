//! Resolver Module
//!
//! Fetch-once resolvers that gate route activation until their data is
//! available, then serve the cached value without fetching again.

mod fetch;
mod singleton;
mod state;
mod stats;


// Re-export public types
pub use fetch::{Fetch, FnFetch};
pub use singleton::{AsyncValue, SingletonResolve};
pub use state::RequestState;
pub use stats::ResolveStats;
