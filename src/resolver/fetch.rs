//! Fetch Module
//!
//! The retrieval a resolver wraps. Each concrete resolver supplies one.

use std::future::Future;

use async_trait::async_trait;

// == Fetch Trait ==
/// A one-shot asynchronous retrieval of a `T`.
///
/// Called at most once per fetch cycle: never while a previous call is
/// pending and never once a value is cached. Retry and timeout policy, if
/// any, belong to the implementation.
#[async_trait]
pub trait Fetch<T>: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<T>;
}

// == Closure Adapter ==
/// Adapts a closure returning a future into a `Fetch`.
pub struct FnFetch<F>(pub F);

#[async_trait]
impl<T, F, Fut> Fetch<T> for FnFetch<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    async fn fetch(&self) -> anyhow::Result<T> {
        (self.0)().await
    }
}
