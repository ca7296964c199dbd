//! Route Warm-up Task
//!
//! Background task that resolves every route ahead of the first navigation.
//! Resolvers never retry on their own; this task re-accesses failed routes
//! until all of them hold a cached value.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::navigation::Navigator;

/// Spawns a background task that resolves all routes of `navigator`.
///
/// Each round resolves the routes that are not cached yet; routes that fail
/// are retried after `retry_interval_secs`. The task exits once every route
/// has resolved.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let navigator = Arc::new(Navigator::from_config(&config)?);
/// let warmup_handle = spawn_warmup_task(navigator.clone(), 5);
/// // Later, during shutdown:
/// warmup_handle.abort();
/// ```
pub fn spawn_warmup_task(navigator: Arc<Navigator>, retry_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(retry_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting route warm-up for {} routes, retry interval {} seconds",
            navigator.len(),
            retry_interval_secs
        );

        let mut pending: Vec<String> = navigator.route_names().map(str::to_string).collect();
        let mut round = 0u64;

        while !pending.is_empty() {
            round += 1;
            let mut failed = Vec::new();

            for route in pending {
                match navigator.activate(&route).await {
                    Ok(_) => debug!("Warm-up: route '{}' resolved", route),
                    Err(err) => {
                        warn!("Warm-up: route '{}' failed: {}", route, err);
                        failed.push(route);
                    }
                }
            }

            pending = failed;
            if pending.is_empty() {
                break;
            }

            info!(
                "Warm-up round {}: {} routes pending, retrying in {} seconds",
                round,
                pending.len(),
                retry_interval_secs
            );
            tokio::time::sleep(interval).await;
        }

        info!("Route warm-up complete");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{RequestState, SingletonResolve};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_warmup_resolves_all_routes() {
        let mut navigator = Navigator::new();
        navigator.register(SingletonResolve::from_fn("accounts", || async {
            Ok::<_, anyhow::Error>(json!([]))
        }));
        navigator.register(SingletonResolve::from_fn("banners", || async {
            Ok::<_, anyhow::Error>(json!({"text": "welcome"}))
        }));
        let navigator = Arc::new(navigator);

        spawn_warmup_task(navigator.clone(), 1).await.unwrap();

        for (_, state) in navigator.states() {
            assert_eq!(state, RequestState::Done);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_warmup_retries_failed_routes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut navigator = Navigator::new();
        navigator.register(SingletonResolve::from_fn("flaky", move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    anyhow::bail!("upstream unavailable");
                }
                Ok(json!({"call": call}))
            }
        }));
        let navigator = Arc::new(navigator);

        spawn_warmup_task(navigator.clone(), 5).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let resolver = navigator.get("flaky").unwrap();
        assert_eq!(resolver.peek(), Some(json!({"call": 2})));
        assert_eq!(resolver.stats().failures, 2);
    }

    #[tokio::test]
    async fn test_warmup_with_no_routes_finishes() {
        let handle = spawn_warmup_task(Arc::new(Navigator::new()), 1);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_warmup_can_be_aborted() {
        let mut navigator = Navigator::new();
        navigator.register(SingletonResolve::from_fn("hung", || async {
            std::future::pending::<()>().await;
            Ok::<_, anyhow::Error>(json!(null))
        }));

        let handle = spawn_warmup_task(Arc::new(navigator), 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
