//! Singleton Resolver Module
//!
//! Fetch-once, cache, and replay semantics for route data. The first access
//! starts a fetch (on a Tokio task when a runtime is available); accesses made
//! while it runs join that same cycle; once it succeeds the value is cached for
//! the life of the resolver.
//! A failed cycle is delivered to its waiters and then forgotten, so the next
//! access starts a fresh attempt.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ResolveError, Result};
use crate::resolver::state::{Access, Outcome, ResolverState};
use crate::resolver::{Fetch, FnFetch, RequestState, ResolveStats};

struct Inner<T> {
    name: String,
    fetcher: Box<dyn Fetch<T>>,
    state: Mutex<ResolverState<T>>,
}

// == Singleton Resolve ==
/// A cached, retryable single-fetch coordinator.
///
/// Cloning yields another handle to the same resolver.
pub struct SingletonResolve<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SingletonResolve<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SingletonResolve<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an idle resolver around `fetcher`. Nothing is fetched until
    /// the first access.
    pub fn new(name: impl Into<String>, fetcher: impl Fetch<T> + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher: Box::new(fetcher),
                state: Mutex::new(ResolverState::new()),
            }),
        }
    }

    /// Creates a resolver whose fetch is the given closure.
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::new(name, FnFetch(f))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // == Access ==
    /// Returns a handle to the (possibly not yet arrived) value.
    ///
    /// Starts a fetch cycle if none has succeeded and none is running. On a
    /// Tokio runtime the fetch is spawned right away. Without one, the
    /// returned handle drives the fetch itself when awaited; dropping that
    /// handle unawaited abandons the cycle and the resolver goes back to idle.
    pub fn access(&self) -> AsyncValue<T> {
        let access = self.inner.state.lock().access();
        match access {
            Access::Cached(value) => AsyncValue::ready(value),
            Access::Joined(receiver) => AsyncValue::pending(receiver),
            Access::Started { cycle, receiver } => {
                let driver = CycleGuard {
                    inner: Arc::clone(&self.inner),
                    cycle,
                    settled: false,
                };

                match Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn(driver.run());
                        AsyncValue::pending(receiver)
                    }
                    Err(_) => {
                        debug!(
                            resolver = %self.inner.name,
                            cycle,
                            "no runtime, fetch deferred to the handle"
                        );
                        AsyncValue::deferred(driver, receiver)
                    }
                }
            }
        }
    }

    // == Resolve For Navigation ==
    /// Waits for the value a route depends on.
    ///
    /// Completes immediately with the cached value when there is one. Otherwise
    /// yields exactly once, when the current cycle settles: the fetched value,
    /// or the cycle's error.
    pub async fn resolve_for_navigation(&self) -> Result<T> {
        let result = self.access().value().await;
        if let Err(err) = &result {
            debug!(resolver = %self.inner.name, error = %err, "navigation resolve failed");
        }
        result
    }

    /// The cached value, if any. Never starts a fetch.
    pub fn peek(&self) -> Option<T> {
        self.inner.state.lock().value().cloned()
    }

    pub fn state(&self) -> RequestState {
        self.inner.state.lock().request_state()
    }

    pub fn stats(&self) -> ResolveStats {
        self.inner.state.lock().stats()
    }

    /// Handles still waiting on the in-flight cycle; zero when none is running.
    pub fn waiters(&self) -> usize {
        self.inner.state.lock().waiters()
    }
}

// == Cycle Guard ==
/// Drives one fetch cycle. Dropping it unsettled (the fetch panicked, its
/// task was cancelled, or a deferred handle was never awaited) returns the
/// resolver to idle and fails the cycle's waiters.
struct CycleGuard<T> {
    inner: Arc<Inner<T>>,
    cycle: u64,
    settled: bool,
}

impl<T: Clone> CycleGuard<T> {
    async fn run(mut self) {
        let name = self.inner.name.clone();
        let cycle = self.cycle;
        debug!(resolver = %name, cycle, "fetch started");

        let result = self
            .inner
            .fetcher
            .fetch()
            .await
            .map_err(ResolveError::fetch);

        match &result {
            Ok(_) => info!(resolver = %name, cycle, "fetch succeeded, value cached"),
            Err(err) => warn!(
                resolver = %name,
                cycle,
                error = %err,
                "fetch failed, resolver back to idle"
            ),
        }

        self.settled = true;
        self.inner.state.lock().complete(cycle, result);
    }
}

impl<T> Drop for CycleGuard<T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let err = ResolveError::Abandoned(format!(
            "fetch for '{}' ended without an outcome",
            self.inner.name
        ));
        if self.inner.state.lock().abandon(self.cycle, err) {
            warn!(
                resolver = %self.inner.name,
                cycle = self.cycle,
                "fetch ended without an outcome, resolver back to idle"
            );
        }
    }
}

// == Async Value ==
/// Handle to a resolver's value, as returned by `SingletonResolve::access`.
///
/// Either already holds the cached value or follows one fetch cycle.
pub struct AsyncValue<T> {
    source: Source<T>,
}

enum Source<T> {
    Ready(T),
    Pending(watch::Receiver<Outcome<T>>),
    /// Started outside a runtime; the fetch runs when the handle is awaited
    Deferred {
        driver: CycleGuard<T>,
        receiver: watch::Receiver<Outcome<T>>,
    },
}

impl<T: Clone> AsyncValue<T> {
    fn ready(value: T) -> Self {
        Self {
            source: Source::Ready(value),
        }
    }

    fn pending(receiver: watch::Receiver<Outcome<T>>) -> Self {
        Self {
            source: Source::Pending(receiver),
        }
    }

    fn deferred(driver: CycleGuard<T>, receiver: watch::Receiver<Outcome<T>>) -> Self {
        Self {
            source: Source::Deferred { driver, receiver },
        }
    }

    /// The value, if the followed cycle has already succeeded.
    pub fn peek(&self) -> Option<T> {
        match &self.source {
            Source::Ready(value) => Some(value.clone()),
            Source::Pending(receiver) | Source::Deferred { receiver, .. } => {
                match &*receiver.borrow() {
                    Outcome::Resolved(value) => Some(value.clone()),
                    _ => None,
                }
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        match &self.source {
            Source::Ready(_) => true,
            Source::Pending(receiver) | Source::Deferred { receiver, .. } => {
                matches!(&*receiver.borrow(), Outcome::Resolved(_))
            }
        }
    }

    /// Waits for the cycle to settle.
    ///
    /// Consumes the handle, so its subscription is released once the outcome
    /// has been delivered.
    pub async fn value(self) -> Result<T> {
        let mut receiver = match self.source {
            Source::Ready(value) => return Ok(value),
            Source::Pending(receiver) => receiver,
            Source::Deferred { driver, receiver } => {
                driver.run().await;
                receiver
            }
        };

        let outcome = receiver
            .wait_for(Outcome::is_settled)
            .await
            .map(|outcome| (*outcome).clone());

        match outcome {
            Ok(Outcome::Resolved(value)) => Ok(value),
            Ok(Outcome::Failed(err)) => Err(err),
            Ok(Outcome::Pending) | Err(_) => Err(ResolveError::Abandoned(
                "fetch cycle closed without an outcome".to_string(),
            )),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_test::{assert_pending, assert_ready_ok};

    const TICK: Duration = Duration::from_millis(1);

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: u32,
    }

    struct ScriptedFetch {
        calls: Arc<AtomicUsize>,
        outcomes: Mutex<VecDeque<std::result::Result<Account, &'static str>>>,
    }

    #[async_trait]
    impl Fetch<Account> for ScriptedFetch {
        async fn fetch(&self) -> anyhow::Result<Account> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(TICK).await;
            let next = self.outcomes.lock().pop_front();
            match next {
                Some(Ok(account)) => Ok(account),
                Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
                None => Err(anyhow::anyhow!("no scripted outcome left")),
            }
        }
    }

    fn scripted(
        outcomes: Vec<std::result::Result<Account, &'static str>>,
    ) -> (SingletonResolve<Account>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = ScriptedFetch {
            calls: Arc::clone(&calls),
            outcomes: Mutex::new(outcomes.into()),
        };
        (SingletonResolve::new("accounts", fetcher), calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fetched_before_first_access() {
        let (resolver, calls) = scripted(vec![Ok(Account { id: 1 })]);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.state(), RequestState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_navigations_share_one_fetch() {
        let (resolver, calls) = scripted(vec![Ok(Account { id: 1 })]);

        let (first, second) = tokio::join!(
            resolver.resolve_for_navigation(),
            resolver.resolve_for_navigation()
        );

        assert_eq!(first.unwrap(), Account { id: 1 });
        assert_eq!(second.unwrap(), Account { id: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = resolver.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.joins, 1);
        assert_eq!(stats.state, RequestState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_accesses_before_completion_fetch_once() {
        let (resolver, calls) = scripted(vec![Ok(Account { id: 3 })]);

        let handles: Vec<_> = (0..8).map(|_| resolver.access()).collect();
        for handle in handles {
            assert_eq!(handle.value().await.unwrap(), Account { id: 3 });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failure() {
        let (resolver, calls) = scripted(vec![Err("E1"), Ok(Account { id: 2 })]);

        let err = resolver.resolve_for_navigation().await.unwrap_err();
        assert_eq!(err, ResolveError::Fetch("E1".to_string()));
        assert_eq!(resolver.state(), RequestState::Idle);
        assert!(resolver.peek().is_none());

        let account = resolver.resolve_for_navigation().await.unwrap();
        assert_eq!(account, Account { id: 2 });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_reaches_every_waiter() {
        let (resolver, calls) = scripted(vec![Err("upstream down")]);

        let (first, second) = tokio::join!(
            resolver.resolve_for_navigation(),
            resolver.resolve_for_navigation()
        );

        assert!(matches!(first, Err(ResolveError::Fetch(_))));
        assert!(matches!(second, Err(ResolveError::Fetch(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_accessor_reuses_cached_value() {
        let (resolver, calls) = scripted(vec![Ok(Account { id: 9 })]);

        assert_eq!(
            resolver.resolve_for_navigation().await.unwrap(),
            Account { id: 9 }
        );

        tokio::time::sleep(Duration::from_millis(10)).await;

        let handle = resolver.access();
        assert!(handle.is_resolved());
        assert_eq!(handle.peek(), Some(Account { id: 9 }));

        let mut late = tokio_test::task::spawn(resolver.resolve_for_navigation());
        assert_eq!(assert_ready_ok!(late.poll()), Account { id: 9 });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.stats().cache_hits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_not_ready_before_fetch_completes() {
        let (resolver, _calls) = scripted(vec![Ok(Account { id: 4 })]);

        let mut navigation = tokio_test::task::spawn(resolver.resolve_for_navigation());
        assert_pending!(navigation.poll());
        assert_eq!(resolver.state(), RequestState::InFlight);

        let handle = resolver.access();
        assert!(handle.peek().is_none());
        assert!(!handle.is_resolved());

        handle.value().await.unwrap();

        assert!(navigation.is_woken());
        assert_eq!(assert_ready_ok!(navigation.poll()), Account { id: 4 });
    }

    #[tokio::test]
    async fn test_panicking_fetch_does_not_wedge_resolver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolver = SingletonResolve::from_fn("flaky", move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    panic!("fetch task crashed");
                }
                Ok::<_, anyhow::Error>(5u32)
            }
        });

        let err = resolver.resolve_for_navigation().await.unwrap_err();
        assert!(matches!(err, ResolveError::Abandoned(_)));
        assert_eq!(resolver.state(), RequestState::Idle);

        assert_eq!(resolver.resolve_for_navigation().await.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let resolver = SingletonResolve::from_fn("shared", || async {
            Ok::<_, anyhow::Error>(String::new())
        });
        let other = resolver.clone();

        assert_eq!(resolver.resolve_for_navigation().await.unwrap(), "");
        assert_eq!(other.state(), RequestState::Done);
        assert_eq!(other.peek(), Some(String::new()));
        assert_eq!(other.name(), "shared");
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_releases_its_subscription() {
        let (resolver, _calls) = scripted(vec![Ok(Account { id: 6 })]);
        assert_eq!(resolver.waiters(), 0);

        let mut first = tokio_test::task::spawn(resolver.resolve_for_navigation());
        let mut second = tokio_test::task::spawn(resolver.resolve_for_navigation());
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        assert_eq!(resolver.waiters(), 2);

        drop(second);
        assert_eq!(resolver.waiters(), 1);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(first.is_woken());
        assert_eq!(assert_ready_ok!(first.poll()), Account { id: 6 });
        assert_eq!(resolver.waiters(), 0);
        assert_eq!(resolver.state(), RequestState::Done);
    }

    #[test]
    fn test_access_outside_runtime_defers_fetch_to_handle() {
        let (resolver, calls) = scripted(vec![Ok(Account { id: 7 })]);

        let handle = resolver.access();
        assert_eq!(resolver.state(), RequestState::InFlight);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let joiner = resolver.access();
        let (first, second) =
            tokio_test::block_on(async { tokio::join!(handle.value(), joiner.value()) });

        assert_eq!(first.unwrap(), Account { id: 7 });
        assert_eq!(second.unwrap(), Account { id: 7 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.state(), RequestState::Done);
        assert!(resolver.access().is_resolved());
    }

    #[test]
    fn test_unawaited_deferred_handle_abandons_cycle() {
        let (resolver, calls) = scripted(vec![Ok(Account { id: 8 })]);

        let handle = resolver.access();
        let joiner = resolver.access();
        drop(handle);

        assert_eq!(resolver.state(), RequestState::Idle);
        assert_eq!(resolver.stats().failures, 1);
        let err = tokio_test::block_on(joiner.value()).unwrap_err();
        assert!(matches!(err, ResolveError::Abandoned(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let account = tokio_test::block_on(resolver.resolve_for_navigation()).unwrap();
        assert_eq!(account, Account { id: 8 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
