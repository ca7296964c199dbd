//! Resolver State Module
//!
//! The request state machine behind a `SingletonResolve`. All transitions
//! happen through `ResolverState` while the owner holds its lock.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::ResolveError;
use crate::resolver::ResolveStats;

// == Request State ==
/// Lifecycle of a resolver's fetch.
///
/// `Idle -> InFlight` when a fetch is requested, `InFlight -> Done` on
/// success and `InFlight -> Idle` on failure. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    InFlight,
    Done,
}

// == Outcome ==
/// Value carried by a fetch cycle's broadcast channel.
#[derive(Debug, Clone)]
pub(crate) enum Outcome<T> {
    /// Cycle still running; never surfaced to accessors
    Pending,
    Resolved(T),
    Failed(ResolveError),
}

impl<T> Outcome<T> {
    pub(crate) fn is_settled(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

// == Access ==
/// What an access found when it inspected the state.
pub(crate) enum Access<T> {
    /// A value is cached
    Cached(T),
    /// A cycle is already running; follow its channel
    Joined(watch::Receiver<Outcome<T>>),
    /// A new cycle was started; the caller must run the fetch and settle it
    Started {
        cycle: u64,
        receiver: watch::Receiver<Outcome<T>>,
    },
}

enum Slot<T> {
    Idle,
    InFlight {
        cycle: u64,
        sender: watch::Sender<Outcome<T>>,
    },
    Done(T),
}

// == Resolver State ==
/// Request state, cached value and statistics of one resolver.
///
/// The in-flight slot owns the cycle's sender, so settling a cycle and
/// notifying its waiters happen in the same transition.
pub(crate) struct ResolverState<T> {
    slot: Slot<T>,
    next_cycle: u64,
    stats: ResolveStats,
}

impl<T> ResolverState<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Slot::Idle,
            next_cycle: 0,
            stats: ResolveStats::new(),
        }
    }

    pub(crate) fn request_state(&self) -> RequestState {
        match self.slot {
            Slot::Idle => RequestState::Idle,
            Slot::InFlight { .. } => RequestState::InFlight,
            Slot::Done(_) => RequestState::Done,
        }
    }

    /// The cached value, if a cycle has succeeded.
    pub(crate) fn value(&self) -> Option<&T> {
        match &self.slot {
            Slot::Done(value) => Some(value),
            _ => None,
        }
    }

    /// Number of handles still subscribed to the in-flight cycle.
    pub(crate) fn waiters(&self) -> usize {
        match &self.slot {
            Slot::InFlight { sender, .. } => sender.receiver_count(),
            _ => 0,
        }
    }

    // == Abandon ==
    /// Returns an unsettled `cycle` to `Idle`, failing its waiters with `err`.
    ///
    /// Returns true if the cycle was still in flight.
    pub(crate) fn abandon(&mut self, cycle: u64, err: ResolveError) -> bool {
        let Some(sender) = self.take_current(cycle) else {
            return false;
        };
        self.stats.record_failure();
        sender.send_replace(Outcome::Failed(err));
        true
    }

    pub(crate) fn stats(&self) -> ResolveStats {
        let mut stats = self.stats.clone();
        stats.state = self.request_state();
        stats
    }

    /// Moves the slot back to `Idle` if `cycle` is the one in flight,
    /// handing back its sender.
    fn take_current(&mut self, cycle: u64) -> Option<watch::Sender<Outcome<T>>> {
        if !matches!(self.slot, Slot::InFlight { cycle: c, .. } if c == cycle) {
            return None;
        }
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::InFlight { sender, .. } => Some(sender),
            _ => None,
        }
    }
}

impl<T: Clone> ResolverState<T> {
    // == Access ==
    /// Serves an access, starting a new cycle only from `Idle`.
    pub(crate) fn access(&mut self) -> Access<T> {
        if let Slot::Done(value) = &self.slot {
            self.stats.record_hit();
            return Access::Cached(value.clone());
        }

        if let Slot::InFlight { sender, .. } = &self.slot {
            self.stats.record_join();
            return Access::Joined(sender.subscribe());
        }

        let cycle = self.next_cycle;
        self.next_cycle += 1;

        let (sender, receiver) = watch::channel(Outcome::Pending);
        self.slot = Slot::InFlight { cycle, sender };
        self.stats.record_fetch();

        Access::Started { cycle, receiver }
    }

    // == Complete ==
    /// Settles `cycle` with the fetch result and notifies its waiters.
    ///
    /// Success stores the value and moves to `Done`; failure returns to `Idle`
    /// without storing anything. Returns false if `cycle` is not in flight.
    pub(crate) fn complete(&mut self, cycle: u64, result: Result<T, ResolveError>) -> bool {
        let Some(sender) = self.take_current(cycle) else {
            return false;
        };

        let outcome = match result {
            Ok(value) => {
                self.slot = Slot::Done(value.clone());
                self.stats.record_resolved(Utc::now());
                Outcome::Resolved(value)
            }
            Err(err) => {
                self.stats.record_failure();
                Outcome::Failed(err)
            }
        };
        sender.send_replace(outcome);
        true
    }
}
