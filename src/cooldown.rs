//! Per-actor cooldown gating
//!
//! The CooldownGate prevents one actor from triggering a rate-limited action
//! more than once per configured window, across any number of concurrent
//! callers.
//!
//! # Algorithm
//!
//! - One timestamp is kept per actor: the instant of the last granted
//!   acquisition.
//! - An acquisition is granted when no timestamp exists or the window has
//!   fully elapsed; the grant records a new timestamp.
//! - A denied acquisition leaves the timestamp untouched, so hammering the
//!   gate never extends an actor's wait.
//!
//! # Implementation
//!
//! The map is guarded by a single `std::sync::Mutex`; the critical section is
//! one hash lookup and at most one insert, so contention is negligible even
//! with many simultaneous actors. Monotonic `Instant`s keep the window immune
//! to wall-clock adjustments. Entries idle for several windows are evicted so
//! the map does not grow without bound over the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Idle windows after which an actor's entry can no longer affect a grant
/// decision and is eligible for eviction
const STALE_AFTER_WINDOWS: u32 = 4;

/// Outcome of one acquisition attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquire {
    /// The action may proceed; the actor's window restarts now
    Granted,
    /// The actor is still inside its window
    Cooling {
        /// Time left until the next acquisition can succeed
        remaining: Duration,
    },
}

impl Acquire {
    /// Whether the acquisition succeeded.
    pub fn is_granted(&self) -> bool {
        matches!(self, Acquire::Granted)
    }
}

/// Per-actor rate limiter with an atomic check-and-set
///
/// For a fixed window W, two acquisitions for the same actor are never
/// granted less than W apart, no matter how many callers race.
pub struct CooldownGate {
    /// Minimum spacing between grants for one actor
    window: Duration,
    /// Last granted instant per actor
    last_granted: Mutex<HashMap<String, Instant>>,
}

impl CooldownGate {
    /// Create a gate with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_granted: Mutex::new(HashMap::new()),
        }
    }

    /// The configured window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Attempt an acquisition for `actor`.
    ///
    /// The check and the timestamp update happen under one lock hold, so a
    /// race between two simultaneous calls for the same actor grants exactly
    /// one of them.
    pub fn try_acquire(&self, actor: &str) -> Acquire {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(actor) {
            Some(&last) if now.duration_since(last) < self.window => Acquire::Cooling {
                remaining: self.window - now.duration_since(last),
            },
            _ => {
                entries.insert(actor.to_string(), now);
                Acquire::Granted
            }
        }
    }

    /// Time left before `actor` may acquire again, if it is cooling down.
    ///
    /// Read-only: never records or extends anything.
    pub fn remaining(&self, actor: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.lock();
        entries.get(actor).and_then(|&last| {
            let elapsed = now.duration_since(last);
            (elapsed < self.window).then(|| self.window - elapsed)
        })
    }

    /// Drop entries idle for at least [`STALE_AFTER_WINDOWS`] windows.
    ///
    /// Such entries would be granted anyway, so removing them changes no
    /// decision. Returns how many entries were evicted.
    pub fn evict_stale(&self) -> usize {
        let cutoff = self.window * STALE_AFTER_WINDOWS;
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, last| now.duration_since(*last) < cutoff);
        before - entries.len()
    }

    /// Spawn a background sweeper running [`evict_stale`](Self::evict_stale)
    /// every `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = self.evict_stale();
                        if evicted > 0 {
                            tracing::debug!(evicted, "evicted stale cooldown entries");
                        }
                    }
                    _ = cancel.cancelled() => {
                        tracing::debug!("cooldown sweeper shutting down");
                        return;
                    }
                }
            }
        })
    }

    /// A poisoned lock only means another caller panicked mid-lookup; the
    /// map itself is still coherent, so recover rather than propagate.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        self.last_granted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
