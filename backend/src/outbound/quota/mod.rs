//! Process-local sync quota adapter.
//!
//! Tracks aggregator pulls per external account id against a rolling window
//! held in process memory. Counters do not survive restarts and are not
//! shared across instances; a horizontally scaled deployment should back
//! the `SyncQuota` port with shared storage instead.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::ports::SyncQuota;

/// Pulls permitted per key within one window.
pub const DEFAULT_PULL_LIMIT: u32 = 4;

/// Window length in hours.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

struct WindowCounter {
    window_started_at: DateTime<Utc>,
    used: u32,
}

/// In-memory [`SyncQuota`] implementation.
pub struct InMemorySyncQuota {
    limit: u32,
    window: Duration,
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl Default for InMemorySyncQuota {
    fn default() -> Self {
        Self::new(DEFAULT_PULL_LIMIT, Duration::hours(DEFAULT_WINDOW_HOURS))
    }
}

impl InMemorySyncQuota {
    /// Build a quota with an explicit limit and window.
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn with_counters<T>(&self, f: impl FnOnce(&mut HashMap<String, WindowCounter>) -> T) -> T {
        // A poisoned lock only means another thread panicked mid-update;
        // the counter map itself stays usable.
        let mut guard = self
            .counters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    fn consume_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let window = self.window;
        let limit = self.limit;
        self.with_counters(|counters| {
            let counter = counters.entry(key.to_owned()).or_insert(WindowCounter {
                window_started_at: now,
                used: 0,
            });
            if now - counter.window_started_at >= window {
                counter.window_started_at = now;
                counter.used = 0;
            }
            if counter.used < limit {
                counter.used += 1;
                true
            } else {
                false
            }
        })
    }

    fn remaining_at(&self, key: &str, now: DateTime<Utc>) -> u32 {
        let window = self.window;
        let limit = self.limit;
        self.with_counters(|counters| match counters.get(key) {
            Some(counter) if now - counter.window_started_at < window => {
                limit.saturating_sub(counter.used)
            }
            _ => limit,
        })
    }
}

#[async_trait]
impl SyncQuota for InMemorySyncQuota {
    async fn check_and_consume(&self, key: &str) -> bool {
        self.consume_at(key, Utc::now())
    }

    async fn remaining(&self, key: &str) -> u32 {
        self.remaining_at(key, Utc::now())
    }

    async fn reset(&self, key: &str) {
        self.with_counters(|counters| {
            counters.remove(key);
        });
    }
}
