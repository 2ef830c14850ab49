//! Fixed-window rate limiting keyed by client fingerprint.
//!
//! The store and clock are injectable so tests run against a fresh
//! table and a manual clock instead of shared process state. A single
//! lock guards each check's read-modify-write, so concurrent requests
//! from the same client cannot undercount.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use gateway_core::limits::{RATE_LIMIT_CEILING, RATE_LIMIT_WINDOW_MS};

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,
    /// Requests admitted per client per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_window_ms() -> i64 {
    RATE_LIMIT_WINDOW_MS
}

fn default_max_requests() -> u32 {
    RATE_LIMIT_CEILING
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
        }
    }
}

/// A per-client window entry.
///
/// Stale entries are overwritten on next access, not deleted; a
/// background sweep prunes long-idle clients.
#[derive(Debug, Clone, Copy)]
pub struct WindowEntry {
    pub count: u32,
    pub reset_at_ms: i64,
}

/// Storage for window entries.
///
/// In-memory in this process. The table neither survives restarts nor
/// coordinates across instances; multi-instance deployments need a
/// shared external store behind this interface.
pub trait WindowStore: Send + Sync {
    fn get(&mut self, key: &str) -> Option<WindowEntry>;
    fn set(&mut self, key: &str, entry: WindowEntry);
    /// Drop entries whose window ended before `cutoff_ms`.
    fn prune(&mut self, cutoff_ms: i64);
}

/// HashMap-backed store.
#[derive(Default)]
pub struct InMemoryStore {
    entries: HashMap<String, WindowEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for InMemoryStore {
    fn get(&mut self, key: &str) -> Option<WindowEntry> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: &str, entry: WindowEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    fn prune(&mut self, cutoff_ms: i64) {
        self.entries.retain(|_, entry| entry.reset_at_ms >= cutoff_ms);
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted { remaining: u32 },
    Rejected { retry_after_secs: u64 },
}

/// Fixed-window rate limiter.
pub struct FixedWindowLimiter {
    store: Mutex<Box<dyn WindowStore>>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_parts(config, Box::new(InMemoryStore::new()), Arc::new(SystemClock))
    }

    /// Create a limiter with an injected store and clock.
    pub fn with_parts(
        config: RateLimitConfig,
        store: Box<dyn WindowStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            config,
            clock,
        }
    }

    /// Check whether a request from `key` is admitted.
    ///
    /// No entry or an elapsed window resets the entry to count 1; an
    /// entry under the ceiling increments; an entry at the ceiling
    /// rejects until the window ends. The store lock serializes the
    /// whole read-modify-write.
    pub fn check(&self, key: &str) -> Decision {
        let now = self.clock.now_ms();
        let mut store = self.store.lock();

        match store.get(key) {
            Some(entry) if now <= entry.reset_at_ms => {
                if entry.count >= self.config.max_requests {
                    let remaining_ms = (entry.reset_at_ms - now).max(0) as u64;
                    return Decision::Rejected {
                        retry_after_secs: remaining_ms.div_ceil(1000),
                    };
                }
                let count = entry.count + 1;
                store.set(
                    key,
                    WindowEntry {
                        count,
                        reset_at_ms: entry.reset_at_ms,
                    },
                );
                Decision::Admitted {
                    remaining: self.config.max_requests - count,
                }
            }
            _ => {
                store.set(
                    key,
                    WindowEntry {
                        count: 1,
                        reset_at_ms: now + self.config.window_ms,
                    },
                );
                Decision::Admitted {
                    remaining: self.config.max_requests - 1,
                }
            }
        }
    }

    /// Drop entries that have been stale for more than one window.
    pub fn cleanup_stale(&self) {
        let cutoff = self.clock.now_ms() - self.config.window_ms;
        self.store.lock().prune(cutoff);
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<FixedWindowLimiter>;

/// Interval between stale-entry sweeps.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);
