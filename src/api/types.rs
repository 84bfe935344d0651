//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core_state::CoreState;
use crate::session::AuthenticatedStaff;

/// Failed logins allowed per username per minute.
const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;
const LOGIN_ATTEMPTS_PER_HOUR: u32 = 30;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific limiters.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    /// Per-client request limiter (keyed by token prefix).
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    /// Per-username limiter for failed logins.
    pub login_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
            login_limiter: Arc::new(Mutex::new(RateLimiter::with_limits(
                LOGIN_ATTEMPTS_PER_MINUTE,
                LOGIN_ATTEMPTS_PER_HOUR,
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Staff context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware. Also carries the raw token so logout can revoke it.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub staff: AuthenticatedStaff,
    pub token: String,
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-key sliding window
// ═══════════════════════════════════════════════════════════

/// Keys tracked at once before the least recently seen one is evicted.
const DEFAULT_MAX_KEYS: usize = 10_000;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);
const MINUTE: Duration = Duration::from_secs(60);

/// Sliding-window limiter with per-minute and per-hour limits per key.
///
/// Keys come from callers (usernames, session ids), so the map is bounded:
/// keys with no hit in the last hour are swept, and at `max_keys` the
/// least recently seen key is dropped to make room.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
    max_keys: usize,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(100, 1000)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
            max_keys: DEFAULT_MAX_KEYS,
            last_sweep: Instant::now(),
        }
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        self
    }

    /// Record a hit for `key`. Returns `Err(retry_after_secs)` if the key
    /// is over either limit; rejected hits are not recorded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&mut self, key: &str, now: Instant) -> Result<(), u64> {
        if now.saturating_duration_since(self.last_sweep) >= SWEEP_INTERVAL {
            self.sweep(now);
        }
        if !self.windows.contains_key(key) && self.windows.len() >= self.max_keys {
            self.sweep(now);
            if self.windows.len() >= self.max_keys {
                self.evict_least_recent();
            }
        }

        let entries = self.windows.entry(key.to_string()).or_default();
        entries.retain(|ts| now.saturating_duration_since(*ts) < HOUR);

        let last_minute = entries
            .iter()
            .filter(|ts| now.saturating_duration_since(**ts) < MINUTE)
            .count() as u32;
        let verdict = if last_minute >= self.per_minute {
            Err(60)
        } else if entries.len() as u32 >= self.per_hour {
            Err(3600)
        } else {
            entries.push(now);
            Ok(())
        };

        if entries.is_empty() {
            self.windows.remove(key);
        }
        verdict
    }

    /// Forget all hits for `key` (after a successful login).
    pub fn clear(&mut self, key: &str) {
        self.windows.remove(key);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drop every key whose hits are all older than an hour.
    fn sweep(&mut self, now: Instant) {
        self.windows.retain(|_, entries| {
            entries.retain(|ts| now.saturating_duration_since(*ts) < HOUR);
            !entries.is_empty()
        });
        self.last_sweep = now;
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .windows
            .iter()
            .min_by_key(|(_, entries)| entries.last().copied())
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.windows.remove(&key);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
