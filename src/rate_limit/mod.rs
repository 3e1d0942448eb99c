//! Dual-window request rate limiting keyed by client identity.
//!
//! Each client has two sliding windows of request timestamps, one covering the
//! trailing minute and one the trailing hour. Stale timestamps are pruned lazily
//! on every check. Idle clients (both windows empty) are swept periodically on
//! the request path so the client map does not grow without bound.

use crate::error::{Result, VidlensError};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Which window rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateScope {
    Minute,
    Hour,
}

impl RateScope {
    /// Length of the sliding window for this scope.
    pub fn window(&self) -> Duration {
        match self {
            RateScope::Minute => MINUTE,
            RateScope::Hour => HOUR,
        }
    }
}

impl fmt::Display for RateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateScope::Minute => write!(f, "minute"),
            RateScope::Hour => write!(f, "hour"),
        }
    }
}

/// A request was rejected because one of the client's windows is full.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Rate limit exceeded: {limit} requests per {scope}")]
pub struct RateLimitExceeded {
    pub scope: RateScope,
    pub limit: u32,
    /// Time until the oldest request in the full window expires.
    pub retry_after: Duration,
}

/// Per-client request limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub per_minute: u32,
    pub per_hour: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_minute: 20,
            per_hour: 200,
        }
    }
}

/// Current usage for one client, as exposed to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateUsage {
    pub requests_last_minute: usize,
    pub minute_limit: u32,
    pub requests_last_hour: usize,
    pub hour_limit: u32,
}

#[derive(Debug, Default)]
struct ClientWindows {
    minute: VecDeque<Instant>,
    hour: VecDeque<Instant>,
}

impl ClientWindows {
    fn prune(&mut self, now: Instant) {
        prune_window(&mut self.minute, now, MINUTE);
        prune_window(&mut self.hour, now, HOUR);
    }

    fn is_idle(&self) -> bool {
        self.minute.is_empty() && self.hour.is_empty()
    }
}

/// Drop timestamps at or before `now - window`. Timestamps are appended in
/// order, so the stale ones are always at the front.
fn prune_window(window: &mut VecDeque<Instant>, now: Instant, length: Duration) {
    let Some(cutoff) = now.checked_sub(length) else {
        return;
    };
    while window.front().is_some_and(|t| *t <= cutoff) {
        window.pop_front();
    }
}

fn count_within(window: &VecDeque<Instant>, now: Instant, length: Duration) -> usize {
    match now.checked_sub(length) {
        Some(cutoff) => window.iter().filter(|t| **t > cutoff).count(),
        None => window.len(),
    }
}

fn retry_after(window: &VecDeque<Instant>, now: Instant, length: Duration) -> Duration {
    window
        .front()
        .map(|oldest| (*oldest + length).saturating_duration_since(now))
        .unwrap_or_default()
}

#[derive(Debug, Default)]
struct LimiterState {
    clients: HashMap<String, ClientWindows>,
    checks_since_sweep: u64,
}

/// Sliding-window rate limiter shared across request handlers.
///
/// Every check runs prune, compare and append under a single lock, so two
/// concurrent calls for the same client never lose an update.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    sweep_every: u64,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Create a limiter. Both limits must be positive.
    pub fn new(limits: RateLimits) -> Result<Self> {
        if limits.per_minute == 0 || limits.per_hour == 0 {
            return Err(VidlensError::Config(format!(
                "Rate limits must be positive (per_minute={}, per_hour={})",
                limits.per_minute, limits.per_hour
            )));
        }

        Ok(Self {
            limits,
            sweep_every: 256,
            state: Mutex::new(LimiterState::default()),
        })
    }

    /// Sweep idle clients once every `checks` calls to [`check`](Self::check).
    /// Zero disables the automatic sweep.
    pub fn with_sweep_every(mut self, checks: u64) -> Self {
        self.sweep_every = checks;
        self
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Record a request from `client_id`, or reject it if a window is full.
    pub fn check(&self, client_id: &str) -> std::result::Result<(), RateLimitExceeded> {
        self.check_at(client_id, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(
        &self,
        client_id: &str,
        now: Instant,
    ) -> std::result::Result<(), RateLimitExceeded> {
        let mut state = self.lock();

        state.checks_since_sweep += 1;
        if self.sweep_every > 0 && state.checks_since_sweep >= self.sweep_every {
            state.checks_since_sweep = 0;
            let evicted = sweep_clients(&mut state.clients, now);
            if evicted > 0 {
                debug!(evicted, "Swept idle rate-limit clients");
            }
        }

        let windows = state.clients.entry(client_id.to_string()).or_default();
        windows.prune(now);

        if windows.minute.len() >= self.limits.per_minute as usize {
            return Err(RateLimitExceeded {
                scope: RateScope::Minute,
                limit: self.limits.per_minute,
                retry_after: retry_after(&windows.minute, now, MINUTE),
            });
        }

        if windows.hour.len() >= self.limits.per_hour as usize {
            return Err(RateLimitExceeded {
                scope: RateScope::Hour,
                limit: self.limits.per_hour,
                retry_after: retry_after(&windows.hour, now, HOUR),
            });
        }

        windows.minute.push_back(now);
        windows.hour.push_back(now);
        Ok(())
    }

    /// Usage counts for a client. Unknown clients report zero usage and are
    /// not added to the map.
    pub fn usage(&self, client_id: &str) -> RateUsage {
        self.usage_at(client_id, Instant::now())
    }

    pub fn usage_at(&self, client_id: &str, now: Instant) -> RateUsage {
        let state = self.lock();
        let (minute, hour) = state
            .clients
            .get(client_id)
            .map(|w| {
                (
                    count_within(&w.minute, now, MINUTE),
                    count_within(&w.hour, now, HOUR),
                )
            })
            .unwrap_or((0, 0));

        RateUsage {
            requests_last_minute: minute,
            minute_limit: self.limits.per_minute,
            requests_last_hour: hour,
            hour_limit: self.limits.per_hour,
        }
    }

    /// Remove clients whose windows are both empty after pruning.
    /// Returns the number of clients removed.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        let mut state = self.lock();
        state.checks_since_sweep = 0;
        sweep_clients(&mut state.clients, now)
    }

    /// Number of client identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().clients.len()
    }

    // A panic while holding the lock cannot leave a window half-updated,
    // so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sweep_clients(clients: &mut HashMap<String, ClientWindows>, now: Instant) -> usize {
    let before = clients.len();
    clients.retain(|_, windows| {
        windows.prune(now);
        !windows.is_idle()
    });
    before - clients.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(per_minute: u32, per_hour: u32) -> RateLimiter {
        RateLimiter::new(RateLimits {
            per_minute,
            per_hour,
        })
        .unwrap()
        .with_sweep_every(0)
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(RateLimiter::new(RateLimits { per_minute: 0, per_hour: 10 }).is_err());
        assert!(RateLimiter::new(RateLimits { per_minute: 10, per_hour: 0 }).is_err());
    }

    #[test]
    fn test_minute_boundary() {
        let limiter = limiter(20, 200);
        let start = Instant::now();

        for i in 0..20 {
            let now = start + Duration::from_millis(i * 100);
            assert!(limiter.check_at("1.2.3.4", now).is_ok(), "call {} rejected", i + 1);
        }

        let err = limiter
            .check_at("1.2.3.4", start + Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(err.scope, RateScope::Minute);
        assert_eq!(err.limit, 20);
        assert_eq!(err.retry_after, Duration::from_secs(55));

        // The first request falls out of the window exactly 60s later.
        assert!(limiter
            .check_at("1.2.3.4", start + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn test_hour_scope() {
        let limiter = limiter(100, 3);
        let start = Instant::now();

        for i in 0..3 {
            limiter
                .check_at("client", start + Duration::from_secs(i * 120))
                .unwrap();
        }

        let err = limiter
            .check_at("client", start + Duration::from_secs(600))
            .unwrap_err();
        assert_eq!(err.scope, RateScope::Hour);
        assert_eq!(err.limit, 3);

        assert!(limiter
            .check_at("client", start + Duration::from_secs(3600))
            .is_ok());
    }

    #[test]
    fn test_rejected_requests_are_not_recorded() {
        let limiter = limiter(2, 100);
        let now = Instant::now();

        limiter.check_at("a", now).unwrap();
        limiter.check_at("a", now).unwrap();
        assert!(limiter.check_at("a", now).is_err());
        assert!(limiter.check_at("a", now).is_err());

        let usage = limiter.usage_at("a", now);
        assert_eq!(usage.requests_last_minute, 2);
        assert_eq!(usage.requests_last_hour, 2);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 10);
        let now = Instant::now();

        limiter.check_at("a", now).unwrap();
        assert!(limiter.check_at("a", now).is_err());
        assert!(limiter.check_at("b", now).is_ok());
    }

    #[test]
    fn test_usage_for_unknown_client() {
        let limiter = limiter(20, 200);
        let usage = limiter.usage("nobody");

        assert_eq!(usage.requests_last_minute, 0);
        assert_eq!(usage.minute_limit, 20);
        assert_eq!(usage.hour_limit, 200);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_usage_counts_only_live_window() {
        let limiter = limiter(20, 200);
        let start = Instant::now();

        limiter.check_at("a", start).unwrap();
        limiter.check_at("a", start + Duration::from_secs(30)).unwrap();

        let usage = limiter.usage_at("a", start + Duration::from_secs(70));
        assert_eq!(usage.requests_last_minute, 1);
        assert_eq!(usage.requests_last_hour, 2);
    }

    #[test]
    fn test_sweep_idle_clients() {
        let limiter = limiter(20, 200);
        let start = Instant::now();

        limiter.check_at("old", start).unwrap();
        limiter
            .check_at("recent", start + Duration::from_secs(3000))
            .unwrap();
        assert_eq!(limiter.tracked_clients(), 2);

        let evicted = limiter.sweep_idle_at(start + Duration::from_secs(3601));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(
            limiter
                .usage_at("recent", start + Duration::from_secs(3601))
                .requests_last_hour,
            1
        );
    }

    #[test]
    fn test_automatic_sweep() {
        let limiter = RateLimiter::new(RateLimits::default())
            .unwrap()
            .with_sweep_every(2);
        let start = Instant::now();

        limiter.check_at("idle", start).unwrap();
        let later = start + Duration::from_secs(4000);
        limiter.check_at("active", later).unwrap();

        // Second check triggered the sweep before recording "active".
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.usage_at("active", later).requests_last_minute, 1);
    }

    #[test]
    fn test_concurrent_checks_respect_limit() {
        let limiter = Arc::new(limiter(20, 200));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| limiter.check_at("shared", now).is_ok())
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 20);
        assert_eq!(limiter.usage_at("shared", now).requests_last_minute, 20);
    }
}
