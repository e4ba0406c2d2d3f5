//! Per-source fixed-window request budgets.
//!
//! Each source key owns a counter and a window start. A window begins at the
//! first admission check after the previous one expired, so windows slide
//! with traffic instead of aligning to the wall clock. Check-and-increment
//! happens under one mutex, which makes admission atomic across every
//! concurrent caller.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::SourceBudget;
use crate::types::{CourtError, CourtResult};

/// Answer to an admission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Over budget; the current window ends after `retry_after`.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Snapshot of one source's budget usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub source: String,
    pub current: u32,
    pub limit: u32,
    pub window_ms: u64,
    /// `None` until the source sees its first request (or after its window lapsed).
    pub resets_in_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct Window {
    current: u32,
    started: Option<Instant>,
}

/// Rate limiter shared by every outbound request path.
pub struct RateLimiter {
    budgets: BTreeMap<String, SourceBudget>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(budgets: BTreeMap<String, SourceBudget>) -> Self {
        Self {
            budgets,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `source` has a configured budget.
    pub fn knows(&self, source: &str) -> bool {
        self.budgets.contains_key(source)
    }

    /// Try to spend one request from `source`'s budget.
    ///
    /// An admitted request is counted before this returns; a denied one is
    /// not counted at all.
    pub fn try_admit(&self, source: &str) -> CourtResult<Admission> {
        let budget = self
            .budgets
            .get(source)
            .ok_or_else(|| CourtError::UnknownSource(source.to_string()))?;
        let window_len = budget.window();
        let now = Instant::now();

        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(source.to_string()).or_default();

        let expired = window
            .started
            .map(|start| now.duration_since(start) >= window_len)
            .unwrap_or(true);
        if expired {
            window.started = Some(now);
            window.current = 0;
        }

        if window.current < budget.limit {
            window.current += 1;
            tracing::trace!(
                "admitted {source}: {}/{} in window",
                window.current,
                budget.limit
            );
            return Ok(Admission::Allowed);
        }

        let started = window.started.unwrap_or(now);
        let retry_after = (started + window_len).saturating_duration_since(now);
        tracing::debug!(
            "denied {source}: budget {} spent, retry in {}ms",
            budget.limit,
            retry_after.as_millis()
        );
        Ok(Admission::Denied { retry_after })
    }

    /// Current usage for one source.
    pub fn status(&self, source: &str) -> CourtResult<RateLimitState> {
        let budget = self
            .budgets
            .get(source)
            .ok_or_else(|| CourtError::UnknownSource(source.to_string()))?;
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::snapshot(source, budget, windows.get(source)))
    }

    /// Current usage for every configured source.
    pub fn status_all(&self) -> BTreeMap<String, RateLimitState> {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        self.budgets
            .iter()
            .map(|(key, budget)| (key.clone(), Self::snapshot(key, budget, windows.get(key))))
            .collect()
    }

    /// Smallest per-window limit across all sources.
    pub fn tightest_limit(&self) -> Option<u32> {
        self.budgets.values().map(|b| b.limit).min()
    }

    fn snapshot(source: &str, budget: &SourceBudget, window: Option<&Window>) -> RateLimitState {
        let window_len = budget.window();
        let now = Instant::now();
        let live = window.and_then(|w| {
            w.started
                .map(|start| (w.current, (start + window_len).saturating_duration_since(now)))
                .filter(|(_, remaining)| !remaining.is_zero())
        });

        RateLimitState {
            source: source.to_string(),
            current: live.map(|(current, _)| current).unwrap_or(0),
            limit: budget.limit,
            window_ms: budget.window_ms,
            resets_in_ms: live.map(|(_, remaining)| remaining.as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(limit: u32, window: Duration) -> RateLimiter {
        let mut budgets = BTreeMap::new();
        budgets.insert("roasearch".to_string(), SourceBudget::new(limit, window));
        budgets.insert("courtindex".to_string(), SourceBudget::new(100, window));
        RateLimiter::new(budgets)
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_admitted_then_denied_until_reset() {
        let rl = limiter(3, Duration::from_secs(10));

        for _ in 0..3 {
            assert!(rl.try_admit("roasearch").unwrap().is_allowed());
        }
        let denied = rl.try_admit("roasearch").unwrap();
        assert!(matches!(denied, Admission::Denied { retry_after } if retry_after == Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(matches!(
            rl.try_admit("roasearch").unwrap(),
            Admission::Denied { retry_after } if retry_after == Duration::from_secs(6)
        ));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(rl.try_admit("roasearch").unwrap().is_allowed());
        assert_eq!(rl.status("roasearch").unwrap().current, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_starts_at_triggering_check() {
        let rl = limiter(1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(7)).await;
        assert!(rl.try_admit("roasearch").unwrap().is_allowed());

        // A calendar-aligned window would have rolled over at t=10.
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!rl.try_admit("roasearch").unwrap().is_allowed());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rl.try_admit("roasearch").unwrap().is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denials_are_not_counted() {
        let rl = limiter(2, Duration::from_secs(10));
        rl.try_admit("roasearch").unwrap();
        rl.try_admit("roasearch").unwrap();
        for _ in 0..5 {
            rl.try_admit("roasearch").unwrap();
        }
        let state = rl.status("roasearch").unwrap();
        assert_eq!(state.current, 2);
        assert_eq!(state.limit, 2);
    }

    #[test]
    fn test_sources_are_independent() {
        let rl = limiter(1, Duration::from_secs(60));
        assert!(rl.try_admit("roasearch").unwrap().is_allowed());
        assert!(!rl.try_admit("roasearch").unwrap().is_allowed());
        assert!(rl.try_admit("courtindex").unwrap().is_allowed());
    }

    #[test]
    fn test_unknown_source() {
        let rl = limiter(1, Duration::from_secs(60));
        assert!(matches!(
            rl.try_admit("nope"),
            Err(CourtError::UnknownSource(_))
        ));
        assert!(rl.status("nope").is_err());
    }

    #[test]
    fn test_status_before_first_request() {
        let rl = limiter(5, Duration::from_secs(60));
        let all = rl.status_all();
        assert_eq!(all.len(), 2);
        let state = &all["roasearch"];
        assert_eq!(state.current, 0);
        assert_eq!(state.resets_in_ms, None);
        assert_eq!(rl.tightest_limit(), Some(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_never_exceeds_limit() {
        let rl = Arc::new(limiter(10, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for _ in 0..64 {
            let rl = rl.clone();
            handles.push(tokio::spawn(async move {
                rl.try_admit("roasearch").unwrap().is_allowed()
            }));
        }
        let mut admitted = 0;
        for h in handles {
            if h.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
        assert_eq!(rl.status("roasearch").unwrap().current, 10);
    }
}
