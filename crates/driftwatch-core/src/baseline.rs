//! Baseline store and startup capture state machine.
//!
//! Pure and deterministic: the runtime feeds in probe outcomes and timestamps
//! and schedules whatever retry the store asks for.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Baseline, Identity};
use crate::retry::RetryPolicy;

/// Progress of the startup capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CapturePhase {
    /// `start()` has not been called.
    #[default]
    Idle,
    /// Attempt `attempt` (0 = initial) is scheduled or running.
    Pending { attempt: u32 },
    /// A baseline exists, from capture or from adoption.
    Captured,
    /// Every attempt failed. No further automatic capture.
    Exhausted,
    /// Torn down before capture finished.
    Cancelled,
}

/// What the runtime should do after a failed capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureDecision {
    /// Schedule attempt `attempt` after `after`.
    Retry { attempt: u32, after: Duration },
    /// Retry budget spent; the baseline stays unset.
    Exhausted,
    /// No capture was pending (late result); nothing to do.
    Ignored,
}

/// Owns the session baseline.
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    baseline: Baseline,
    phase: CapturePhase,
    captured_at: Option<DateTime<Utc>>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// When the current baseline was stored (capture or adoption).
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Begin startup capture. Returns `false` if capture already started,
    /// finished, or was cancelled.
    pub fn begin_capture(&mut self) -> bool {
        if self.phase != CapturePhase::Idle {
            return false;
        }
        self.phase = CapturePhase::Pending { attempt: 0 };
        true
    }

    /// Check that `attempt` is still the one the store is waiting for.
    pub fn begin_attempt(&mut self, attempt: u32) -> bool {
        if self.phase != (CapturePhase::Pending { attempt }) {
            return false;
        }
        if self.baseline.is_set() {
            self.phase = CapturePhase::Captured;
            return false;
        }
        true
    }

    /// Store a successful capture. An identity adopted earlier wins over a
    /// capture that completes after it.
    pub fn record_capture_success(&mut self, identity: Identity, now: DateTime<Utc>) {
        if !self.baseline.is_set() {
            self.baseline = Baseline::Set(identity);
            self.captured_at = Some(now);
        }
        self.phase = CapturePhase::Captured;
    }

    /// Record a failed capture attempt and decide whether to retry.
    pub fn record_capture_failure(&mut self, policy: &RetryPolicy) -> CaptureDecision {
        let CapturePhase::Pending { attempt } = self.phase else {
            return CaptureDecision::Ignored;
        };
        let next = attempt.saturating_add(1);
        match policy.delay_for_retry(next) {
            Some(after) => {
                self.phase = CapturePhase::Pending { attempt: next };
                CaptureDecision::Retry {
                    attempt: next,
                    after,
                }
            }
            None => {
                self.phase = CapturePhase::Exhausted;
                CaptureDecision::Exhausted
            }
        }
    }

    /// Adopt `identity` as the baseline if none exists.
    ///
    /// Returns `true` if the baseline changed. Never overwrites a set baseline.
    pub fn adopt(&mut self, identity: Identity, now: DateTime<Utc>) -> bool {
        if self.baseline.is_set() {
            return false;
        }
        self.baseline = Baseline::Set(identity);
        self.captured_at = Some(now);
        if matches!(
            self.phase,
            CapturePhase::Pending { .. } | CapturePhase::Exhausted
        ) {
            self.phase = CapturePhase::Captured;
        }
        true
    }

    /// Stop any capture that has not finished.
    pub fn cancel_capture(&mut self) {
        if matches!(self.phase, CapturePhase::Idle | CapturePhase::Pending { .. }) {
            self.phase = CapturePhase::Cancelled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-25T00:00:00Z")
            .expect("valid RFC3339 timestamp")
            .with_timezone(&Utc)
    }

    fn id(v: &str, i: &str) -> Identity {
        Identity::new(v, i)
    }

    #[test]
    fn begin_capture_only_once() {
        let mut store = BaselineStore::new();
        assert!(store.begin_capture());
        assert_eq!(store.phase(), CapturePhase::Pending { attempt: 0 });
        assert!(!store.begin_capture());
    }

    #[test]
    fn success_sets_baseline() {
        let mut store = BaselineStore::new();
        store.begin_capture();
        assert!(store.begin_attempt(0));
        store.record_capture_success(id("5.12.0", "abc-123"), now());

        assert_eq!(store.baseline(), &Baseline::Set(id("5.12.0", "abc-123")));
        assert_eq!(store.phase(), CapturePhase::Captured);
        assert_eq!(store.captured_at(), Some(now()));
    }

    #[test]
    fn failures_walk_backoff_then_exhaust() {
        let policy = RetryPolicy::default();
        let mut store = BaselineStore::new();
        store.begin_capture();

        let mut delays = Vec::new();
        loop {
            match store.record_capture_failure(&policy) {
                CaptureDecision::Retry { attempt, after } => {
                    assert!(store.begin_attempt(attempt));
                    delays.push(after.as_millis());
                }
                CaptureDecision::Exhausted => break,
                CaptureDecision::Ignored => panic!("capture should be pending"),
            }
        }

        assert_eq!(delays, vec![1_000, 2_000, 4_000]);
        assert_eq!(store.phase(), CapturePhase::Exhausted);
        assert_eq!(store.baseline(), &Baseline::Unset);
    }

    #[test]
    fn failure_after_exhaustion_is_ignored() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let mut store = BaselineStore::new();
        store.begin_capture();
        assert_eq!(store.record_capture_failure(&policy), CaptureDecision::Exhausted);
        assert_eq!(store.record_capture_failure(&policy), CaptureDecision::Ignored);
    }

    #[test]
    fn stale_attempt_is_rejected() {
        let mut store = BaselineStore::new();
        store.begin_capture();
        store.record_capture_failure(&RetryPolicy::default());
        assert!(!store.begin_attempt(0));
        assert!(store.begin_attempt(1));
    }

    #[test]
    fn adoption_completes_pending_capture() {
        let mut store = BaselineStore::new();
        store.begin_capture();
        store.record_capture_failure(&RetryPolicy::default());

        assert!(store.adopt(id("1.0.0", "a"), now()));
        assert!(!store.begin_attempt(1));
        assert_eq!(store.phase(), CapturePhase::Captured);
    }

    #[test]
    fn late_capture_does_not_replace_adopted_baseline() {
        let mut store = BaselineStore::new();
        store.begin_capture();
        store.adopt(id("1.0.0", "a"), now());
        store.record_capture_success(id("1.0.0", "b"), now());
        assert_eq!(store.baseline(), &Baseline::Set(id("1.0.0", "a")));
    }

    #[test]
    fn adopt_never_overwrites() {
        let mut store = BaselineStore::new();
        assert!(store.adopt(id("1.0.0", "a"), now()));
        assert!(!store.adopt(id("2.0.0", "b"), now()));
        assert_eq!(store.baseline(), &Baseline::Set(id("1.0.0", "a")));
    }

    #[test]
    fn adopt_after_exhaustion_marks_captured() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        let mut store = BaselineStore::new();
        store.begin_capture();
        store.record_capture_failure(&policy);
        store.adopt(id("1.0.0", "a"), now());
        assert_eq!(store.phase(), CapturePhase::Captured);
    }

    #[test]
    fn cancel_stops_pending_capture() {
        let mut store = BaselineStore::new();
        store.begin_capture();
        store.cancel_capture();
        assert_eq!(store.phase(), CapturePhase::Cancelled);
        assert!(!store.begin_attempt(0));
        assert_eq!(
            store.record_capture_failure(&RetryPolicy::default()),
            CaptureDecision::Ignored
        );
    }

    #[test]
    fn cancel_keeps_terminal_phase() {
        let mut store = BaselineStore::new();
        store.begin_capture();
        store.record_capture_success(id("1.0.0", "a"), now());
        store.cancel_capture();
        assert_eq!(store.phase(), CapturePhase::Captured);
    }
}
