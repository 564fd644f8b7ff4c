//! Reconciliation controller: startup baseline capture and reconnect-driven
//! drift checks.
//!
//! Entry points are [`ReconciliationController::start`] and
//! [`ReconciliationController::on_reconnect_signal`]; both only schedule
//! work. All state lives behind one mutex that is never held across an
//! await, and every mutation after a probe first checks the teardown flag.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use driftwatch_core::{
    BaselineStore, CaptureDecision, CaptureGate, DriftConfig, DriftOutcome, DriftStatus, FireDecision,
    NotificationState, ReconciliationGate, SignalDecision, compare,
};
use driftwatch_probe::IdentityProbe;

use crate::scheduler::{Scheduler, TimerHandle};

struct Shared {
    baseline: BaselineStore,
    notification: NotificationState,
    gate: ReconciliationGate<TimerHandle>,
    last_reconciled_at: Option<DateTime<Utc>>,
}

struct Inner<P, S> {
    probe: P,
    scheduler: S,
    config: DriftConfig,
    state: Mutex<Shared>,
    notification_tx: watch::Sender<NotificationState>,
}

/// Drift reconciliation service. Cheap to clone; clones share state.
pub struct ReconciliationController<P, S> {
    inner: Arc<Inner<P, S>>,
}

impl<P, S> Clone for ReconciliationController<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: IdentityProbe + 'static, S: Scheduler> ReconciliationController<P, S> {
    pub fn new(probe: P, scheduler: S, config: DriftConfig) -> Self {
        let (notification_tx, _) = watch::channel(NotificationState::default());
        Self {
            inner: Arc::new(Inner {
                probe,
                scheduler,
                config,
                state: Mutex::new(Shared {
                    baseline: BaselineStore::new(),
                    notification: NotificationState::default(),
                    gate: ReconciliationGate::new(),
                    last_reconciled_at: None,
                }),
                notification_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Startup capture ────────────────────────────────────────────

    /// Begin startup baseline capture. Only the first call has an effect.
    pub fn start(&self) {
        let mut st = self.lock();
        if st.gate.is_stopped() || !st.baseline.begin_capture() {
            return;
        }
        tracing::info!("capturing backend identity baseline");
        self.schedule_capture(&mut st, 0, Duration::ZERO);
    }

    fn schedule_capture(&self, st: &mut Shared, attempt: u32, delay: Duration) {
        let this = self.clone();
        let handle = self.inner.scheduler.schedule(
            delay,
            Box::pin(async move { this.run_capture_attempt(attempt).await }),
        );
        if let Some(obsolete) = st.gate.arm_retry(handle) {
            obsolete.cancel();
        }
    }

    async fn run_capture_attempt(self, attempt: u32) {
        {
            let mut st = self.lock();
            st.gate.clear_retry();
            if st.gate.is_stopped() || !st.baseline.begin_attempt(attempt) {
                return;
            }
            match st.gate.begin_capture_probe(attempt) {
                CaptureGate::Probe => {}
                CaptureGate::Deferred => {
                    tracing::debug!(attempt, "capture waits for outstanding reconcile probe");
                    return;
                }
                CaptureGate::Stopped => return,
            }
        }

        let result = self.inner.probe.probe().await;

        let mut st = self.lock();
        st.gate.finish_probe();
        if st.gate.is_stopped() {
            tracing::debug!(attempt, "discarding capture result after teardown");
            return;
        }
        match result {
            Ok(identity) => {
                tracing::info!(%identity, attempt, "baseline captured");
                st.baseline.record_capture_success(identity, Utc::now());
            }
            Err(e) => match st.baseline.record_capture_failure(&self.inner.config.retry) {
                CaptureDecision::Retry { attempt, after } => {
                    tracing::debug!(
                        error = %e,
                        next_attempt = attempt,
                        delay_ms = after.as_millis() as u64,
                        "baseline capture failed, retrying"
                    );
                    self.schedule_capture(&mut st, attempt, after);
                }
                CaptureDecision::Exhausted => {
                    tracing::warn!(
                        error = %e,
                        attempts = self.inner.config.retry.max_attempts(),
                        "baseline capture gave up; drift checks will adopt the next identity"
                    );
                }
                CaptureDecision::Ignored => {}
            },
        }
    }

    // ─── Reconnect reconciliation ───────────────────────────────────

    /// Handle one reconnect of the underlying transport.
    ///
    /// Never probes directly: a burst of calls collapses into a single
    /// probe once the debounce window has been quiet.
    pub fn on_reconnect_signal(&self) {
        let mut st = self.lock();
        let active = st.notification.active;
        match st.gate.on_signal(active) {
            SignalDecision::Stopped => {}
            SignalDecision::Suppressed => {
                tracing::debug!("reconnect ignored: drift notification active");
            }
            SignalDecision::Debounce { seq, replaced } => {
                if let Some(old) = replaced {
                    old.cancel();
                }
                let this = self.clone();
                let handle = self.inner.scheduler.schedule(
                    self.inner.config.debounce(),
                    Box::pin(async move { this.run_reconcile(seq).await }),
                );
                if let Some(obsolete) = st.gate.arm_debounce(seq, handle) {
                    obsolete.cancel();
                }
            }
        }
    }

    async fn run_reconcile(self, seq: u64) {
        {
            let mut st = self.lock();
            let active = st.notification.active;
            let decision = st.gate.on_debounce_fired(seq, active);
            if decision != FireDecision::Probe {
                tracing::debug!(?decision, "reconcile skipped");
                return;
            }
        }

        let result = self.inner.probe.probe().await;

        let mut st = self.lock();
        let deferred_capture = st.gate.finish_probe();
        if st.gate.is_stopped() {
            tracing::debug!("discarding reconcile result after teardown");
            return;
        }
        // The resumed attempt runs after this lock is released, so it sees
        // any baseline adopted below.
        if let Some(attempt) = deferred_capture {
            self.schedule_capture(&mut st, attempt, Duration::ZERO);
        }
        let identity = match result {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(error = %e, "reconcile probe failed; skipping");
                return;
            }
        };

        let now = Utc::now();
        st.last_reconciled_at = Some(now);
        let comparison = compare(st.baseline.baseline(), identity);
        match comparison.outcome {
            DriftOutcome::Adopt => {
                tracing::info!(identity = %comparison.identity, "baseline adopted");
                st.baseline.adopt(comparison.identity, now);
            }
            DriftOutcome::Match => {
                tracing::debug!("backend identity unchanged");
            }
            DriftOutcome::Mismatch => {
                tracing::warn!(
                    baseline = ?st.baseline.baseline().identity(),
                    observed = %comparison.identity,
                    "backend drift detected"
                );
                st.notification.raise(comparison.identity.version);
                self.publish(&st);
            }
        }
    }

    // ─── Notification ───────────────────────────────────────────────

    /// Clear the drift notification. The baseline is untouched, so a later
    /// reconcile that still sees drift raises it again.
    pub fn dismiss(&self) -> NotificationState {
        let mut st = self.lock();
        if st.notification.dismiss() {
            self.publish(&st);
        }
        st.notification.clone()
    }

    pub fn notification(&self) -> NotificationState {
        self.lock().notification.clone()
    }

    /// Watch notification changes (raise and dismiss).
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.inner.notification_tx.subscribe()
    }

    fn publish(&self, st: &Shared) {
        self.inner
            .notification_tx
            .send_replace(st.notification.clone());
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Stop the service: cancel pending retry and debounce timers and
    /// discard any probe result that arrives afterwards. Idempotent.
    pub fn teardown(&self) {
        let pending = {
            let mut st = self.lock();
            if st.gate.is_stopped() {
                return;
            }
            st.baseline.cancel_capture();
            st.gate.stop()
        };
        tracing::debug!(cancelled_timers = pending.len(), "reconciliation torn down");
        for handle in pending {
            handle.cancel();
        }
    }

    pub fn snapshot(&self) -> DriftStatus {
        let st = self.lock();
        DriftStatus {
            baseline: st.baseline.baseline().clone(),
            captured_at: st.baseline.captured_at(),
            capture: st.baseline.phase(),
            notification: st.notification.clone(),
            last_reconciled_at: st.last_reconciled_at,
            probe_in_flight: st.gate.is_in_flight(),
            torn_down: st.gate.is_stopped(),
        }
    }
}
