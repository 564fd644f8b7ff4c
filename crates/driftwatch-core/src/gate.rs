//! Reconciliation gate: suppression, debounce, in-flight dedup and teardown.
//!
//! The in-flight flag covers every probe, startup capture included, so at
//! most one probe is outstanding at any instant.
//!
//! The gate is generic over the timer handle type `H` so it stays free of any
//! runtime. Decisions that displace a pending timer hand the old handle back
//! to the caller, which is responsible for cancelling it.

/// Outcome of a reconnect signal.
#[derive(Debug, PartialEq, Eq)]
pub enum SignalDecision<H> {
    /// Service torn down; ignore.
    Stopped,
    /// Notification active; no probe and no timer.
    Suppressed,
    /// Schedule a debounce timer tagged `seq`. `replaced` is the timer it
    /// supersedes, if any.
    Debounce { seq: u64, replaced: Option<H> },
}

/// Outcome of a debounce timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    /// Go ahead: the gate is now marked in flight.
    Probe,
    /// A newer signal superseded this timer.
    Stale,
    Stopped,
    Suppressed,
    /// A probe is already outstanding.
    InFlight,
}

/// Outcome of a startup capture attempt asking to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureGate {
    /// Go ahead: the gate is now marked in flight.
    Probe,
    /// A reconcile probe is outstanding; the attempt resumes when it resolves.
    Deferred,
    Stopped,
}

#[derive(Debug)]
pub struct ReconciliationGate<H> {
    in_flight: bool,
    deferred_capture: Option<u32>,
    stopped: bool,
    debounce_seq: u64,
    pending_debounce: Option<H>,
    pending_retry: Option<H>,
}

impl<H> Default for ReconciliationGate<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ReconciliationGate<H> {
    pub fn new() -> Self {
        Self {
            in_flight: false,
            deferred_capture: None,
            stopped: false,
            debounce_seq: 0,
            pending_debounce: None,
            pending_retry: None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.pending_debounce.is_some()
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    /// Handle a reconnect signal.
    pub fn on_signal(&mut self, notification_active: bool) -> SignalDecision<H> {
        if self.stopped {
            return SignalDecision::Stopped;
        }
        if notification_active {
            return SignalDecision::Suppressed;
        }
        self.debounce_seq = self.debounce_seq.wrapping_add(1);
        SignalDecision::Debounce {
            seq: self.debounce_seq,
            replaced: self.pending_debounce.take(),
        }
    }

    /// Record the timer scheduled for `seq`.
    ///
    /// Returns the handle back if it is already obsolete (newer signal or
    /// teardown); the caller must cancel it.
    pub fn arm_debounce(&mut self, seq: u64, handle: H) -> Option<H> {
        if self.stopped || seq != self.debounce_seq {
            return Some(handle);
        }
        self.pending_debounce.replace(handle)
    }

    /// Handle the debounce timer tagged `seq` firing.
    pub fn on_debounce_fired(&mut self, seq: u64, notification_active: bool) -> FireDecision {
        if seq != self.debounce_seq {
            return FireDecision::Stale;
        }
        self.pending_debounce = None;
        if self.stopped {
            return FireDecision::Stopped;
        }
        if notification_active {
            return FireDecision::Suppressed;
        }
        if self.in_flight {
            return FireDecision::InFlight;
        }
        self.in_flight = true;
        FireDecision::Probe
    }

    /// Claim the probe slot for startup capture attempt `attempt`.
    pub fn begin_capture_probe(&mut self, attempt: u32) -> CaptureGate {
        if self.stopped {
            return CaptureGate::Stopped;
        }
        if self.in_flight {
            self.deferred_capture = Some(attempt);
            return CaptureGate::Deferred;
        }
        self.in_flight = true;
        CaptureGate::Probe
    }

    /// Clear the in-flight mark after the probe resolved.
    ///
    /// Returns the capture attempt that was deferred behind this probe, if
    /// any; the caller reschedules it.
    pub fn finish_probe(&mut self) -> Option<u32> {
        self.in_flight = false;
        if self.stopped {
            return None;
        }
        self.deferred_capture.take()
    }

    /// Record the pending startup retry timer. Returns the handle back if the
    /// gate is stopped.
    pub fn arm_retry(&mut self, handle: H) -> Option<H> {
        if self.stopped {
            return Some(handle);
        }
        self.pending_retry.replace(handle)
    }

    /// Forget the retry timer once it has fired.
    pub fn clear_retry(&mut self) -> Option<H> {
        self.pending_retry.take()
    }

    /// Tear down: no further signals or timers are honored. Returns every
    /// pending timer handle for cancellation.
    pub fn stop(&mut self) -> Vec<H> {
        self.stopped = true;
        self.deferred_capture = None;
        self.pending_debounce
            .take()
            .into_iter()
            .chain(self.pending_retry.take())
            .collect()
    }
}
