//! driftwatch-core: pure types and state machines for backend drift detection.
//!
//! Everything here is deterministic and side-effect free: time values and
//! probe results are passed in by the caller. The async runtime lives in
//! `driftwatch-reconcile`; the network boundary lives in `driftwatch-probe`.

pub mod baseline;
pub mod compare;
pub mod config;
pub mod gate;
pub mod identity;
pub mod notification;
pub mod retry;
pub mod status;

pub use baseline::{BaselineStore, CaptureDecision, CapturePhase};
pub use compare::{Comparison, DriftOutcome, compare};
pub use config::DriftConfig;
pub use gate::{CaptureGate, FireDecision, ReconciliationGate, SignalDecision};
pub use identity::{Baseline, Identity};
pub use notification::NotificationState;
pub use retry::RetryPolicy;
pub use status::DriftStatus;
