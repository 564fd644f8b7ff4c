//! Read-only status snapshot for display and the RPC surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::CapturePhase;
use crate::identity::Baseline;
use crate::notification::NotificationState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftStatus {
    pub baseline: Baseline,
    pub captured_at: Option<DateTime<Utc>>,
    pub capture: CapturePhase,
    pub notification: NotificationState,
    /// Last time a reconcile probe succeeded, whatever the outcome.
    pub last_reconciled_at: Option<DateTime<Utc>>,
    pub probe_in_flight: bool,
    pub torn_down: bool,
}
