//! Drift comparator: pure decision between a baseline and a fresh probe.

use serde::{Deserialize, Serialize};

use crate::identity::{Baseline, Identity};

/// What the caller must do with a freshly probed identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftOutcome {
    /// No baseline yet: store the probed identity, do not notify.
    Adopt,
    /// Same process as the baseline.
    Match,
    /// Version, instance, or both changed.
    Mismatch,
}

/// Result of [`compare`], carrying the probed identity back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub outcome: DriftOutcome,
    pub identity: Identity,
}

/// Compare `probed` against `baseline`.
///
/// Total and side-effect free. A change in either field is a mismatch; both
/// fields changing is still a single mismatch.
#[must_use]
pub fn compare(baseline: &Baseline, probed: Identity) -> Comparison {
    let outcome = match baseline {
        Baseline::Unset => DriftOutcome::Adopt,
        Baseline::Set(current)
            if current.version == probed.version && current.instance_id == probed.instance_id =>
        {
            DriftOutcome::Match
        }
        Baseline::Set(_) => DriftOutcome::Mismatch,
    };
    Comparison {
        outcome,
        identity: probed,
    }
}
