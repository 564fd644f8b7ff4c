//! IdentityProbe trait. Enables fake injection for testing.

use std::future::Future;
use std::sync::Arc;

use driftwatch_core::Identity;

use crate::error::ProbeError;

/// Fetch the current backend identity in a single round-trip.
///
/// Implementations must not retry and must have no side effects beyond the
/// request itself.
pub trait IdentityProbe: Send + Sync {
    fn probe(&self) -> impl Future<Output = Result<Identity, ProbeError>> + Send;
}

impl<T: IdentityProbe> IdentityProbe for Arc<T> {
    fn probe(&self) -> impl Future<Output = Result<Identity, ProbeError>> + Send {
        (**self).probe()
    }
}
