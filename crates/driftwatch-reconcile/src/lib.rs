//! driftwatch-reconcile: async drift reconciliation service.
//!
//! Wires the pure state machines from `driftwatch-core` to an
//! [`IdentityProbe`](driftwatch_probe::IdentityProbe) and a [`Scheduler`].

pub mod controller;
pub mod scheduler;

pub use controller::ReconciliationController;
pub use scheduler::{ScheduledTask, Scheduler, TimerHandle, TokioScheduler};
