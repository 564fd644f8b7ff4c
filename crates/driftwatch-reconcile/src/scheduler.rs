//! Scheduler port: "run this after a delay" and "cancel it".
//!
//! The controller never touches a timer API directly, so tests can drive it
//! with tokio's paused clock or any other virtual time source.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Work to run once a timer fires.
pub type ScheduledTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Cancellation handle for a scheduled task.
///
/// Dropping the handle does NOT cancel the task; call [`TimerHandle::cancel`].
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

pub trait Scheduler: Send + Sync + 'static {
    /// Run `task` after `delay`. A zero delay runs it on the next turn of
    /// the executor, never inline.
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;
}

/// Scheduler backed by `tokio::time::sleep` on a runtime handle.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Bind to the runtime of the calling task. Panics outside a runtime,
    /// like `tokio::spawn`.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let join = self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
        let abort = join.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}
