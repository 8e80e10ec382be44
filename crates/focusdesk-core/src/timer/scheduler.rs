//! Tick source for a running [`TimerEngine`].
//!
//! A tokio task fires once per period and calls `tick_now()` on the shared
//! engine. Only one loop exists per scheduler; re-attaching aborts the
//! previous one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::TimerEngine;
use crate::error::TimerError;

/// Engine handle shared between the caller and the scheduler task.
pub type SharedEngine = Arc<Mutex<TimerEngine>>;

/// Lock the shared engine, recovering from a poisoned mutex.
///
/// Engine methods never leave the state half-written, so the data behind a
/// poisoned lock is still consistent.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, TimerEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct TimerScheduler {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self {
            period: Duration::from_secs(1),
            handle: None,
        }
    }

    /// Begin ticking `engine` on the current tokio runtime.
    ///
    /// # Errors
    /// Returns [`TimerError::SchedulingFailure`] when called outside a runtime.
    pub fn attach(&mut self, engine: SharedEngine) -> Result<(), TimerError> {
        let runtime = Handle::try_current()
            .map_err(|e| TimerError::SchedulingFailure(e.to_string()))?;
        self.detach();

        let period = self.period;
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut guard = lock_engine(&engine);
                if !guard.state().is_running {
                    tracing::debug!("engine no longer running, scheduler exiting");
                    break;
                }
                if let Some(event) = guard.tick_now() {
                    tracing::debug!(?event, "scheduler tick produced event");
                }
            }
        });
        self.handle = Some(handle);
        Ok(())
    }

    /// Cancel the tick loop. Safe to call when nothing is attached.
    pub fn detach(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.detach();
    }
}
