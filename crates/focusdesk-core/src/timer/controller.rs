//! `FocusTimer`: the composition root for one active timer.
//!
//! Wires a [`TimerEngine`] to its scheduler, its session recorder and the
//! task collaborator, and runs the start → tick → stop → record flow.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::engine::TimerEngine;
use super::recorder::SessionRecorder;
use super::scheduler::{lock_engine, SharedEngine, TimerScheduler};
use super::state::{TimerMode, TimerSnapshot, TimerState};
use super::TimerConfig;
use crate::clock::{Clock, SystemClock};
use crate::error::TimerError;
use crate::events::Event;
use crate::ports::{LogNotifier, NotificationSink, SessionRepository, TaskRepository};
use crate::session::Session;

/// Result of [`FocusTimer::start`].
#[derive(Debug)]
pub struct StartOutcome {
    /// `None` when the same task was already running.
    pub event: Option<Event>,
    /// Session auto-recorded because a different timer was active.
    pub replaced: Option<Session>,
    /// Why the previous timer's session could not be recorded, if it wasn't.
    pub replace_error: Option<TimerError>,
}

pub struct FocusTimer {
    engine: SharedEngine,
    scheduler: TimerScheduler,
    recorder: SessionRecorder,
    tasks: Box<dyn TaskRepository>,
}

pub struct FocusTimerBuilder {
    config: TimerConfig,
    tasks: Box<dyn TaskRepository>,
    sessions: Box<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    state: TimerState,
}

impl FocusTimerBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Restore a previously saved in-flight timer.
    pub fn state(mut self, state: TimerState) -> Self {
        self.state = state;
        self
    }

    pub fn build(self) -> FocusTimer {
        let engine = TimerEngine::with_state(
            self.config,
            self.clock,
            Arc::clone(&self.notifier),
            self.state,
        );
        FocusTimer {
            engine: Arc::new(Mutex::new(engine)),
            scheduler: TimerScheduler::new(),
            recorder: SessionRecorder::new(self.sessions, self.notifier),
            tasks: self.tasks,
        }
    }
}

impl FocusTimer {
    pub fn builder(
        config: TimerConfig,
        tasks: Box<dyn TaskRepository>,
        sessions: Box<dyn SessionRepository>,
    ) -> FocusTimerBuilder {
        FocusTimerBuilder {
            config,
            tasks,
            sessions,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LogNotifier),
            state: TimerState::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    pub fn state(&self) -> TimerState {
        lock_engine(&self.engine).state().clone()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        lock_engine(&self.engine).snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        lock_engine(&self.engine).subscribe()
    }

    pub fn remaining_seconds(&self) -> u64 {
        lock_engine(&self.engine).remaining_seconds()
    }

    pub fn progress_fraction(&self) -> f64 {
        lock_engine(&self.engine).progress_fraction()
    }

    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_attached()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start timing `task_id` in `mode`.
    ///
    /// If a different task or mode is active, that session is stopped and
    /// recorded first. A failed save of the replaced session is notified by
    /// the recorder and returned in [`StartOutcome::replace_error`]; the new
    /// timer still starts.
    pub fn start(&mut self, task_id: &str, mode: TimerMode) -> Result<StartOutcome, TimerError> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(TimerError::InvalidArgument(
                "task id must not be empty".into(),
            ));
        }

        let estimate = match self.tasks.estimate_minutes(task_id) {
            Ok(estimate) => estimate,
            Err(e) => {
                tracing::warn!(task_id, error = %e, "could not look up task estimate");
                None
            }
        };

        let (mut replaced, mut replace_error) = (None, None);
        let first = lock_engine(&self.engine).start(task_id, mode, estimate);
        let event = match first {
            Err(TimerError::AlreadyActive { task_id: previous, .. }) => {
                tracing::info!(%previous, next = task_id, "switching timer, recording previous session");
                match self.stop() {
                    Ok(session) => replaced = session,
                    Err(e) => {
                        tracing::warn!(%previous, error = %e, "previous session lost on switch");
                        replace_error = Some(e);
                    }
                }
                lock_engine(&self.engine).start(task_id, mode, estimate)?
            }
            other => other?,
        };

        if event.is_some() {
            if let Err(e) = self.tasks.set_in_progress(task_id) {
                tracing::warn!(task_id, error = %e, "could not mark task in progress");
            }
        }

        if !self.scheduler.is_attached() {
            if let Err(e) = self.scheduler.attach(self.engine()) {
                lock_engine(&self.engine).pause();
                return Err(e);
            }
        }

        Ok(StartOutcome {
            event,
            replaced,
            replace_error,
        })
    }

    /// Continue the active (paused) task in its current mode.
    pub fn resume(&mut self) -> Result<StartOutcome, TimerError> {
        let (task_id, mode) = {
            let engine = lock_engine(&self.engine);
            let state = engine.state();
            match state.task_id.clone() {
                Some(id) => (id, state.mode),
                None => {
                    return Err(TimerError::InvalidArgument(
                        "no paused timer to resume".into(),
                    ))
                }
            }
        };
        self.start(&task_id, mode)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.scheduler.detach();
        lock_engine(&self.engine).pause()
    }

    pub fn reset(&mut self) -> Option<Event> {
        lock_engine(&self.engine).reset()
    }

    /// Advance the engine to the clock's current time.
    ///
    /// Hosts that do not keep a scheduler attached (e.g. one-shot CLI
    /// invocations) call this before reading state.
    pub fn refresh(&mut self) -> Option<Event> {
        lock_engine(&self.engine).tick_now()
    }

    /// Stop the timer and record the session.
    ///
    /// Returns `Ok(None)` when nothing was active. The engine is idle on
    /// return whether or not the save succeeded.
    pub fn stop(&mut self) -> Result<Option<Session>, TimerError> {
        self.scheduler.detach();
        let draft = lock_engine(&self.engine).stop();
        match draft {
            Some(draft) => self.recorder.record(draft).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CoreError;

    #[derive(Default, Clone)]
    struct FakeTasks {
        estimates: HashMap<String, u32>,
        in_progress: Arc<Mutex<Vec<String>>>,
        fail_status: bool,
    }

    impl TaskRepository for FakeTasks {
        fn estimate_minutes(&self, task_id: &str) -> Result<Option<u32>, CoreError> {
            Ok(self.estimates.get(task_id).copied())
        }

        fn set_in_progress(&self, task_id: &str) -> Result<(), CoreError> {
            if self.fail_status {
                return Err(CoreError::Backend("task service down".into()));
            }
            self.in_progress.lock().unwrap().push(task_id.to_string());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct FakeSessions {
        saved: Arc<Mutex<Vec<Session>>>,
        fail: bool,
    }

    impl SessionRepository for FakeSessions {
        fn save(&self, session: &Session) -> Result<Session, CoreError> {
            if self.fail {
                return Err(CoreError::Backend("offline".into()));
            }
            self.saved.lock().unwrap().push(session.clone());
            Ok(session.clone())
        }
    }

    fn timer(tasks: FakeTasks, sessions: FakeSessions) -> (FocusTimer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let timer = FocusTimer::builder(
            TimerConfig::default(),
            Box::new(tasks),
            Box::new(sessions),
        )
        .clock(clock.clone())
        .build();
        (timer, clock)
    }

    #[tokio::test]
    async fn start_marks_task_and_attaches_scheduler() {
        let tasks = FakeTasks::default();
        let (mut timer, _) = timer(tasks.clone(), FakeSessions::default());

        let outcome = timer.start("t1", TimerMode::Continuous).unwrap();
        assert!(outcome.event.is_some());
        assert!(outcome.replaced.is_none());
        assert!(timer.is_ticking());
        assert_eq!(tasks.in_progress.lock().unwrap().as_slice(), ["t1"]);

        timer.pause();
        assert!(!timer.is_ticking());
    }

    #[tokio::test]
    async fn status_update_failure_does_not_fail_start() {
        let tasks = FakeTasks {
            fail_status: true,
            ..Default::default()
        };
        let (mut timer, _) = timer(tasks, FakeSessions::default());
        assert!(timer.start("t1", TimerMode::Continuous).is_ok());
        assert!(timer.state().is_running);
    }

    #[tokio::test]
    async fn countdown_uses_task_estimate() {
        let mut tasks = FakeTasks::default();
        tasks.estimates.insert("t1".into(), 1);
        let (mut timer, clock) = timer(tasks, FakeSessions::default());

        timer.start("t1", TimerMode::Countdown).unwrap();
        clock.advance_secs(60);
        timer.refresh();
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.progress_fraction(), 1.0);
    }

    #[tokio::test]
    async fn stop_records_once() {
        let sessions = FakeSessions::default();
        let (mut timer, clock) = timer(FakeTasks::default(), sessions.clone());

        timer.start("t1", TimerMode::Continuous).unwrap();
        clock.advance_secs(125);
        timer.refresh();

        let session = timer.stop().unwrap().expect("session");
        assert_eq!(session.work_seconds, 125);
        assert_eq!(session.span_secs(), Some(125));
        assert!(timer.stop().unwrap().is_none());
        assert_eq!(sessions.saved.lock().unwrap().len(), 1);
        assert!(!timer.is_ticking());
    }

    #[tokio::test]
    async fn failed_save_still_idles_engine() {
        let sessions = FakeSessions {
            fail: true,
            ..Default::default()
        };
        let (mut timer, clock) = timer(FakeTasks::default(), sessions);

        timer.start("t1", TimerMode::Continuous).unwrap();
        clock.advance_secs(30);

        let err = timer.stop().unwrap_err();
        assert!(matches!(err, TimerError::PersistenceFailure(_)));
        assert!(timer.state().is_idle());
        assert!(timer.stop().unwrap().is_none());
    }

    #[tokio::test]
    async fn switching_task_records_previous() {
        let sessions = FakeSessions::default();
        let (mut timer, clock) = timer(FakeTasks::default(), sessions.clone());

        timer.start("t1", TimerMode::Continuous).unwrap();
        clock.advance_secs(40);

        let outcome = timer.start("t2", TimerMode::Continuous).unwrap();
        let replaced = outcome.replaced.expect("t1 recorded");
        assert_eq!(replaced.task_id, "t1");
        assert_eq!(replaced.work_seconds, 40);

        let state = timer.state();
        assert_eq!(state.task_id.as_deref(), Some("t2"));
        assert_eq!(state.elapsed, 0);
        assert!(timer.is_ticking());
        assert_eq!(sessions.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_switch_save_is_reported_in_outcome() {
        let sessions = FakeSessions {
            fail: true,
            ..Default::default()
        };
        let (mut timer, clock) = timer(FakeTasks::default(), sessions);

        timer.start("t1", TimerMode::Continuous).unwrap();
        clock.advance_secs(40);

        let outcome = timer.start("t2", TimerMode::Continuous).unwrap();
        assert!(outcome.replaced.is_none());
        assert!(matches!(
            outcome.replace_error,
            Some(TimerError::PersistenceFailure(_))
        ));
        assert_eq!(timer.state().task_id.as_deref(), Some("t2"));
        assert!(timer.state().is_running);
    }

    #[tokio::test]
    async fn clock_stepping_back_still_records_session() {
        let sessions = FakeSessions::default();
        let (mut timer, clock) = timer(FakeTasks::default(), sessions.clone());
        let started = clock.now();

        timer.start("t1", TimerMode::Continuous).unwrap();
        clock.advance_secs(600);
        timer.refresh();
        clock.set(started - chrono::Duration::seconds(5));

        let session = timer.stop().unwrap().expect("session");
        assert_eq!(session.work_seconds, 600);
        assert_eq!(session.span_secs(), Some(0));
        assert_eq!(sessions.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resume_continues_paused_task() {
        let (mut timer, clock) = timer(FakeTasks::default(), FakeSessions::default());
        assert!(timer.resume().is_err());

        timer.start("t1", TimerMode::Pomodoro).unwrap();
        clock.advance_secs(60);
        timer.pause();
        clock.advance_secs(300);

        let outcome = timer.resume().unwrap();
        assert!(matches!(
            outcome.event,
            Some(Event::TimerStarted { resumed: true, .. })
        ));
        clock.advance_secs(30);
        timer.refresh();
        assert_eq!(timer.state().elapsed, 90);
        assert_eq!(timer.state().mode, TimerMode::Pomodoro);
    }

    #[test]
    fn start_without_runtime_reports_scheduling_failure() {
        let (mut timer, _) = timer(FakeTasks::default(), FakeSessions::default());
        let err = timer.start("t1", TimerMode::Continuous).unwrap_err();
        assert!(matches!(err, TimerError::SchedulingFailure(_)));
        assert!(!timer.state().is_running);
    }
}
