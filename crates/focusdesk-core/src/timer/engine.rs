//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - `TimerScheduler` (or any other caller) is responsible
//! for calling `tick()` about once per second while the timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> (stop) -> Idle
//!
//! Pomodoro, while running:
//! Work --(target reached)--> Break --(target reached)--> Work ...
//! ```
//!
//! `elapsed` is always recomputed from the absolute `start_time` of the
//! running segment, so late or throttled ticks never lose time.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default(), clock, notifier);
//! engine.start("task-1", TimerMode::Pomodoro, None)?;
//! // In a loop:
//! engine.tick_now(); // Returns Some(Event) on a phase change
//! let draft = engine.stop(); // Some(SessionDraft) if a task was active
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

use super::duration::{self, TimerConfig};
use super::state::{Phase, TimerMode, TimerSnapshot, TimerState};
use crate::clock::Clock;
use crate::error::TimerError;
use crate::events::Event;
use crate::ports::NotificationSink;
use crate::session::SessionDraft;

/// Core timer engine.
///
/// Owns the one `TimerState` of its composition root. Observers read it
/// through [`TimerEngine::subscribe`].
pub struct TimerEngine {
    config: TimerConfig,
    state: TimerState,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    observer: watch::Sender<TimerSnapshot>,
}

impl TimerEngine {
    /// Create an idle engine.
    pub fn new(
        config: TimerConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_state(config, clock, notifier, TimerState::default())
    }

    /// Create an engine from a previously saved state.
    pub fn with_state(
        config: TimerConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        state: TimerState,
    ) -> Self {
        let state = state.normalized();
        let initial = build_snapshot(&config, &state, clock.now());
        let (observer, _) = watch::channel(initial);
        Self {
            config,
            state,
            clock,
            notifier,
            observer,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Current phase; `None` outside Pomodoro mode.
    pub fn phase(&self) -> Option<Phase> {
        (self.state.mode == TimerMode::Pomodoro).then(|| {
            duration::phase_for(self.state.is_break, self.state.pomodoro_count, &self.config)
        })
    }

    pub fn target_seconds(&self) -> Option<u64> {
        duration::target_duration_for(
            self.state.mode,
            self.state.is_break,
            self.state.pomodoro_count,
            &self.config,
            self.state.estimate_minutes,
        )
    }

    pub fn remaining_seconds(&self) -> u64 {
        duration::remaining_secs(self.state.elapsed, self.target_seconds())
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress_fraction(&self) -> f64 {
        duration::progress_fraction(self.state.elapsed, self.target_seconds())
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        build_snapshot(&self.config, &self.state, self.clock.now())
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.observer.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or resume) timing `task_id` in `mode`.
    ///
    /// Accumulated `elapsed` and `pomodoro_count` are kept when the same
    /// task and mode are already active. A different task or mode is
    /// rejected with [`TimerError::AlreadyActive`]; stop that one first.
    pub fn start(
        &mut self,
        task_id: &str,
        mode: TimerMode,
        estimate_minutes: Option<u32>,
    ) -> Result<Option<Event>, TimerError> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(TimerError::InvalidArgument(
                "task id must not be empty".into(),
            ));
        }

        let resumed = match self.state.task_id.as_deref() {
            Some(active) if active != task_id || self.state.mode != mode => {
                return Err(TimerError::AlreadyActive {
                    task_id: active.to_string(),
                    mode: self.state.mode,
                });
            }
            Some(_) if self.state.is_running => return Ok(None),
            Some(_) => true,
            None => false,
        };

        let now = self.clock.now();
        if !resumed {
            self.state.task_id = Some(task_id.to_string());
            self.state.mode = mode;
            self.state.session_started_at = Some(now);
        }
        if estimate_minutes.is_some() {
            self.state.estimate_minutes = estimate_minutes;
        }
        self.state.start_time = Some(now);
        self.state.segment_base = self.state.elapsed;
        self.state.is_running = true;

        tracing::info!(task_id, %mode, resumed, elapsed = self.state.elapsed, "timer started");
        self.announce(
            "Timer started",
            &format!("Focusing on {task_id} ({mode})"),
        );
        self.publish();

        Ok(Some(Event::TimerStarted {
            task_id: task_id.to_string(),
            mode,
            resumed,
            at: now,
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        let now = self.clock.now();
        self.advance(now);
        self.roll_phases();
        self.state.is_running = false;
        self.state.start_time = None;
        self.state.segment_base = self.state.elapsed;
        self.publish();

        let task_id = self.state.task_id.clone()?;
        tracing::debug!(%task_id, elapsed = self.state.elapsed, "timer paused");
        Some(Event::TimerPaused {
            task_id,
            elapsed_secs: self.state.elapsed,
            at: now,
        })
    }

    /// Zero `elapsed` without touching task, mode or cycle count.
    pub fn reset(&mut self) -> Option<Event> {
        let task_id = self.state.task_id.clone()?;
        let now = self.clock.now();
        self.state.elapsed = 0;
        self.state.segment_base = 0;
        if self.state.is_running {
            self.state.start_time = Some(now);
        }
        self.publish();

        tracing::debug!(%task_id, "timer reset");
        Some(Event::TimerReset { task_id, at: now })
    }

    /// Return to idle. Yields the session to record if a task was active.
    ///
    /// Calling this on an idle engine does nothing, so a double stop can
    /// never produce two sessions.
    pub fn stop(&mut self) -> Option<SessionDraft> {
        let task_id = self.state.task_id.clone()?;
        let now = self.clock.now();
        if self.state.is_running {
            self.advance(now);
            self.roll_phases();
        }

        let (work, brk) = if self.state.is_break {
            (0, self.state.elapsed)
        } else {
            (self.state.elapsed, 0)
        };
        let started_at = self.state.session_started_at.unwrap_or(now);
        let draft = SessionDraft {
            task_id,
            mode: self.state.mode,
            started_at,
            // A clock stepped back since start must not invert the session.
            ended_at: now.max(started_at),
            work_seconds: self.state.banked_work_seconds + work,
            break_seconds: self.state.banked_break_seconds + brk,
            pomodoro_count: self.state.pomodoro_count,
        };

        self.state = TimerState::default();
        self.publish();

        tracing::info!(
            task_id = %draft.task_id,
            work_seconds = draft.work_seconds,
            break_seconds = draft.break_seconds,
            "timer stopped"
        );
        Some(draft)
    }

    /// Advance to `now`. Returns `Some(Event::PhaseCompleted)` when a
    /// Pomodoro phase ends on this tick.
    ///
    /// A tick late enough to cross several phases notifies each crossing
    /// and returns the last one.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.state.is_running {
            tracing::trace!("tick ignored: timer not running");
            return None;
        }
        self.advance(now);
        let event = self.roll_phases();
        self.publish();
        event
    }

    /// `tick` at the engine clock's current time.
    pub fn tick_now(&mut self) -> Option<Event> {
        let now = self.clock.now();
        self.tick(now)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self, now: DateTime<Utc>) {
        let Some(start) = self.state.start_time else {
            return;
        };
        let since = (now - start).num_seconds().max(0) as u64;
        let computed = self.state.segment_base.saturating_add(since);
        // Clock skew must never move elapsed backwards.
        if computed > self.state.elapsed {
            self.state.elapsed = computed;
        }
    }

    /// Complete every Pomodoro phase whose target `elapsed` has reached.
    ///
    /// Each phase banks exactly its target. The next phase starts at the
    /// instant the previous one ran out, so seconds past the target carry
    /// over instead of being charged to the finished phase.
    fn roll_phases(&mut self) -> Option<Event> {
        let mut last = None;
        while self.state.mode == TimerMode::Pomodoro {
            let Some(start) = self.state.start_time else {
                break;
            };
            let target = match self.target_seconds() {
                Some(t) if t > 0 => t,
                _ => break,
            };
            if self.state.elapsed < target {
                break;
            }

            let boundary =
                start + Duration::seconds(target as i64 - self.state.segment_base as i64);
            let overflow = self.state.elapsed - target;
            last = Some(self.complete_phase(target, overflow, boundary));
        }
        last
    }

    fn complete_phase(&mut self, target: u64, overflow: u64, boundary: DateTime<Utc>) -> Event {
        let completed = duration::phase_for(
            self.state.is_break,
            self.state.pomodoro_count,
            &self.config,
        );
        if completed.is_break() {
            self.state.banked_break_seconds += target;
            self.state.is_break = false;
        } else {
            self.state.banked_work_seconds += target;
            self.state.pomodoro_count += 1;
            self.state.is_break = true;
        }
        self.state.elapsed = overflow;
        self.state.segment_base = 0;
        self.state.start_time = Some(boundary);

        let next = duration::phase_for(
            self.state.is_break,
            self.state.pomodoro_count,
            &self.config,
        );
        let next_target_secs = self.target_seconds().unwrap_or(0);
        tracing::debug!(
            ?completed,
            ?next,
            pomodoro_count = self.state.pomodoro_count,
            carried_secs = overflow,
            "pomodoro phase completed"
        );

        let body = match next {
            Phase::Work => "Break's over, back to work!".to_string(),
            Phase::ShortBreak => "Pomodoro complete, break time!".to_string(),
            Phase::LongBreak => format!(
                "Pomodoro complete, break time! Take a long one ({} min).",
                self.config.pomodoro_long_break_minutes
            ),
        };
        self.announce("Pomodoro", &body);

        Event::PhaseCompleted {
            completed,
            next,
            pomodoro_count: self.state.pomodoro_count,
            next_target_secs,
            at: boundary,
        }
    }

    fn announce(&self, title: &str, body: &str) {
        if self.config.enable_notifications {
            self.notifier.notify(title, body);
        }
        if self.config.enable_sounds {
            self.notifier.chime();
        }
    }

    fn publish(&self) {
        self.observer.send_replace(self.snapshot());
    }
}

fn build_snapshot(config: &TimerConfig, state: &TimerState, at: DateTime<Utc>) -> TimerSnapshot {
    let target = duration::target_duration_for(
        state.mode,
        state.is_break,
        state.pomodoro_count,
        config,
        state.estimate_minutes,
    );
    TimerSnapshot {
        task_id: state.task_id.clone(),
        mode: state.mode,
        is_running: state.is_running,
        phase: (state.mode == TimerMode::Pomodoro)
            .then(|| duration::phase_for(state.is_break, state.pomodoro_count, config)),
        elapsed_secs: state.elapsed,
        remaining_secs: duration::remaining_secs(state.elapsed, target),
        target_secs: target,
        progress: duration::progress_fraction(state.elapsed, target),
        pomodoro_count: state.pomodoro_count,
        at,
    }
}
