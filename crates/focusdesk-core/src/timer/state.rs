use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Counts up with no target.
    #[default]
    Continuous,
    /// Counts down from the active task's estimate.
    Countdown,
    /// Alternates work and break phases.
    Pomodoro,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Continuous => "continuous",
            TimerMode::Countdown => "countdown",
            TimerMode::Pomodoro => "pomodoro",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(TimerMode::Continuous),
            "countdown" => Ok(TimerMode::Countdown),
            "pomodoro" => Ok(TimerMode::Pomodoro),
            other => Err(format!(
                "unknown timer mode '{other}' (expected continuous, countdown or pomodoro)"
            )),
        }
    }
}

/// Which Pomodoro phase the timer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Work)
    }
}

/// Mutable state of the single active timer.
///
/// Only `TimerEngine` mutates this. It is serializable so a host can park an
/// in-flight timer between process runs and restore it later.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    pub task_id: Option<String>,
    pub mode: TimerMode,
    /// Start of the current running segment. `None` while paused or idle.
    pub start_time: Option<DateTime<Utc>>,
    /// Whole seconds accumulated in the current phase.
    pub elapsed: u64,
    pub is_running: bool,
    pub is_break: bool,
    pub pomodoro_count: u32,
    /// `elapsed` at the moment the current running segment began.
    #[serde(default)]
    pub segment_base: u64,
    #[serde(default)]
    pub session_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimate_minutes: Option<u32>,
    #[serde(default)]
    pub banked_work_seconds: u64,
    #[serde(default)]
    pub banked_break_seconds: u64,
}

impl TimerState {
    pub fn is_idle(&self) -> bool {
        self.task_id.is_none()
    }

    /// Repair a state that was deserialized from outside the engine.
    pub(crate) fn normalized(mut self) -> Self {
        if self.task_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            self.task_id = None;
        }
        if self.task_id.is_none() {
            return Self::default();
        }
        if self.is_running && self.start_time.is_none() {
            self.is_running = false;
        }
        if !self.is_running {
            self.start_time = None;
            self.segment_base = self.elapsed;
        }
        if self.mode != TimerMode::Pomodoro {
            self.is_break = false;
        }
        self.segment_base = self.segment_base.min(self.elapsed);
        self
    }
}

/// Read-only view published to observers after every state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub task_id: Option<String>,
    pub mode: TimerMode,
    pub is_running: bool,
    pub phase: Option<Phase>,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub target_secs: Option<u64>,
    pub progress: f64,
    pub pomodoro_count: u32,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Pomodoro".parse::<TimerMode>(), Ok(TimerMode::Pomodoro));
        assert_eq!("countdown".parse::<TimerMode>(), Ok(TimerMode::Countdown));
        assert!("stopwatch".parse::<TimerMode>().is_err());
    }

    #[test]
    fn normalized_clears_break_outside_pomodoro() {
        let state = TimerState {
            task_id: Some("t1".into()),
            mode: TimerMode::Continuous,
            is_break: true,
            elapsed: 30,
            ..Default::default()
        }
        .normalized();
        assert!(!state.is_break);
        assert_eq!(state.segment_base, 30);
    }

    #[test]
    fn normalized_stops_running_without_start_time() {
        let state = TimerState {
            task_id: Some("t1".into()),
            is_running: true,
            start_time: None,
            ..Default::default()
        }
        .normalized();
        assert!(!state.is_running);
    }

    #[test]
    fn normalized_resets_blank_task_to_idle() {
        let state = TimerState {
            task_id: Some("  ".into()),
            elapsed: 12,
            ..Default::default()
        }
        .normalized();
        assert_eq!(state, TimerState::default());
    }
}
