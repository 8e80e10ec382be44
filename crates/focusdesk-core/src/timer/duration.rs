//! Phase and target-duration rules.
//!
//! Everything mode-specific about "how long should this run" lives here as
//! pure functions of state and configuration.

use serde::{Deserialize, Serialize};

use super::state::{Phase, TimerMode};

/// Durations and side-effect switches consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub pomodoro_work_minutes: u32,
    pub pomodoro_break_minutes: u32,
    pub pomodoro_long_break_minutes: u32,
    /// Work phases completed before a long break replaces a short one.
    pub pomodoro_long_break_after: u32,
    pub enable_sounds: bool,
    pub enable_notifications: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pomodoro_work_minutes: 25,
            pomodoro_break_minutes: 5,
            pomodoro_long_break_minutes: 15,
            pomodoro_long_break_after: 4,
            enable_sounds: true,
            enable_notifications: true,
        }
    }
}

/// Phase implied by the break flag and completed-work count.
///
/// A break is long when the work phase that preceded it was a multiple of
/// `pomodoro_long_break_after`.
pub fn phase_for(is_break: bool, pomodoro_count: u32, config: &TimerConfig) -> Phase {
    if !is_break {
        return Phase::Work;
    }
    let every = config.pomodoro_long_break_after.max(1);
    if pomodoro_count > 0 && pomodoro_count % every == 0 {
        Phase::LongBreak
    } else {
        Phase::ShortBreak
    }
}

/// Target length in seconds of the current phase, or `None` when the mode
/// has no meaningful target (continuous, or countdown without an estimate).
pub fn target_duration_for(
    mode: TimerMode,
    is_break: bool,
    pomodoro_count: u32,
    config: &TimerConfig,
    estimate_minutes: Option<u32>,
) -> Option<u64> {
    match mode {
        TimerMode::Continuous => None,
        TimerMode::Countdown => estimate_minutes
            .filter(|m| *m > 0)
            .map(|m| u64::from(m) * 60),
        TimerMode::Pomodoro => {
            let minutes = match phase_for(is_break, pomodoro_count, config) {
                Phase::Work => config.pomodoro_work_minutes,
                Phase::ShortBreak => config.pomodoro_break_minutes,
                Phase::LongBreak => config.pomodoro_long_break_minutes,
            };
            Some(u64::from(minutes) * 60)
        }
    }
}

/// Seconds left against `target`; counts up (returns `elapsed`) without one.
pub fn remaining_secs(elapsed: u64, target: Option<u64>) -> u64 {
    match target {
        Some(target) => target.saturating_sub(elapsed),
        None => elapsed,
    }
}

/// `elapsed / target` capped at 1.0; 0.0 without a target.
pub fn progress_fraction(elapsed: u64, target: Option<u64>) -> f64 {
    match target {
        Some(target) if target > 0 => (elapsed as f64 / target as f64).min(1.0),
        _ => 0.0,
    }
}
