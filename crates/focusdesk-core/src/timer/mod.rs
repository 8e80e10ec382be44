mod controller;
mod duration;
mod engine;
mod recorder;
mod scheduler;
mod state;

pub use controller::{FocusTimer, FocusTimerBuilder, StartOutcome};
pub use duration::{
    phase_for, progress_fraction, remaining_secs, target_duration_for, TimerConfig,
};
pub use engine::TimerEngine;
pub use recorder::SessionRecorder;
pub use scheduler::{lock_engine, SharedEngine, TimerScheduler};
pub use state::{Phase, TimerMode, TimerSnapshot, TimerState};
