use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerMode};

/// Every timer state change produces an Event.
/// Hosts print or forward them; the engine itself does not keep them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        task_id: String,
        mode: TimerMode,
        /// True when an already-active session continued rather than began.
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        task_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        task_id: String,
        at: DateTime<Utc>,
    },
    /// A Pomodoro phase reached its target and the next one began.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        pomodoro_count: u32,
        next_target_secs: u64,
        at: DateTime<Utc>,
    },
}
