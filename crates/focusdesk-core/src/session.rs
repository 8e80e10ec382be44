use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::TimerMode;

/// A completed focus session. Produced once per stop, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub task_id: String,
    pub mode: TimerMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub work_seconds: u64,
    pub break_seconds: u64,
    #[serde(default)]
    pub pomodoro_count: u32,
}

/// Engine state captured just before a stop resets it to idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub task_id: String,
    pub mode: TimerMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub work_seconds: u64,
    pub break_seconds: u64,
    pub pomodoro_count: u32,
}

impl Session {
    pub fn from_draft(draft: SessionDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: draft.task_id,
            mode: draft.mode,
            started_at: draft.started_at,
            ended_at: Some(draft.ended_at),
            work_seconds: draft.work_seconds,
            break_seconds: draft.break_seconds,
            pomodoro_count: draft.pomodoro_count,
        }
    }

    /// Wall-clock span of the session in whole seconds.
    pub fn span_secs(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}
