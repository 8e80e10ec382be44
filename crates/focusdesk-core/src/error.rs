//! Error types for focusdesk-core.
//!
//! `TimerError` is what the timer surface returns to callers. `CoreError`
//! covers storage, configuration and validation failures underneath it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::timer::TimerMode;

/// Errors surfaced by the timer engine, scheduler and recorder.
#[derive(Error, Debug)]
pub enum TimerError {
    /// A required argument was missing or malformed (e.g. empty task id).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Another task or mode is already active on this engine.
    #[error("Timer already active for task '{task_id}' in {mode} mode")]
    AlreadyActive { task_id: String, mode: TimerMode },

    /// The session could not be handed to the repository.
    /// The timer itself has already returned to idle.
    #[error("Session may not have been saved: {0}")]
    PersistenceFailure(#[source] CoreError),

    /// No repeating-timer facility is available to drive ticks.
    #[error("Cannot schedule timer ticks: {0}")]
    SchedulingFailure(String),
}

/// Failures from the collaborators behind the timer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage: {0}")]
    Database(#[from] DatabaseError),

    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("Rejected: {0}")]
    Validation(#[from] ValidationError),

    /// Failure reported by a non-SQLite repository or sink.
    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Cannot open session store {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite: {0}")]
    QueryFailed(String),

    #[error("Schema upgrade failed: {0}")]
    MigrationFailed(String),

    /// Another process holds the write lock; retry later.
    #[error("Session store is busy")]
    Locked,

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Cannot write {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Bad value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    /// A session that ends before it starts.
    #[error("Session ends ({end}) before it starts ({start})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("'{field}' {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        let busy = matches!(
            &err,
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
        );
        if busy {
            DatabaseError::Locked
        } else {
            DatabaseError::QueryFailed(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failure_keeps_source() {
        let err = TimerError::PersistenceFailure(CoreError::Backend("offline".into()));
        assert_eq!(err.to_string(), "Session may not have been saved: offline");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn already_active_names_task_and_mode() {
        let err = TimerError::AlreadyActive {
            task_id: "t1".into(),
            mode: TimerMode::Pomodoro,
        };
        assert_eq!(
            err.to_string(),
            "Timer already active for task 't1' in pomodoro mode"
        );
    }

    #[test]
    fn sqlite_busy_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }

    #[test]
    fn not_found_names_entity() {
        let err: CoreError = DatabaseError::NotFound {
            entity: "task",
            id: "abc".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Storage: task 'abc' not found");
    }
}
