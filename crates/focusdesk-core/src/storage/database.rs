//! SQLite-based task and session storage.
//!
//! Provides persistent storage for:
//! - Tasks (title, estimate, status)
//! - Completed focus sessions (append-only history)
//! - Key-value store for application state (e.g. a parked timer)

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError};
use crate::ports::{SessionRepository, TaskRepository};
use crate::session::Session;
use crate::task::{Task, TaskStatus};
use crate::timer::TimerMode;

/// SQLite database behind a mutex so it can be shared across threads.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/focusdesk.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusdesk.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests and dry runs).
    pub fn open_memory() -> Result<Self, CoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CoreError> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&self, title: &str, estimate_minutes: Option<u32>) -> Result<Task, CoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::Validation(
                crate::error::ValidationError::InvalidValue {
                    field: "title".into(),
                    message: "must not be empty".into(),
                },
            ));
        }
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            estimate_minutes,
            status: TaskStatus::Todo,
            created_at: Utc::now(),
        };
        let now = task.created_at.to_rfc3339();
        self.conn().execute(
            "INSERT INTO tasks (id, title, estimate_minutes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![task.id, task.title, task.estimate_minutes, task.status.as_str(), now],
        )?;
        Ok(task)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>, CoreError> {
        let conn = self.conn();
        let task = conn
            .query_row(
                "SELECT id, title, estimate_minutes, status, created_at FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, CoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, estimate_minutes, status, created_at
             FROM tasks ORDER BY created_at",
        )?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn set_task_status(&self, id: &str, status: TaskStatus) -> Result<(), CoreError> {
        let changed = self.conn().execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "task",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Append a session to the history.
    pub fn insert_session(&self, session: &Session) -> Result<(), CoreError> {
        self.conn().execute(
            "INSERT INTO sessions
                (id, task_id, mode, started_at, ended_at, work_seconds, break_seconds, pomodoro_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.id,
                session.task_id,
                session.mode.as_str(),
                session.started_at.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
                session.work_seconds,
                session.break_seconds,
                session.pomodoro_count,
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<Session>, CoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, mode, started_at, ended_at, work_seconds, break_seconds, pomodoro_count
             FROM sessions ORDER BY started_at DESC LIMIT ?1",
        )?;
        let sessions = stmt
            .query_map(params![limit as i64], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    pub fn sessions_for_task(&self, task_id: &str) -> Result<Vec<Session>, CoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, mode, started_at, ended_at, work_seconds, break_seconds, pomodoro_count
             FROM sessions WHERE task_id = ?1 ORDER BY started_at DESC",
        )?;
        let sessions = stmt
            .query_map(params![task_id], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl TaskRepository for Database {
    fn estimate_minutes(&self, task_id: &str) -> Result<Option<u32>, CoreError> {
        Ok(self.get_task(task_id)?.and_then(|t| t.estimate_minutes))
    }

    fn set_in_progress(&self, task_id: &str) -> Result<(), CoreError> {
        self.set_task_status(task_id, TaskStatus::InProgress)
    }
}

impl SessionRepository for Database {
    fn save(&self, session: &Session) -> Result<Session, CoreError> {
        self.insert_session(session)?;
        Ok(session.clone())
    }
}

impl<T: TaskRepository + Sync + ?Sized> TaskRepository for Arc<T> {
    fn estimate_minutes(&self, task_id: &str) -> Result<Option<u32>, CoreError> {
        (**self).estimate_minutes(task_id)
    }

    fn set_in_progress(&self, task_id: &str) -> Result<(), CoreError> {
        (**self).set_in_progress(task_id)
    }
}

impl<T: SessionRepository + Sync + ?Sized> SessionRepository for Arc<T> {
    fn save(&self, session: &Session) -> Result<Session, CoreError> {
        (**self).save(session)
    }
}

fn parse_time(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn parse_enum<T: std::str::FromStr<Err = String>>(idx: usize, value: String) -> rusqlite::Result<T> {
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        estimate_minutes: row.get(2)?,
        status: parse_enum::<TaskStatus>(3, row.get(3)?)?,
        created_at: parse_time(4, row.get(4)?)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let ended_at: Option<String> = row.get(4)?;
    Ok(Session {
        id: row.get(0)?,
        task_id: row.get(1)?,
        mode: parse_enum::<TimerMode>(2, row.get(2)?)?,
        started_at: parse_time(3, row.get(3)?)?,
        ended_at: ended_at.map(|t| parse_time(4, t)).transpose()?,
        work_seconds: row.get(5)?,
        break_seconds: row.get(6)?,
        pomodoro_count: row.get(7)?,
    })
}
