//! Collaborators the timer core talks to but does not own.
//!
//! Storage, task bookkeeping and user notification all live behind these
//! traits. `storage::Database` provides the default SQLite implementations.

use crate::error::CoreError;
use crate::session::Session;

/// Task-side operations needed by the timer.
pub trait TaskRepository: Send {
    /// Estimated minutes for the task, if one was set.
    fn estimate_minutes(&self, task_id: &str) -> Result<Option<u32>, CoreError>;

    /// Mark the task as in progress. Called when a timer starts for it.
    fn set_in_progress(&self, task_id: &str) -> Result<(), CoreError>;
}

/// Durable, append-only session history.
pub trait SessionRepository: Send {
    fn save(&self, session: &Session) -> Result<Session, CoreError>;
}

/// User-facing notifications and sounds.
///
/// Called from the scheduler task on phase transitions, hence `Sync`.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);

    /// Play the notification sound.
    fn chime(&self) {}
}

/// Notification sink that writes to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(target: "focusdesk::notify", %title, %body);
    }
}
