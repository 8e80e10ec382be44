use std::sync::Arc;

use crate::error::{CoreError, TimerError, ValidationError};
use crate::ports::{NotificationSink, SessionRepository};
use crate::session::{Session, SessionDraft};

/// Turns a stopped timer into a persisted [`Session`].
pub struct SessionRecorder {
    repository: Box<dyn SessionRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl SessionRecorder {
    pub fn new(
        repository: Box<dyn SessionRepository>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Build and save the session.
    ///
    /// A failed save is reported to the user through the notifier and
    /// returned as [`TimerError::PersistenceFailure`], so it is never lost
    /// silently.
    pub fn record(&self, draft: SessionDraft) -> Result<Session, TimerError> {
        let result = validate(&draft).and_then(|()| {
            let session = Session::from_draft(draft.clone());
            self.repository.save(&session)
        });

        match result {
            Ok(saved) => {
                tracing::info!(
                    session_id = %saved.id,
                    task_id = %saved.task_id,
                    work_seconds = saved.work_seconds,
                    "session recorded"
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::warn!(task_id = %draft.task_id, error = %e, "failed to save session");
                self.notifier.notify(
                    "Session not saved",
                    &format!(
                        "Your session for {} may not have been saved: {e}",
                        draft.task_id
                    ),
                );
                Err(TimerError::PersistenceFailure(e))
            }
        }
    }
}

fn validate(draft: &SessionDraft) -> Result<(), CoreError> {
    if draft.ended_at < draft.started_at {
        return Err(ValidationError::InvalidTimeRange {
            start: draft.started_at,
            end: draft.ended_at,
        }
        .into());
    }
    Ok(())
}
