//! # Focusdesk Core Library
//!
//! This library provides the focus-timer core of the Focusdesk productivity
//! app: the timer state machine, its tick scheduler and the recorder that
//! turns a stopped timer into a persisted session. Hosts (the CLI, or any
//! UI) drive it through [`FocusTimer`] and render what it publishes.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine (continuous,
//!   countdown and Pomodoro modes) advanced by `tick()`
//! - **Scheduler**: A tokio interval that ticks the engine once per second
//! - **Recorder**: Saves completed sessions through a repository trait
//! - **Storage**: SQLite-backed tasks and sessions, TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: Composition root wiring engine, scheduler and recorder
//! - [`TimerEngine`]: Core timer state machine
//! - [`Database`]: Default task and session repository
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod ports;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, TimerError, ValidationError};
pub use events::Event;
pub use ports::{LogNotifier, NotificationSink, SessionRepository, TaskRepository};
pub use session::{Session, SessionDraft};
pub use storage::{Config, Database};
pub use task::{Task, TaskStatus};
pub use timer::{
    FocusTimer, Phase, SessionRecorder, StartOutcome, TimerConfig, TimerEngine, TimerMode,
    TimerScheduler, TimerSnapshot, TimerState,
};
