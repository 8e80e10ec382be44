mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, NotificationsConfig, TimerSection};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml` and `focusdesk.db`.
///
/// `FOCUSDESK_DATA_DIR` wins when set. Otherwise `~/.config/focusdesk[-dev]/`
/// based on FOCUSDESK_ENV (set FOCUSDESK_ENV=dev for the development copy).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSDESK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSDESK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusdesk-dev")
            } else {
                base_dir.join("focusdesk")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
