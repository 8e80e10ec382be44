//! `focusdesk config`: read and edit `config.toml` by dotted key.

use clap::Subcommand;
use focusdesk_core::{Config, ConfigError};

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting, e.g. `timer.pomodoro_work_minutes`
    Get { key: String },
    /// Change one setting and write the file
    Set { key: String, value: String },
    /// Print every setting as `key = value`
    List {
        /// Print the whole file as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Overwrite the file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match action {
        ConfigAction::Reset => Config::default(),
        _ => Config::load()?,
    };
    match action {
        ConfigAction::Get { key } => {
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            tracing::info!(%key, %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { json: true } => print_json(&config)?,
        ConfigAction::List { json: false } => {
            let entries = config.entries();
            let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in entries {
                println!("{key:<width$} = {value}");
            }
        }
        ConfigAction::Reset => {
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
