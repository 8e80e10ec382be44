use clap::Subcommand;
use focusdesk_core::Database;

use super::print_json;

#[derive(Subcommand)]
pub enum SessionAction {
    /// List recorded sessions, newest first
    List {
        /// Only sessions for this task
        #[arg(long)]
        task: Option<String>,
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::List { task, limit, json } => {
            let sessions = match task {
                Some(task_id) => {
                    let mut all = db.sessions_for_task(&task_id)?;
                    all.truncate(limit);
                    all
                }
                None => db.list_sessions(limit)?,
            };

            if json {
                print_json(&sessions)?;
                return Ok(());
            }
            if sessions.is_empty() {
                println!("no sessions");
                return Ok(());
            }
            for s in &sessions {
                println!(
                    "{}  {:<10} {:<10} work {:>5}s  break {:>5}s  {}",
                    s.started_at.format("%Y-%m-%d %H:%M"),
                    s.task_id,
                    s.mode,
                    s.work_seconds,
                    s.break_seconds,
                    s.id
                );
            }
        }
    }
    Ok(())
}
