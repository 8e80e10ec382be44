//! Task management commands for CLI.

use clap::Subcommand;
use focusdesk_core::{Database, TaskStatus};

use super::print_json;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Estimated minutes (used as the countdown target)
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// List tasks
    List {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Filter by status: todo, in_progress or done
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Mark a task as done
    Done {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TaskAction::Add { title, estimate } => {
            if title.trim().is_empty() {
                return Err("task title must not be empty".into());
            }
            let task = db.create_task(title.trim(), estimate)?;
            print_json(&task)?;
        }
        TaskAction::List { json, status } => {
            let tasks: Vec<_> = db
                .list_tasks()?
                .into_iter()
                .filter(|t| status.map_or(true, |s| t.status == s))
                .collect();
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                for task in &tasks {
                    let estimate = task
                        .estimate_minutes
                        .map(|m| format!("{m}m"))
                        .unwrap_or_else(|| "-".into());
                    println!("{}  {:<11} {:>5}  {}", task.id, task.status, estimate, task.title);
                }
            }
        }
        TaskAction::Done { id } => {
            db.set_task_status(&id, TaskStatus::Done)?;
            println!("Task done: {id}");
        }
    }
    Ok(())
}
