use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use focusdesk_core::{
    Config, Database, FocusTimer, Phase, StartOutcome, TimerMode, TimerSnapshot, TimerState,
};

use super::print_json;
use crate::notifier::TerminalNotifier;

const TIMER_KEY: &str = "timer_state";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or switch to) a timer for a task
    Start {
        /// Task ID to time
        task_id: String,
        /// Timer mode: continuous, countdown or pomodoro
        #[arg(long, default_value = "continuous")]
        mode: TimerMode,
    },
    /// Run a timer in the foreground until Ctrl-C, then record it
    Run {
        /// Task ID to time
        task_id: String,
        /// Timer mode: continuous, countdown or pomodoro
        #[arg(long, default_value = "continuous")]
        mode: TimerMode,
    },
    /// Pause the running timer
    Pause,
    /// Resume the paused timer
    Resume,
    /// Zero elapsed time, keeping task and mode
    Reset,
    /// Stop the timer and record the session
    Stop,
    /// Print current timer state as JSON
    Status,
}

fn load_state(db: &Database) -> TimerState {
    match db.kv_get(TIMER_KEY) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable timer state");
            TimerState::default()
        }),
        Ok(None) => TimerState::default(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read timer state");
            TimerState::default()
        }
    }
}

fn save_state(db: &Database, timer: &FocusTimer) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(&timer.state())?;
    db.kv_set(TIMER_KEY, &json)?;
    Ok(())
}

fn open_timer() -> Result<(Arc<Database>, FocusTimer), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Arc::new(Database::open()?);
    let state = load_state(&db);
    let timer = FocusTimer::builder(
        config.timer_config(),
        Box::new(db.clone()),
        Box::new(db.clone()),
    )
    .notifier(Arc::new(TerminalNotifier))
    .state(state)
    .build();
    Ok((db, timer))
}

/// Print the session a task switch closed, or why it was lost.
fn report_switch(outcome: &StartOutcome) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(previous) = &outcome.replaced {
        print_json(previous)?;
    }
    if let Some(e) = &outcome.replace_error {
        eprintln!("warning: previous timer stopped but not recorded: {e}");
    }
    Ok(())
}

/// `MM:SS`, or `H:MM:SS` past the hour.
fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn status_line(snap: &TimerSnapshot) -> String {
    let task = snap.task_id.as_deref().unwrap_or("-");
    let mut line = match snap.target_secs {
        Some(_) => format!(
            "{task} [{}] {} left ({:.0}%)",
            snap.mode,
            format_clock(snap.remaining_secs),
            snap.progress * 100.0
        ),
        None => format!("{task} [{}] {}", snap.mode, format_clock(snap.elapsed_secs)),
    };
    if let Some(phase) = snap.phase {
        // Breaks belong to the pomodoro that just finished.
        let (label, number) = match phase {
            Phase::Work => ("work", snap.pomodoro_count + 1),
            Phase::ShortBreak => ("short break", snap.pomodoro_count),
            Phase::LongBreak => ("long break", snap.pomodoro_count),
        };
        line.push_str(&format!(" {label} #{number}"));
    }
    line
}

async fn run_foreground(
    timer: &mut FocusTimer,
    db: &Database,
    task_id: &str,
    mode: TimerMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = timer.start(task_id, mode)?;
    report_switch(&outcome)?;
    save_state(db, timer)?;

    let mut rx = timer.subscribe();
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = status_line(&rx.borrow_and_update());
                write!(stdout, "\r\x1b[2K{line}")?;
                stdout.flush()?;
            }
        }
    }
    writeln!(stdout)?;
    Ok(())
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let (db, mut timer) = open_timer()?;

    match action {
        TimerAction::Start { task_id, mode } => {
            let outcome = timer.start(&task_id, mode)?;
            report_switch(&outcome)?;
            match outcome.event {
                Some(event) => print_json(&event)?,
                None => print_json(&timer.snapshot())?,
            }
        }
        TimerAction::Run { task_id, mode } => {
            let result = run_foreground(&mut timer, &db, &task_id, mode).await;
            if let Err(e) = result {
                save_state(&db, &timer)?;
                return Err(e);
            }
            let stopped = timer.stop();
            save_state(&db, &timer)?;
            if let Some(session) = stopped? {
                print_json(&session)?;
            }
            return Ok(());
        }
        TimerAction::Pause => match timer.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&timer.snapshot())?,
        },
        TimerAction::Resume => {
            let outcome = timer.resume()?;
            match outcome.event {
                Some(event) => print_json(&event)?,
                None => print_json(&timer.snapshot())?,
            }
        }
        TimerAction::Reset => {
            timer.refresh();
            match timer.reset() {
                Some(event) => print_json(&event)?,
                None => print_json(&timer.snapshot())?,
            }
        }
        TimerAction::Stop => {
            let stopped = timer.stop();
            // The timer is idle even when the save failed; park that first.
            save_state(&db, &timer)?;
            match stopped {
                Ok(Some(session)) => print_json(&session)?,
                Ok(None) => println!("{{\"type\": \"timer_idle\"}}"),
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }
        TimerAction::Status => {
            if let Some(event) = timer.refresh() {
                print_json(&event)?;
            }
            print_json(&timer.snapshot())?;
        }
    }

    save_state(&db, &timer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(125), "02:05");
        assert_eq!(format_clock(3_725), "1:02:05");
    }

    #[test]
    fn status_line_shows_remaining_for_targets() {
        let snap = TimerSnapshot {
            task_id: Some("t1".into()),
            mode: TimerMode::Pomodoro,
            is_running: true,
            phase: Some(Phase::Work),
            elapsed_secs: 300,
            remaining_secs: 1_200,
            target_secs: Some(1_500),
            progress: 0.2,
            pomodoro_count: 0,
            at: chrono::Utc::now(),
        };
        assert_eq!(status_line(&snap), "t1 [pomodoro] 20:00 left (20%) work #1");
    }

    #[test]
    fn status_line_counts_up_without_target() {
        let snap = TimerSnapshot {
            task_id: Some("t1".into()),
            mode: TimerMode::Continuous,
            is_running: true,
            phase: None,
            elapsed_secs: 65,
            remaining_secs: 65,
            target_secs: None,
            progress: 0.0,
            pomodoro_count: 0,
            at: chrono::Utc::now(),
        };
        assert_eq!(status_line(&snap), "t1 [continuous] 01:05");
    }
}
