use std::io::BufRead;

use bcast_dispatch::{DispatchHandle, ProgressSnapshot};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Cancel,
    Status,
}

pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Command::Pause),
        "r" | "resume" => Some(Command::Resume),
        "c" | "cancel" | "stop" => Some(Command::Cancel),
        "s" | "status" => Some(Command::Status),
        _ => None,
    }
}

/// Applies operator commands typed on stdin until stdin closes.
///
/// Lines are read on a detached thread so a pending read never holds up
/// runtime shutdown.
pub async fn read_commands(handle: DispatchHandle) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    break;
                }
            }
        }
    });

    while let Some(line) = rx.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            eprintln!("unknown command {line:?} (pause | resume | cancel | status)");
            continue;
        };
        let accepted = match command {
            Command::Pause => handle.pause(),
            Command::Resume => handle.resume(),
            Command::Cancel => handle.cancel(),
            Command::Status => {
                eprintln!("{}", progress_line(&handle.progress()));
                true
            }
        };
        if !accepted {
            eprintln!("{command:?} ignored while {}", handle.status().as_str());
        }
        debug!(?command, accepted, "operator command");
    }
}

/// Prints one line per progress change until the run's channel closes.
pub async fn follow_progress(mut progress: watch::Receiver<ProgressSnapshot>) {
    while progress.changed().await.is_ok() {
        let line = progress_line(&progress.borrow_and_update());
        eprintln!("{line}");
    }
}

pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    let mut line = format!(
        "[{}] {}/{} sent ({} ok, {} failed)",
        snapshot.status.as_str(),
        snapshot.current_index,
        snapshot.total_count,
        snapshot.success_count,
        snapshot.failure_count
    );
    if let Some(label) = &snapshot.last_recipient_label {
        line.push_str(" last: ");
        line.push_str(label);
    }
    line
}
