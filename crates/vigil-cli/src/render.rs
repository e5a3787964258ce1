//! Terminal rendering of run snapshots.

use std::fmt::Write as _;

use vigil_core::domain::{ColumnStatus, RunPhase, RunState};

const BAR_WIDTH: usize = 20;

fn clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// One line per snapshot while the run is in flight.
pub fn progress_line(state: &RunState) -> String {
    let mut line = format!(
        "[{}] {:>3}% {} {}",
        bar(state.progress_percent),
        state.progress_percent,
        clock(state.elapsed_seconds),
        state.current_step_label
    );
    if !state.columns.is_empty() {
        let done = state.columns.count(ColumnStatus::Done);
        let _ = write!(line, " ({done}/{} columns)", state.columns.len());
    }
    if state.paused {
        line.push_str(" [paused]");
    }
    line
}

/// Final block printed once the run is terminal.
pub fn summary(state: &RunState) -> String {
    let elapsed = clock(state.final_elapsed_seconds.unwrap_or(state.elapsed_seconds));
    let mut out = String::new();
    match state.phase {
        RunPhase::Completed => {
            let _ = writeln!(out, "Validation complete in {elapsed}");
            if let Some(report) = &state.report {
                let _ = writeln!(out, "  health score   {}", report.health_score);
                let _ = writeln!(
                    out,
                    "  checks         {} total, {} passed, {} warnings, {} failed",
                    report.total_checks,
                    report.passed_checks,
                    report.warning_checks,
                    report.failed_checks
                );
                if let Some(ready) = report.ready_for_ml {
                    let _ = writeln!(out, "  ready for ML   {}", if ready { "yes" } else { "no" });
                }
            }
        }
        RunPhase::Failed => {
            let message = state.error_message.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Validation failed after {elapsed}: {message}");
        }
        RunPhase::Cancelled => {
            let _ = writeln!(
                out,
                "Validation cancelled after {elapsed} at {}%",
                state.progress_percent
            );
        }
        other => {
            let _ = writeln!(out, "Run ended in unexpected phase {other}");
        }
    }
    out
}
