//! RunState - UI が読むランの状態スナップショット
//!
//! # 設計原則
//! - 書き込みはコーディネーターのみ（single writer）
//! - 終端フェーズ（Cancelled / Completed / Failed）に入ったら以後は一切変更しない
//! - report が存在する ⇔ phase == Completed
//! - progress_percent == 100 ⇔ phase == Completed
//!
//! Every mutator returns whether it changed anything so the coordinator only publishes
//! real changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::column::{ColumnSet, ColumnStatus};
use super::ids::RunId;
use super::phase::RunPhase;
use super::report::Report;

pub const LABEL_INITIALIZING: &str = "Initializing validation...";
pub const LABEL_STARTING: &str = "Starting validation...";
pub const LABEL_PROCESSING: &str = "Processing results...";
pub const LABEL_COMPLETED: &str = "Validation complete";
pub const LABEL_CANCELLED: &str = "Validation cancelled";

/// Progress at the moment the run enters Running.
pub const RUNNING_FLOOR_PERCENT: u8 = 20;
/// Progress after the coordinator force-completes the columns.
pub const RECONCILED_PERCENT: u8 = 90;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: Option<RunId>,
    pub dataset_id: String,
    pub target_column: Option<String>,
    pub phase: RunPhase,
    /// UI-visible pause flag; independent of `phase`.
    pub paused: bool,
    pub loading: bool,
    pub progress_percent: u8,
    pub current_step_label: String,
    pub elapsed_seconds: u64,
    pub final_elapsed_seconds: Option<u64>,
    pub row_count: Option<u64>,
    pub columns: ColumnSet,
    pub report: Option<Report>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    /// A fresh state for a new run. Nothing from a previous run survives.
    pub fn begin(
        run_id: RunId,
        dataset_id: impl Into<String>,
        target_column: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: Some(run_id),
            dataset_id: dataset_id.into(),
            target_column,
            phase: RunPhase::Initializing,
            loading: true,
            current_step_label: LABEL_INITIALIZING.to_string(),
            started_at: Some(now),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    fn transition(&mut self, next: RunPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            tracing::debug!(from = %self.phase, to = %next, "rejected phase transition");
            return false;
        }
        self.phase = next;
        true
    }

    /// Column keys are fixed here and only here.
    pub fn seed_columns(&mut self, columns: ColumnSet, row_count: Option<u64>) -> bool {
        if self.phase != RunPhase::Initializing {
            return false;
        }
        self.columns = columns;
        self.row_count = row_count;
        true
    }

    pub fn start_running(&mut self) -> bool {
        if !self.transition(RunPhase::Running) {
            return false;
        }
        self.progress_percent = self.progress_percent.max(RUNNING_FLOOR_PERCENT);
        self.current_step_label = LABEL_STARTING.to_string();
        true
    }

    /// Advisory progress. Never decreases and never reaches 100 on its own.
    pub fn propose_progress(&mut self, percent: u8, label: Option<String>) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        let mut changed = false;
        let percent = percent.min(99);
        if percent > self.progress_percent {
            self.progress_percent = percent;
            changed = true;
        }
        if let Some(label) = label
            && label != self.current_step_label
        {
            self.current_step_label = label;
            changed = true;
        }
        changed
    }

    pub fn set_paused(&mut self, paused: bool) -> bool {
        if !self.phase.is_active() || self.paused == paused {
            return false;
        }
        self.paused = paused;
        true
    }

    pub fn set_elapsed(&mut self, seconds: u64) -> bool {
        if !self.phase.is_active() || seconds == self.elapsed_seconds {
            return false;
        }
        self.elapsed_seconds = seconds;
        true
    }

    pub fn update_column(
        &mut self,
        name: &str,
        status: ColumnStatus,
        sub_status: Option<String>,
    ) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        self.columns.advance(name, status, sub_status)
    }

    /// Bounded wait expired (or walker finished): every column becomes done and the
    /// bar jumps to the reconciliation mark.
    pub fn reconcile_columns(&mut self) -> usize {
        if self.phase != RunPhase::Running {
            return 0;
        }
        let forced = self.columns.force_complete();
        self.progress_percent = self.progress_percent.max(RECONCILED_PERCENT);
        self.current_step_label = LABEL_PROCESSING.to_string();
        forced
    }

    pub fn complete(&mut self, report: Report, final_elapsed: u64, now: DateTime<Utc>) -> bool {
        if !self.transition(RunPhase::Completed) {
            return false;
        }
        self.columns.force_complete();
        self.progress_percent = 100;
        self.current_step_label = LABEL_COMPLETED.to_string();
        self.report = Some(report);
        self.error_message = None;
        self.finish(final_elapsed, now);
        true
    }

    /// Failed clears the bar and the label.
    pub fn fail(&mut self, message: impl Into<String>, final_elapsed: u64, now: DateTime<Utc>) -> bool {
        if !self.transition(RunPhase::Failed) {
            return false;
        }
        self.progress_percent = 0;
        self.current_step_label.clear();
        self.report = None;
        self.error_message = Some(message.into());
        self.finish(final_elapsed, now);
        true
    }

    /// Cancelled freezes whatever partial progress was accumulated.
    pub fn cancel(&mut self, final_elapsed: u64, now: DateTime<Utc>) -> bool {
        if !self.transition(RunPhase::Cancelled) {
            return false;
        }
        self.current_step_label = LABEL_CANCELLED.to_string();
        self.report = None;
        self.finish(final_elapsed, now);
        true
    }

    fn finish(&mut self, final_elapsed: u64, now: DateTime<Utc>) {
        self.loading = false;
        self.paused = false;
        self.elapsed_seconds = final_elapsed;
        self.final_elapsed_seconds = Some(final_elapsed);
        self.finished_at = Some(now);
    }

    /// Cross-field invariants. Used by tests and debug assertions.
    pub fn invariants_hold(&self) -> bool {
        let completed = self.phase == RunPhase::Completed;
        let report_iff_completed = self.report.is_some() == completed;
        let full_iff_completed = (self.progress_percent == 100) == completed;
        let error_iff_failed = self.error_message.is_some() == (self.phase == RunPhase::Failed);
        let final_iff_terminal = self.final_elapsed_seconds.is_some() == self.is_terminal();
        let columns_done = !completed || self.columns.all_done();
        report_iff_completed && full_iff_completed && error_iff_failed && final_iff_terminal && columns_done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn running(columns: &[&str]) -> RunState {
        let mut state = RunState::begin(RunId::from(Ulid::new()), "ds-1", None, now());
        state.seed_columns(ColumnSet::from_names(columns.iter().copied()), Some(10));
        state.start_running();
        state
    }

    fn report() -> Report {
        Report::from_payload(serde_json::json!({"checks": [], "healthScore": 80})).unwrap()
    }

    #[test]
    fn begin_resets_everything() {
        let state = RunState::begin(RunId::from(Ulid::new()), "ds-1", Some("label".into()), now());
        assert_eq!(state.phase, RunPhase::Initializing);
        assert_eq!(state.progress_percent, 0);
        assert!(state.report.is_none());
        assert!(state.loading);
        assert!(state.invariants_hold());
    }

    #[test]
    fn progress_is_monotonic_and_below_100() {
        let mut state = running(&["a"]);
        assert!(state.propose_progress(40, None));
        assert!(!state.propose_progress(30, None));
        assert_eq!(state.progress_percent, 40);
        state.propose_progress(100, None);
        assert_eq!(state.progress_percent, 99);
        assert!(state.invariants_hold());
    }

    #[test]
    fn columns_cannot_be_reseeded_after_initializing() {
        let mut state = running(&["a", "b"]);
        assert!(!state.seed_columns(ColumnSet::from_names(["z"]), None));
        assert_eq!(state.columns.names(), vec!["a", "b"]);
    }

    #[test]
    fn complete_sets_report_and_full_progress() {
        let mut state = running(&["a", "b"]);
        state.update_column("a", ColumnStatus::Done, None);
        assert!(state.complete(report(), 3, now()));
        assert_eq!(state.progress_percent, 100);
        assert!(state.columns.all_done());
        assert_eq!(state.final_elapsed_seconds, Some(3));
        assert!(!state.loading);
        assert!(state.invariants_hold());
    }

    #[test]
    fn fail_resets_progress_and_label() {
        let mut state = running(&["a"]);
        state.propose_progress(60, Some("Validating Duplicates...".into()));
        assert!(state.fail("boom", 2, now()));
        assert_eq!(state.progress_percent, 0);
        assert_eq!(state.current_step_label, "");
        assert_eq!(state.error_message.as_deref(), Some("boom"));
        assert!(state.invariants_hold());
    }

    #[test]
    fn cancel_freezes_partial_progress() {
        let mut state = running(&["a", "b"]);
        state.update_column("a", ColumnStatus::Checking, None);
        state.propose_progress(42, None);
        assert!(state.cancel(1, now()));
        assert_eq!(state.progress_percent, 42);
        assert_eq!(state.columns.status_of("a"), Some(ColumnStatus::Checking));
        assert_eq!(state.current_step_label, LABEL_CANCELLED);
        assert!(state.error_message.is_none());
        assert!(state.invariants_hold());
    }

    #[test]
    fn terminal_state_rejects_every_mutation() {
        let mut state = running(&["a"]);
        state.cancel(1, now());
        let frozen = state.clone();

        assert!(!state.propose_progress(80, Some("x".into())));
        assert!(!state.update_column("a", ColumnStatus::Done, None));
        assert!(!state.set_elapsed(99));
        assert!(!state.set_paused(true));
        assert_eq!(state.reconcile_columns(), 0);
        assert!(!state.complete(report(), 9, now()));
        assert!(!state.fail("late", 9, now()));
        assert_eq!(state, frozen);
    }

    #[test]
    fn initializing_can_be_cancelled() {
        let mut state = RunState::begin(RunId::from(Ulid::new()), "ds-1", None, now());
        assert!(state.cancel(0, now()));
        assert_eq!(state.phase, RunPhase::Cancelled);
    }

    #[test]
    fn reconcile_forces_columns_and_sets_ninety() {
        let mut state = running(&["a", "b", "c"]);
        state.update_column("a", ColumnStatus::Done, None);
        assert_eq!(state.reconcile_columns(), 2);
        assert_eq!(state.progress_percent, RECONCILED_PERCENT);
        assert_eq!(state.current_step_label, LABEL_PROCESSING);
    }
}
