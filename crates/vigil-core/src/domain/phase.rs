//! Run phase state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level lifecycle state of a validation run.
///
/// State transitions:
/// - Idle -> Initializing -> Running -> Completed
/// - Initializing | Running -> Cancelled
/// - Running -> Failed
///
/// `Paused` exists so a UI can render it, but the coordinator never stores it in
/// `RunState::phase`; pausing is tracked by the independent `paused` flag while the
/// phase stays `Running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Initializing,
    Running,
    Paused,
    Cancelled,
    Completed,
    Failed,
}

impl RunPhase {
    /// Is this a terminal phase (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunPhase::Cancelled | RunPhase::Completed | RunPhase::Failed
        )
    }

    /// Is a run in flight (pause/cancel are meaningful)?
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RunPhase::Initializing | RunPhase::Running | RunPhase::Paused
        )
    }

    /// Whether `self -> next` is a legal edge.
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        match (self, next) {
            // a fresh run may start from any settled phase
            (Idle | Cancelled | Completed | Failed, Initializing) => true,
            (Initializing, Running | Cancelled) => true,
            (Running, Cancelled | Completed | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Initializing => "initializing",
            RunPhase::Running => "running",
            RunPhase::Paused => "paused",
            RunPhase::Cancelled => "cancelled",
            RunPhase::Completed => "completed",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::cancelled(RunPhase::Cancelled)]
    #[case::completed(RunPhase::Completed)]
    #[case::failed(RunPhase::Failed)]
    fn terminal_phases(#[case] phase: RunPhase) {
        assert!(phase.is_terminal());
        assert!(!phase.is_active());
    }

    #[rstest]
    #[case::initializing(RunPhase::Initializing)]
    #[case::running(RunPhase::Running)]
    fn active_phases(#[case] phase: RunPhase) {
        assert!(phase.is_active());
        assert!(!phase.is_terminal());
    }

    #[test]
    fn terminal_phase_only_leaves_through_a_new_run() {
        assert!(RunPhase::Completed.can_transition_to(RunPhase::Initializing));
        assert!(!RunPhase::Completed.can_transition_to(RunPhase::Running));
        assert!(!RunPhase::Cancelled.can_transition_to(RunPhase::Completed));
        assert!(!RunPhase::Failed.can_transition_to(RunPhase::Cancelled));
    }

    #[test]
    fn initializing_cannot_complete_directly() {
        assert!(!RunPhase::Initializing.can_transition_to(RunPhase::Completed));
        assert!(RunPhase::Initializing.can_transition_to(RunPhase::Cancelled));
    }

    #[test]
    fn serializes_snake_case() {
        let s = serde_json::to_string(&RunPhase::Initializing).unwrap();
        assert_eq!(s, "\"initializing\"");
    }
}
