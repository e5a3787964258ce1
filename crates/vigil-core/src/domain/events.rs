//! Events - ランで発生したイベント
//!
//! スナップショット（RunState）とは別に、フェーズ遷移など「何が起きたか」を EventSink に流す。

use serde::Serialize;

use super::ids::RunId;
use super::phase::RunPhase;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    PhaseChanged {
        run_id: RunId,
        from: RunPhase,
        to: RunPhase,
    },
    /// Metadata fetch failed; the run continues with no columns.
    MetadataUnavailable { run_id: RunId, reason: String },
    PauseToggled { run_id: RunId, paused: bool },
    /// Columns the walker had not reached when the bounded wait ended.
    ColumnsForced { run_id: RunId, count: usize },
    /// A remote result arrived after the run was already terminal.
    LateResultDiscarded { run_id: RunId },
    Finished {
        run_id: RunId,
        phase: RunPhase,
        elapsed_seconds: u64,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            RunEvent::PhaseChanged { run_id, .. }
            | RunEvent::MetadataUnavailable { run_id, .. }
            | RunEvent::PauseToggled { run_id, .. }
            | RunEvent::ColumnsForced { run_id, .. }
            | RunEvent::LateResultDiscarded { run_id }
            | RunEvent::Finished { run_id, .. } => *run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn serializes_with_event_tag() {
        let run_id = RunId::from(Ulid::new());
        let event = RunEvent::PhaseChanged {
            run_id,
            from: RunPhase::Running,
            to: RunPhase::Completed,
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["event"], "phase_changed");
        assert_eq!(v["to"], "completed");
        assert_eq!(event.run_id(), run_id);
    }
}
