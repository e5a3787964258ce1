//! EventSink の実装
//!
//! - TracingEventSink: tracing に構造化ログとして流す（デフォルト）
//! - RecordingEventSink: メモリに溜める（テスト / 埋め込み UI 用）
//! - NoopEventSink: 捨てる

use std::sync::Mutex;

use crate::domain::{RunEvent, RunPhase};
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: RunEvent) {
        match &event {
            RunEvent::MetadataUnavailable { run_id, reason } => {
                tracing::warn!(%run_id, reason = %reason, "event: metadata unavailable");
            }
            RunEvent::Finished {
                run_id,
                phase: RunPhase::Failed,
                elapsed_seconds,
            } => {
                tracing::warn!(%run_id, elapsed_seconds, "event: run failed");
            }
            other => {
                let payload = serde_json::to_string(other).unwrap_or_default();
                tracing::debug!(run_id = %other.run_id(), event = %payload, "event");
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: RunEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: RunEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunId;
    use ulid::Ulid;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingEventSink::default();
        let run_id = RunId::from(Ulid::new());
        sink.emit(RunEvent::PauseToggled { run_id, paused: true });
        sink.emit(RunEvent::PauseToggled { run_id, paused: false });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], RunEvent::PauseToggled { paused: true, .. }));

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn tracing_and_noop_sinks_accept_every_event() {
        let run_id = RunId::from(Ulid::new());
        let events = [
            RunEvent::MetadataUnavailable {
                run_id,
                reason: "404".into(),
            },
            RunEvent::Finished {
                run_id,
                phase: RunPhase::Failed,
                elapsed_seconds: 3,
            },
            RunEvent::ColumnsForced { run_id, count: 2 },
        ];
        for event in events {
            TracingEventSink.emit(event.clone());
            NoopEventSink.emit(event);
        }
    }
}
