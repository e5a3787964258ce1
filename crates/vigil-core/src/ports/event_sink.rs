//! EventSink port - ランイベントの記録
//!
//! # 実装
//! - TracingEventSink: tracing に流す（デフォルト）
//! - RecordingEventSink: メモリに溜める（テスト用）
//! - NoopEventSink: 何もしない

use crate::domain::RunEvent;

/// Called from the coordinator task; implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}
