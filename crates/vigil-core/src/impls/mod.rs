//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpEngine**: reqwest で検証バックエンドに接続（DatasetCatalog + ValidationEngine）
//! - **ScriptedEngine**: 台本どおりに応答する開発 / テスト用エンジン
//! - **TracingEventSink / RecordingEventSink / NoopEventSink**: イベント出力先

pub mod event_sinks;
pub mod http_engine;
pub mod scripted;

// 主要な型を再エクスポート
pub use self::event_sinks::{NoopEventSink, RecordingEventSink, TracingEventSink};
pub use self::http_engine::HttpEngine;
pub use self::scripted::ScriptedEngine;
