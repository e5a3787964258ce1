//! Ports - 抽象化レイヤー
//!
//! コーディネーターが外部に依存する箇所（時刻、ID、メタデータ取得、検証エンジン、
//! イベント出力）をすべて trait として切り出す。実装は `impls` に置く。

pub mod catalog;
pub mod clock;
pub mod engine;
pub mod event_sink;
pub mod id_generator;

pub use self::catalog::DatasetCatalog;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::engine::ValidationEngine;
pub use self::event_sink::EventSink;
pub use self::id_generator::{RunIdGenerator, UlidGenerator};
