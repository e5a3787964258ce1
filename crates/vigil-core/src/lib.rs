//! vigil-core
//!
//! Core building blocks for driving a dataset validation run against a remote engine.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（phase, column, state, report, score, ids, events, errors）
//! - **ports**: 抽象化レイヤー（Clock, RunIdGenerator, DatasetCatalog, ValidationEngine, EventSink）
//! - **app**: アプリケーションロジック（coordinator, control, timer, simulator, column_walker）
//! - **impls**: 実装（HttpEngine, ScriptedEngine, event sinks）
//! - **settings**: 階層化された設定（defaults → file → env）
//! - **logging**: tracing subscriber の初期化

pub mod app;
pub mod domain;
pub mod impls;
pub mod logging;
pub mod ports;
pub mod settings;

pub use self::app::{CoordinatorBuilder, RunCoordinator};
pub use self::domain::{RunError, RunPhase, RunState};
pub use self::settings::Settings;
