//! App - アプリケーション層
//!
//! ports を組み合わせて検証ランを駆動します。
//!
//! # 主要コンポーネント
//! - **CoordinatorBuilder**: コーディネーターの構築とワイヤリング
//! - **RunCoordinator**: ランの状態機械（唯一の RunState 書き手）
//! - **RunControl**: 協調的キャンセル / 一時停止
//! - **RunTimer**: 一時停止を除いた経過時間
//! - **PhaseSimulator / ColumnWalker**: 擬似進捗（Advisory を送るだけ）

pub mod advisory;
pub mod builder;
pub mod column_walker;
pub mod control;
pub mod coordinator;
pub mod simulator;
pub mod timer;

// 主要な型を再エクスポート
pub use self::advisory::Advisory;
pub use self::builder::{BuildError, CoordinatorBuilder};
pub use self::column_walker::ColumnWalker;
pub use self::control::{Flow, RunControl};
pub use self::coordinator::RunCoordinator;
pub use self::simulator::PhaseSimulator;
pub use self::timer::{RunTimer, Stopwatch};
