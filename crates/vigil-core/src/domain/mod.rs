//! Domain model (run state, phases, columns, reports, ...).
//!
//! I/O を一切持たない純粋なモデル。状態遷移のルールはここに閉じ込める。

pub mod column;
pub mod dataset;
pub mod errors;
pub mod events;
pub mod ids;
pub mod phase;
pub mod report;
pub mod score;
pub mod state;

pub use self::column::{ColumnEntry, ColumnSet, ColumnStatus};
pub use self::dataset::DatasetInfo;
pub use self::errors::RunError;
pub use self::events::RunEvent;
pub use self::ids::RunId;
pub use self::phase::RunPhase;
pub use self::report::{Check, CheckStatus, Report, Severity};
pub use self::score::Tally;
pub use self::state::RunState;
