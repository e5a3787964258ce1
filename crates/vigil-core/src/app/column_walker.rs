//! ColumnWalker - 列ごとの擬似ステータス
//!
//! 宣言順に 1 列ずつ pending -> checking -> done と進める。
//! 次の列が checking になるのは前の列が done になってから。
//! 全列を歩き終えたら `Advisory::WalkerFinished` を送る。

use std::time::Duration;

use super::advisory::{Advisory, AdvisoryTx};
use super::control::{Flow, RunControl};
use crate::domain::ColumnStatus;
use crate::settings::TimingSettings;

#[derive(Debug, Clone)]
pub struct ColumnWalker {
    columns: Vec<String>,
    settle: Duration,
    floor: u8,
    ceiling: u8,
}

impl ColumnWalker {
    pub fn new(columns: Vec<String>, timing: &TimingSettings) -> Self {
        Self {
            columns,
            settle: timing.column_settle(),
            floor: timing.walker_floor,
            ceiling: timing.walker_ceiling,
        }
    }

    /// Progress once `done` columns are finished, linear within floor..=ceiling.
    pub fn percent_after(&self, done: usize) -> u8 {
        let total = self.columns.len();
        if total == 0 {
            return self.floor;
        }
        let band = usize::from(self.ceiling.saturating_sub(self.floor));
        let gained = band * done.min(total) / total;
        // gained <= band, which fits in u8
        self.floor.saturating_add(u8::try_from(gained).unwrap_or(u8::MAX))
    }

    pub async fn run(self, control: RunControl, tx: AdvisoryTx) {
        let total = self.columns.len();
        for (i, name) in self.columns.iter().enumerate() {
            if control.checkpoint().await == Flow::Stop {
                return;
            }
            let checking = Advisory::Column {
                name: name.clone(),
                status: ColumnStatus::Checking,
                sub_status: Some(format!("Checking column {} of {}", i + 1, total)),
                percent: None,
            };
            if tx.send(checking).is_err() {
                return;
            }

            if control.pace(self.settle).await == Flow::Stop {
                return;
            }
            let done = Advisory::Column {
                name: name.clone(),
                status: ColumnStatus::Done,
                sub_status: None,
                percent: Some(self.percent_after(i + 1)),
            };
            if tx.send(done).is_err() {
                return;
            }
        }
        tracing::debug!(columns = total, "column walker finished");
        let _ = tx.send(Advisory::WalkerFinished);
    }
}
