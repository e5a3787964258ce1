//! PhaseSimulator - 擬似的な進捗とステップ名
//!
//! 実際の検証とは無関係に、カテゴリ一覧を順に表示しながら進捗を少しずつ進める。
//! - 一時停止中 / キャンセル後は進めない
//! - ceiling（既定 85%）に達したら終了
//! - フェーズ遷移は行わない（終了させるのはコーディネーター）

use std::time::Duration;

use tokio::sync::watch;

use super::advisory::{Advisory, AdvisoryTx};
use super::control::{Flow, RunControl};
use crate::domain::RunState;
use crate::settings::TimingSettings;

/// Validation categories in the order the engine runs them.
pub const CATEGORIES: [&str; 11] = [
    "File Level",
    "Structure",
    "Data Types",
    "Missing Data",
    "Duplicates",
    "Target Variable",
    "Class Distribution",
    "Feature Quality",
    "Value Integrity",
    "Data Leakage",
    "Consistency",
];

#[derive(Debug, Clone)]
pub struct PhaseSimulator {
    tick: Duration,
    increment: u8,
    floor: u8,
    ceiling: u8,
}

impl PhaseSimulator {
    pub fn from_settings(timing: &TimingSettings) -> Self {
        Self {
            tick: timing.simulator_tick(),
            increment: timing.simulator_increment,
            floor: timing.simulator_floor,
            ceiling: timing.simulator_ceiling,
        }
    }

    /// Next proposal given the current published progress, or `None` once the ceiling is reached.
    pub fn step(&self, current: u8) -> Option<(u8, String)> {
        if current >= self.ceiling {
            return None;
        }
        let percent = current
            .max(self.floor)
            .saturating_add(self.increment)
            .min(self.ceiling);
        Some((percent, format!("Validating {}...", self.category_at(percent))))
    }

    /// Category shown at `percent`, spread evenly over the floor..ceiling band.
    pub fn category_at(&self, percent: u8) -> &'static str {
        let band = usize::from(self.ceiling.saturating_sub(self.floor)).max(1);
        let offset = usize::from(percent.saturating_sub(self.floor)).min(band - 1);
        CATEGORIES[offset * CATEGORIES.len() / band]
    }

    pub async fn run(self, control: RunControl, state: watch::Receiver<RunState>, tx: AdvisoryTx) {
        loop {
            if control.pace(self.tick).await == Flow::Stop {
                break;
            }
            let current = state.borrow().progress_percent;
            let Some((percent, label)) = self.step(current) else {
                tracing::trace!(current, "simulator reached ceiling");
                break;
            };
            let advisory = Advisory::Progress {
                percent,
                label: Some(label),
            };
            if tx.send(advisory).is_err() {
                break;
            }
        }
    }
}
