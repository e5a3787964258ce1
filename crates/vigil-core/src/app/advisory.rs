//! Advisory updates from the cosmetic activities.
//!
//! 各アクティビティは RunState を直接書き換えず、ここで定義したメッセージを
//! コーディネーターに送るだけ。適用するかどうかはコーディネーターが決める。

use tokio::sync::mpsc;

use crate::domain::ColumnStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Active (non-paused) whole seconds since the run started.
    Elapsed(u64),
    Progress {
        percent: u8,
        label: Option<String>,
    },
    Column {
        name: String,
        status: ColumnStatus,
        sub_status: Option<String>,
        percent: Option<u8>,
    },
    /// The column walker reached the last column on its own.
    WalkerFinished,
}

pub type AdvisoryTx = mpsc::UnboundedSender<Advisory>;
pub type AdvisoryRx = mpsc::UnboundedReceiver<Advisory>;

pub fn channel() -> (AdvisoryTx, AdvisoryRx) {
    mpsc::unbounded_channel()
}
