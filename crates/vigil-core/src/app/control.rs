//! RunControl - 協調的キャンセル / 一時停止トークン
//!
//! - cancel: `CancellationToken`（子トークンで個別アクティビティだけ止めることも可能）
//! - pause: `watch::channel(bool)`
//!
//! 一時停止中の待機はポーリングではなく `wait_for` でブロックし、キャンセルと競合させる。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What an activity should do at an iteration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Shared cancel/pause flags observed by every activity of one run.
///
/// Flipping a flag is visible to all clones immediately.
#[derive(Debug, Clone)]
pub struct RunControl {
    cancel: CancellationToken,
    pause_tx: Arc<watch::Sender<bool>>,
}

impl RunControl {
    pub fn new() -> Self {
        let (pause_tx, _) = watch::channel(false);
        Self {
            cancel: CancellationToken::new(),
            pause_tx: Arc::new(pause_tx),
        }
    }

    /// A control that stops when either this one is cancelled or the child itself is.
    /// Pause is shared.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            pause_tx: Arc::clone(&self.pause_tx),
        }
    }

    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// Flip the pause flag and return the new value.
    pub fn toggle_pause(&self) -> bool {
        let mut paused = false;
        self.pause_tx.send_modify(|p| {
            *p = !*p;
            paused = *p;
        });
        paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    pub fn subscribe_pause(&self) -> watch::Receiver<bool> {
        self.pause_tx.subscribe()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Iteration boundary: stop if cancelled, block while paused.
    pub async fn checkpoint(&self) -> Flow {
        if self.is_cancelled() {
            return Flow::Stop;
        }
        let mut pause_rx = self.pause_tx.subscribe();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Flow::Stop,
            res = pause_rx.wait_for(|paused| !*paused) => {
                if res.is_ok() { Flow::Continue } else { Flow::Stop }
            }
        }
    }

    /// Sleep one tick, then pass a checkpoint.
    pub async fn pace(&self, period: Duration) -> Flow {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Flow::Stop,
            _ = tokio::time::sleep(period) => {}
        }
        self.checkpoint().await
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_pause_flips() {
        let control = RunControl::new();
        assert!(!control.is_paused());
        assert!(control.toggle_pause());
        assert!(control.is_paused());
        assert!(!control.toggle_pause());
        assert!(!control.is_paused());
    }

    #[test]
    fn child_sees_parent_cancel_but_not_vice_versa() {
        let parent = RunControl::new();
        let child = parent.child();
        child.request_cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.request_cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn child_shares_pause() {
        let parent = RunControl::new();
        let child = parent.child();
        parent.toggle_pause();
        assert!(child.is_paused());
    }

    #[tokio::test]
    async fn checkpoint_passes_when_running() {
        let control = RunControl::new();
        assert_eq!(control.checkpoint().await, Flow::Continue);
    }

    #[tokio::test]
    async fn checkpoint_stops_when_cancelled() {
        let control = RunControl::new();
        control.request_cancel();
        assert_eq!(control.checkpoint().await, Flow::Stop);
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_blocks_until_resumed() {
        let control = RunControl::new();
        control.toggle_pause();

        let waiter = tokio::spawn({
            let control = control.clone();
            async move {
                let started = tokio::time::Instant::now();
                let flow = control.checkpoint().await;
                (flow, started.elapsed())
            }
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        control.toggle_pause();

        let (flow, waited) = waiter.await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(waited >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_releases_a_paused_checkpoint() {
        let control = RunControl::new();
        control.toggle_pause();

        let waiter = tokio::spawn({
            let control = control.clone();
            async move { control.checkpoint().await }
        });

        tokio::time::sleep(Duration::from_millis(300)).await;
        control.request_cancel();
        assert_eq!(waiter.await.unwrap(), Flow::Stop);
    }

    #[tokio::test(start_paused = true)]
    async fn pace_sleeps_one_period() {
        let control = RunControl::new();
        let started = tokio::time::Instant::now();
        assert_eq!(control.pace(Duration::from_millis(500)).await, Flow::Continue);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
