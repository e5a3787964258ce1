//! RunTimer - 経過時間の計測
//!
//! - 1 tick ごとに `Advisory::Elapsed` を送る（一時停止中は送らない）
//! - 一時停止区間は Stopwatch 側で差し引く
//! - `stop()` で最終値を確定し、以後は動かない

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::advisory::{Advisory, AdvisoryTx};
use super::control::RunControl;

/// Wall time since `origin`, minus paused intervals.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    origin: Instant,
    paused_since: Option<Instant>,
    paused_total: Duration,
    stopped_at: Option<Instant>,
}

impl Stopwatch {
    pub fn start(now: Instant) -> Self {
        Self {
            origin: now,
            paused_since: None,
            paused_total: Duration::ZERO,
            stopped_at: None,
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if self.stopped_at.is_none() && self.paused_since.is_none() {
            self.paused_since = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.stopped_at.is_some() {
            return;
        }
        if let Some(since) = self.paused_since.take() {
            self.paused_total += now.saturating_duration_since(since);
        }
    }

    pub fn active(&self, now: Instant) -> Duration {
        let end = self.stopped_at.unwrap_or(now);
        let open_pause = self
            .paused_since
            .map(|since| end.saturating_duration_since(since))
            .unwrap_or_default();
        end.saturating_duration_since(self.origin)
            .saturating_sub(self.paused_total + open_pause)
    }

    /// Freeze. Later calls return the same value.
    pub fn stop(&mut self, now: Instant) -> Duration {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
        self.active(now)
    }
}

pub struct RunTimer {
    stopwatch: Arc<Mutex<Stopwatch>>,
    task: JoinHandle<()>,
}

impl RunTimer {
    /// A run that is already paused starts with an open pause.
    pub fn start(control: &RunControl, tick: Duration, tx: AdvisoryTx) -> Self {
        // subscribe before reading the flag so no toggle falls in between
        let mut pause_rx = control.subscribe_pause();
        let now = Instant::now();
        let mut stopwatch = Stopwatch::start(now);
        if *pause_rx.borrow_and_update() {
            stopwatch.pause(now);
        }
        let stopwatch = Arc::new(Mutex::new(stopwatch));
        let task = tokio::spawn(tick_loop(
            control.clone(),
            pause_rx,
            tick,
            Arc::clone(&stopwatch),
            tx,
        ));
        Self { stopwatch, task }
    }

    /// Freeze the elapsed time and halt sampling. Returns whole seconds.
    pub fn stop(&self) -> u64 {
        self.task.abort();
        lock(&self.stopwatch).stop(Instant::now()).as_secs()
    }

    pub fn elapsed(&self) -> Duration {
        lock(&self.stopwatch).active(Instant::now())
    }
}

impl Drop for RunTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(stopwatch: &Mutex<Stopwatch>) -> std::sync::MutexGuard<'_, Stopwatch> {
    // the guarded value stays consistent even if a holder panicked
    stopwatch.lock().unwrap_or_else(|e| e.into_inner())
}

async fn tick_loop(
    control: RunControl,
    mut pause_rx: watch::Receiver<bool>,
    tick: Duration,
    stopwatch: Arc<Mutex<Stopwatch>>,
    tx: AdvisoryTx,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = control.cancelled() => break,
            changed = pause_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let paused = *pause_rx.borrow_and_update();
                let mut sw = lock(&stopwatch);
                if paused {
                    sw.pause(Instant::now());
                } else {
                    sw.resume(Instant::now());
                }
            }
            _ = ticker.tick() => {
                if control.is_paused() {
                    continue;
                }
                let seconds = lock(&stopwatch).active(Instant::now()).as_secs();
                if tx.send(Advisory::Elapsed(seconds)).is_err() {
                    break;
                }
            }
        }
    }
}
