//! RunCoordinator - 検証ランのオーケストレーション
//!
//! # 流れ
//! 1. Initializing: 状態をリセットし、タイマー開始、メタデータ取得（失敗しても続行）
//! 2. Running: シミュレーター / カラムウォーカー / リモート呼び出しを並行起動
//! 3. リモートが解決したら、ウォーカーを最大 `bounded_wait` だけ待ち、残りを強制完了
//! 4. "Processing results..." を挟んで Completed（または Failed / Cancelled）
//!
//! # Single writer
//! RunState を書き換えるのはこのモジュールだけ。各アクティビティは `Advisory` を送るだけで、
//! 反映後のスナップショットを `watch` で公開する。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;

use super::advisory::{self, Advisory};
use super::builder::CoordinatorBuilder;
use super::column_walker::ColumnWalker;
use super::control::RunControl;
use super::simulator::PhaseSimulator;
use super::timer::RunTimer;
use crate::domain::{ColumnSet, Report, RunError, RunEvent, RunId, RunPhase, RunState};
use crate::ports::{Clock, DatasetCatalog, EventSink, RunIdGenerator, ValidationEngine};
use crate::settings::{RunTarget, TimingSettings};

type RemoteHandle = JoinHandle<Result<Value, RunError>>;

/// Drives one validation run at a time for a fixed dataset / target column.
pub struct RunCoordinator {
    target: RunTarget,
    timing: TimingSettings,
    abort_remote_on_cancel: bool,
    catalog: Arc<dyn DatasetCatalog>,
    engine: Arc<dyn ValidationEngine>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn RunIdGenerator>,
    events: Arc<dyn EventSink>,
    state_tx: watch::Sender<RunState>,
    control: Mutex<Option<RunControl>>,
    active: AtomicBool,
}

impl RunCoordinator {
    pub fn builder(target: RunTarget) -> CoordinatorBuilder {
        CoordinatorBuilder::new(target)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        target: RunTarget,
        timing: TimingSettings,
        abort_remote_on_cancel: bool,
        catalog: Arc<dyn DatasetCatalog>,
        engine: Arc<dyn ValidationEngine>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn RunIdGenerator>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(RunState::default());
        Self {
            target,
            timing,
            abort_remote_on_cancel,
            catalog,
            engine,
            clock,
            ids,
            events,
            state_tx,
            control: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &RunTarget {
        &self.target
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> RunState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Toggle pause on the active run. Returns the new pause flag, or `None` when
    /// there is nothing to pause.
    pub fn pause_or_resume(&self) -> Option<bool> {
        let guard = lock(&self.control);
        match guard.as_ref() {
            Some(control) if !control.is_cancelled() => {
                let paused = control.toggle_pause();
                tracing::info!(paused, "pause toggled");
                Some(paused)
            }
            _ => {
                tracing::debug!("pause ignored, no active run");
                None
            }
        }
    }

    /// Request cancellation of the active run. Returns false when there is none.
    pub fn cancel(&self) -> bool {
        let guard = lock(&self.control);
        match guard.as_ref() {
            Some(control) if !control.is_cancelled() => {
                tracing::info!("cancel requested");
                control.request_cancel();
                true
            }
            _ => {
                tracing::debug!("cancel ignored, no active run");
                false
            }
        }
    }

    /// Run one validation to a terminal phase and return the final snapshot.
    ///
    /// Failed and Cancelled runs are `Ok`; the outcome lives in `RunState::phase`.
    /// Only a second call while a run is active is an error.
    pub async fn run_validation(&self) -> Result<RunState, RunError> {
        if self.active.swap(true, Ordering::AcqRel) {
            tracing::warn!(dataset_id = %self.target.dataset_id, "run requested while another is active");
            return Err(RunError::AlreadyRunning);
        }
        let control = RunControl::new();
        *lock(&self.control) = Some(control.clone());
        let _guard = ActiveGuard { coordinator: self };

        let run_id = self.ids.generate_run_id();
        let span = tracing::info_span!("run", run_id = %run_id, dataset_id = %self.target.dataset_id);
        Ok(self.drive(run_id, control).instrument(span).await)
    }

    async fn drive(&self, run_id: RunId, control: RunControl) -> RunState {
        let previous = self.state_tx.borrow().phase;
        let mut run = ActiveRun {
            coordinator: self,
            run_id,
            state: RunState::begin(
                run_id,
                self.target.dataset_id.clone(),
                self.target.target_column.clone(),
                self.clock.now(),
            ),
        };
        run.publish();
        run.emit_phase(previous);

        // subscribe before reading the flag so no toggle is missed
        let mut pause_rx = control.subscribe_pause();
        let (adv_tx, mut adv_rx) = advisory::channel();
        let timer = RunTimer::start(&control, self.timing.timer_tick(), adv_tx.clone());

        // Initializing
        let info = tokio::select! {
            biased;
            _ = control.cancelled() => return run.cancelled(&timer, None),
            info = self.catalog.dataset_info(&self.target.dataset_id) => info,
        };
        let (columns, row_count) = match info {
            Ok(info) => (ColumnSet::from_names(info.column_names), Some(info.row_count)),
            Err(err) => {
                tracing::warn!(error = %err, "dataset metadata unavailable, continuing without columns");
                self.events.emit(RunEvent::MetadataUnavailable {
                    run_id,
                    reason: err.to_string(),
                });
                (ColumnSet::default(), None)
            }
        };
        tracing::debug!(columns = columns.len(), "columns seeded");
        run.state.seed_columns(columns, row_count);
        run.enter(RunState::start_running);
        let paused = *pause_rx.borrow_and_update();
        run.pause_changed(paused);

        // Running
        let activity = control.child();
        let mut activities = Activities {
            control: activity.clone(),
            simulator: tokio::spawn(PhaseSimulator::from_settings(&self.timing).run(
                activity.clone(),
                self.state_tx.subscribe(),
                adv_tx.clone(),
            )),
            walker: tokio::spawn(
                ColumnWalker::new(run.state.columns.names(), &self.timing).run(activity, adv_tx),
            ),
        };
        let mut remote = self.spawn_remote();

        let mut walker_finished = false;
        let resolution = loop {
            tokio::select! {
                biased;
                _ = control.cancelled() => break None,
                joined = &mut remote => break Some(flatten(joined)),
                Some(advisory) = adv_rx.recv() => {
                    walker_finished |= advisory == Advisory::WalkerFinished;
                    run.apply(advisory);
                }
                Ok(()) = pause_rx.changed() => {
                    let paused = *pause_rx.borrow_and_update();
                    run.pause_changed(paused);
                }
            }
        };
        let Some(result) = resolution else {
            activities.stop();
            return run.cancelled(&timer, Some(remote));
        };
        activities.simulator.abort();

        let report = match result.and_then(Report::from_payload) {
            Ok(report) => report,
            Err(err) => {
                activities.stop();
                return run.failed(&timer, err);
            }
        };

        // Bounded wait for the walker
        if !walker_finished {
            let limit = self.timing.bounded_wait(run.state.columns.len());
            let deadline = tokio::time::sleep(limit);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    biased;
                    _ = control.cancelled() => {
                        activities.stop();
                        return run.cancelled(&timer, None);
                    }
                    _ = &mut deadline => {
                        tracing::debug!(limit_ms = limit.as_millis() as u64, "bounded wait elapsed");
                        break;
                    }
                    Some(advisory) = adv_rx.recv() => {
                        let finished = advisory == Advisory::WalkerFinished;
                        run.apply(advisory);
                        if finished {
                            break;
                        }
                    }
                    Ok(()) = pause_rx.changed() => {
                        let paused = *pause_rx.borrow_and_update();
                        run.pause_changed(paused);
                    }
                }
            }
        }
        activities.stop();

        let forced = run.state.reconcile_columns();
        run.publish();
        if forced > 0 {
            tracing::info!(count = forced, "remaining columns forced to done");
            self.events.emit(RunEvent::ColumnsForced {
                run_id,
                count: forced,
            });
        }

        tokio::select! {
            biased;
            _ = control.cancelled() => return run.cancelled(&timer, None),
            _ = tokio::time::sleep(self.timing.processing_delay()) => {}
        }
        run.completed(&timer, report)
    }

    fn spawn_remote(&self) -> RemoteHandle {
        let engine = Arc::clone(&self.engine);
        let dataset_id = self.target.dataset_id.clone();
        let target_column = self.target.target_column.clone();
        tokio::spawn(
            async move { engine.validate(&dataset_id, target_column.as_deref()).await }
                .in_current_span(),
        )
    }

    /// `run_validation` was dropped mid-run. Whatever was published last becomes
    /// a Cancelled snapshot, frozen at the last sampled elapsed time.
    fn abandon_unfinished(&self) {
        let now = self.clock.now();
        let mut abandoned = None;
        self.state_tx.send_if_modified(|state| {
            let from = state.phase;
            let elapsed = state.elapsed_seconds;
            if !state.cancel(elapsed, now) {
                return false;
            }
            abandoned = state.run_id.map(|run_id| (run_id, from, elapsed));
            true
        });
        let Some((run_id, from, elapsed)) = abandoned else {
            return;
        };
        tracing::warn!(%run_id, %from, elapsed_seconds = elapsed, "run dropped before finishing, marked cancelled");
        self.events.emit(RunEvent::PhaseChanged {
            run_id,
            from,
            to: RunPhase::Cancelled,
        });
        self.events.emit(RunEvent::Finished {
            run_id,
            phase: RunPhase::Cancelled,
            elapsed_seconds: elapsed,
        });
    }

    /// The run is over but the request may still be in flight.
    fn release_remote(&self, run_id: RunId, remote: RemoteHandle) {
        if self.abort_remote_on_cancel {
            tracing::debug!("aborting in-flight validation request");
            remote.abort();
            return;
        }
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            if remote.await.is_ok() {
                tracing::debug!(%run_id, "late validation result discarded");
                events.emit(RunEvent::LateResultDiscarded { run_id });
            }
        });
    }
}

fn flatten(joined: Result<Result<Value, RunError>, JoinError>) -> Result<Value, RunError> {
    joined.unwrap_or_else(|e| Err(RunError::transport(format!("validation task failed: {e}"))))
}

fn lock(control: &Mutex<Option<RunControl>>) -> MutexGuard<'_, Option<RunControl>> {
    control.lock().unwrap_or_else(|e| e.into_inner())
}

/// Stops every task of the run, leaves a terminal snapshot behind and clears the
/// active flag, however `run_validation` exits.
struct ActiveGuard<'a> {
    coordinator: &'a RunCoordinator,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        if let Some(control) = lock(&self.coordinator.control).take() {
            control.request_cancel();
        }
        self.coordinator.abandon_unfinished();
        self.coordinator.active.store(false, Ordering::Release);
    }
}

struct Activities {
    control: RunControl,
    simulator: JoinHandle<()>,
    walker: JoinHandle<()>,
}

impl Activities {
    fn stop(&mut self) {
        self.control.request_cancel();
        self.simulator.abort();
        self.walker.abort();
    }
}

impl Drop for Activities {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The state of the run in progress plus the publishing side effects.
struct ActiveRun<'a> {
    coordinator: &'a RunCoordinator,
    run_id: RunId,
    state: RunState,
}

impl ActiveRun<'_> {
    fn publish(&self) {
        debug_assert!(self.state.invariants_hold());
        self.coordinator.state_tx.send_replace(self.state.clone());
    }

    fn emit_phase(&self, from: RunPhase) {
        let to = self.state.phase;
        tracing::info!(%from, %to, "phase changed");
        self.coordinator.events.emit(RunEvent::PhaseChanged {
            run_id: self.run_id,
            from,
            to,
        });
    }

    /// Apply a phase-changing mutation; publish and report it only if it took effect.
    fn enter(&mut self, mutate: impl FnOnce(&mut RunState) -> bool) -> bool {
        let from = self.state.phase;
        if !mutate(&mut self.state) {
            return false;
        }
        self.publish();
        self.emit_phase(from);
        true
    }

    fn apply(&mut self, advisory: Advisory) {
        tracing::trace!(?advisory, "advisory");
        let changed = match advisory {
            Advisory::Elapsed(seconds) => self.state.set_elapsed(seconds),
            Advisory::Progress { percent, label } => self.state.propose_progress(percent, label),
            Advisory::Column {
                name,
                status,
                sub_status,
                percent,
            } => {
                let moved = self.state.update_column(&name, status, sub_status);
                let advanced = percent.is_some_and(|p| self.state.propose_progress(p, None));
                moved || advanced
            }
            Advisory::WalkerFinished => false,
        };
        if changed {
            self.publish();
        }
    }

    fn pause_changed(&mut self, paused: bool) {
        if self.state.set_paused(paused) {
            self.publish();
            self.coordinator.events.emit(RunEvent::PauseToggled {
                run_id: self.run_id,
                paused,
            });
        }
    }

    fn finished(&self) {
        self.coordinator.events.emit(RunEvent::Finished {
            run_id: self.run_id,
            phase: self.state.phase,
            elapsed_seconds: self.state.elapsed_seconds,
        });
    }

    fn completed(mut self, timer: &RunTimer, report: Report) -> RunState {
        let elapsed = timer.stop();
        let now = self.coordinator.clock.now();
        let score = report.health_score;
        self.enter(|s| s.complete(report, elapsed, now));
        tracing::info!(elapsed_seconds = elapsed, health_score = score, "run completed");
        self.finished();
        self.state
    }

    fn failed(mut self, timer: &RunTimer, err: RunError) -> RunState {
        let elapsed = timer.stop();
        let now = self.coordinator.clock.now();
        tracing::error!(error = %err, elapsed_seconds = elapsed, "validation failed");
        let message = err.user_message();
        self.enter(|s| s.fail(message, elapsed, now));
        self.finished();
        self.state
    }

    fn cancelled(mut self, timer: &RunTimer, remote: Option<RemoteHandle>) -> RunState {
        let elapsed = timer.stop();
        let now = self.coordinator.clock.now();
        self.enter(|s| s.cancel(elapsed, now));
        tracing::info!(elapsed_seconds = elapsed, "run cancelled");
        if let Some(remote) = remote {
            self.coordinator.release_remote(self.run_id, remote);
        }
        self.finished();
        self.state
    }
}
