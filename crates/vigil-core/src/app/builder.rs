//! CoordinatorBuilder - コーディネーターの構築とワイヤリング
//!
//! # 方針
//! - Builder パターン（collaborator を 1 つずつ差し込む）
//! - 起動時検証（Fail-fast 設計）: 不足や不正な設定は `build()` で弾く
//! - 省略可能なもの（clock / id / event sink）はデフォルト実装で埋める

use std::sync::Arc;

use super::coordinator::RunCoordinator;
use crate::impls::TracingEventSink;
use crate::ports::{
    Clock, DatasetCatalog, EventSink, RunIdGenerator, SystemClock, UlidGenerator, ValidationEngine,
};
use crate::settings::{RunTarget, Settings, SettingsError, TimingSettings};

/// Builds a [`RunCoordinator`].
///
/// # 使用例
/// ```ignore
/// let coordinator = CoordinatorBuilder::from_settings(&settings)
///     .catalog(engine.clone())
///     .engine(engine)
///     .build()?;
/// ```
pub struct CoordinatorBuilder {
    target: RunTarget,
    timing: TimingSettings,
    abort_remote_on_cancel: bool,
    catalog: Option<Arc<dyn DatasetCatalog>>,
    engine: Option<Arc<dyn ValidationEngine>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn RunIdGenerator>>,
    events: Option<Arc<dyn EventSink>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no {0} was configured")]
    MissingCollaborator(&'static str),

    #[error("dataset id must not be empty")]
    EmptyDatasetId,

    #[error(transparent)]
    InvalidTiming(#[from] SettingsError),
}

impl CoordinatorBuilder {
    pub fn new(target: RunTarget) -> Self {
        Self {
            target,
            timing: TimingSettings::default(),
            abort_remote_on_cancel: false,
            catalog: None,
            engine: None,
            clock: None,
            ids: None,
            events: None,
        }
    }

    /// Target, timing and cancel policy taken from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.run.clone())
            .timing(settings.timing.clone())
            .abort_remote_on_cancel(settings.abort_remote_on_cancel)
    }

    pub fn timing(mut self, timing: TimingSettings) -> Self {
        self.timing = timing;
        self
    }

    pub fn abort_remote_on_cancel(mut self, abort: bool) -> Self {
        self.abort_remote_on_cancel = abort;
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn DatasetCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn ValidationEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn RunIdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// # 検証
    /// - catalog / engine が両方設定されているか
    /// - dataset id が空でないか
    /// - timing 設定が妥当か
    pub fn build(self) -> Result<RunCoordinator, BuildError> {
        if self.target.dataset_id.trim().is_empty() {
            return Err(BuildError::EmptyDatasetId);
        }
        self.timing.validate()?;
        let catalog = self
            .catalog
            .ok_or(BuildError::MissingCollaborator("dataset catalog"))?;
        let engine = self
            .engine
            .ok_or(BuildError::MissingCollaborator("validation engine"))?;

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let ids: Arc<dyn RunIdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        };
        let events: Arc<dyn EventSink> = match self.events {
            Some(events) => events,
            None => Arc::new(TracingEventSink),
        };

        Ok(RunCoordinator::from_parts(
            self.target,
            self.timing,
            self.abort_remote_on_cancel,
            catalog,
            engine,
            clock,
            ids,
            events,
        ))
    }
}
