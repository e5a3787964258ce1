//! Settings - 設定の読み込み
//!
//! 優先順位（後勝ち）:
//! 1. 組み込みデフォルト
//! 2. 設定ファイル（TOML / JSON、任意）
//! 3. 環境変数 `VIGIL__<SECTION>__<KEY>`（例: `VIGIL__ENGINE__BASE_URL`）

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run: RunTarget,
    pub engine: EngineSettings,
    pub timing: TimingSettings,
    /// Abort the in-flight validation request when a run is cancelled.
    pub abort_remote_on_cancel: bool,
}

/// What a coordinator validates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTarget {
    pub dataset_id: String,
    pub target_column: Option<String>,
}

impl RunTarget {
    pub fn new(dataset_id: impl Into<String>, target_column: Option<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            target_column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub base_url: String,
    /// HTTP-level timeout. Not a coordinator deadline.
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 300,
            user_agent: concat!("vigil/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Pacing of the cosmetic activities and the reconciliation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub timer_tick_ms: u64,
    pub simulator_tick_ms: u64,
    pub simulator_increment: u8,
    pub simulator_floor: u8,
    pub simulator_ceiling: u8,
    pub column_settle_ms: u64,
    pub walker_floor: u8,
    pub walker_ceiling: u8,
    pub bounded_wait_min_ms: u64,
    pub bounded_wait_per_column_ms: u64,
    pub processing_delay_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            timer_tick_ms: 1000,
            simulator_tick_ms: 500,
            simulator_increment: 2,
            simulator_floor: 20,
            simulator_ceiling: 85,
            column_settle_ms: 300,
            walker_floor: 20,
            walker_ceiling: 90,
            bounded_wait_min_ms: 3000,
            bounded_wait_per_column_ms: 400,
            processing_delay_ms: 500,
        }
    }
}

impl TimingSettings {
    pub fn timer_tick(&self) -> Duration {
        Duration::from_millis(self.timer_tick_ms)
    }

    pub fn simulator_tick(&self) -> Duration {
        Duration::from_millis(self.simulator_tick_ms)
    }

    pub fn column_settle(&self) -> Duration {
        Duration::from_millis(self.column_settle_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    /// `max(min, per_column × columns)`
    pub fn bounded_wait(&self, columns: usize) -> Duration {
        let per_column = self
            .bounded_wait_per_column_ms
            .saturating_mul(columns as u64);
        Duration::from_millis(self.bounded_wait_min_ms.max(per_column))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timer_tick_ms == 0 {
            return Err(invalid("timing.timer_tick_ms", "must be greater than 0"));
        }
        if self.simulator_tick_ms == 0 {
            return Err(invalid("timing.simulator_tick_ms", "must be greater than 0"));
        }
        if self.simulator_increment == 0 {
            return Err(invalid("timing.simulator_increment", "must be greater than 0"));
        }
        if self.simulator_floor > self.simulator_ceiling {
            return Err(invalid("timing.simulator_floor", "exceeds simulator_ceiling"));
        }
        if self.walker_floor > self.walker_ceiling {
            return Err(invalid("timing.walker_floor", "exceeds walker_ceiling"));
        }
        if self.walker_ceiling >= 100 || self.simulator_ceiling >= 100 {
            return Err(invalid(
                "timing.walker_ceiling",
                "cosmetic progress must stay below 100",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, reason: &str) -> SettingsError {
    SettingsError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

impl Settings {
    /// Defaults, then `path` (if any), then `VIGIL__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Settings::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("VIGIL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        url::Url::parse(&self.engine.base_url)
            .map_err(|e| invalid("engine.base_url", &e.to_string()))?;
        if self.engine.request_timeout_secs == 0 {
            return Err(invalid("engine.request_timeout_secs", "must be greater than 0"));
        }
        self.timing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[rstest]
    #[case::few_columns(3, 3000)]
    #[case::no_columns(0, 3000)]
    #[case::many_columns(500, 200_000)]
    #[case::threshold(8, 3200)]
    fn bounded_wait_scales_with_columns(#[case] columns: usize, #[case] expected_ms: u64) {
        let timing = TimingSettings::default();
        assert_eq!(timing.bounded_wait(columns), Duration::from_millis(expected_ms));
    }

    #[test]
    fn rejects_cosmetic_ceiling_of_100() {
        let timing = TimingSettings {
            walker_ceiling: 100,
            ..TimingSettings::default()
        };
        assert!(matches!(
            timing.validate(),
            Err(SettingsError::Invalid { key: "timing.walker_ceiling", .. })
        ));
    }

    #[test]
    fn rejects_bad_base_url() {
        let mut settings = Settings::default();
        settings.engine.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn loads_file_over_defaults() {
        let dir = std::env::temp_dir().join(format!("vigil-settings-{}", ulid::Ulid::new()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("vigil.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[run]\ndataset_id = \"42\"\ntarget_column = \"label\"\n\n[timing]\ncolumn_settle_ms = 50\n"
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.run.dataset_id, "42");
        assert_eq!(settings.run.target_column.as_deref(), Some("label"));
        assert_eq!(settings.timing.column_settle_ms, 50);
        assert_eq!(settings.timing.simulator_tick_ms, 500);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("vigil-does-not-exist.toml");
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(SettingsError::Load(_))
        ));
    }
}
