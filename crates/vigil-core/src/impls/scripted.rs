//! ScriptedEngine - 台本どおりに応答するメタデータ / 検証エンジン
//!
//! # 用途
//! - コーディネーターのテスト（遅延・失敗・不正ペイロードを自由に設定）
//! - CLI の `--simulate`（バックエンドなしでランを体験する）
//!
//! 遅延は `tokio::time::sleep` なので、`start_paused` のテストでは決定的に進む。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::{DatasetInfo, RunError};
use crate::ports::{DatasetCatalog, ValidationEngine};

/// ScriptedEngine は両方の port を実装する
///
/// # 使用例
/// ```ignore
/// let engine = ScriptedEngine::new(["age", "income"])
///     .with_validate_delay(Duration::from_millis(1200))
///     .rejecting(RunError::transport("boom"));
/// ```
pub struct ScriptedEngine {
    columns: Vec<String>,
    row_count: u64,
    metadata_delay: Duration,
    metadata_error: Option<RunError>,
    validate_delay: Duration,
    response: Result<Value, RunError>,
    validate_calls: AtomicUsize,
    validations_finished: AtomicUsize,
}

impl ScriptedEngine {
    /// Immediate metadata and an immediate [`Self::sample_report`].
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            row_count: 1000,
            metadata_delay: Duration::ZERO,
            metadata_error: None,
            validate_delay: Duration::ZERO,
            response: Ok(Self::sample_report()),
            validate_calls: AtomicUsize::new(0),
            validations_finished: AtomicUsize::new(0),
        }
    }

    pub fn with_row_count(mut self, rows: u64) -> Self {
        self.row_count = rows;
        self
    }

    pub fn with_metadata_delay(mut self, delay: Duration) -> Self {
        self.metadata_delay = delay;
        self
    }

    pub fn failing_metadata(mut self, err: RunError) -> Self {
        self.metadata_error = Some(err);
        self
    }

    pub fn with_validate_delay(mut self, delay: Duration) -> Self {
        self.validate_delay = delay;
        self
    }

    pub fn responding(mut self, payload: Value) -> Self {
        self.response = Ok(payload);
        self
    }

    pub fn rejecting(mut self, err: RunError) -> Self {
        self.response = Err(err);
        self
    }

    /// Validation requests started so far.
    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    /// Validation requests that ran to the end of their delay.
    pub fn validations_finished(&self) -> usize {
        self.validations_finished.load(Ordering::SeqCst)
    }

    /// Ten checks: eight pass, one warning, one blocking failure.
    pub fn sample_report() -> Value {
        let checks = vec![
            check("file_size", "File Size", "File Level", "pass", "info", "File size is within limits"),
            check("header_row", "Header Row", "Structure", "pass", "info", "Header row detected"),
            check("column_types", "Column Types", "Data Types", "pass", "info", "All column types inferred"),
            check("missing_values", "Missing Values", "Missing Data", "warning", "warning", "3.2% of cells are missing"),
            check("duplicate_rows", "Duplicate Rows", "Duplicates", "pass", "info", "No duplicate rows"),
            check("target_present", "Target Column", "Target Variable", "pass", "info", "Target column found"),
            check("class_balance", "Class Balance", "Class Distribution", "pass", "info", "Classes are balanced"),
            check("constant_features", "Constant Features", "Feature Quality", "pass", "info", "No constant features"),
            check("value_ranges", "Value Ranges", "Value Integrity", "pass", "info", "Values within expected ranges"),
            check("target_leakage", "Target Leakage", "Data Leakage", "fail", "blocking", "Feature `label_copy` duplicates the target"),
        ];
        json!({
            "checks": checks,
            "totalChecks": 10,
            "passedChecks": 8,
            "warningChecks": 1,
            "failedChecks": 1,
            "blockingIssuesCount": 1,
            "warningIssuesCount": 1,
            "healthScore": 80,
            "readyForML": false,
            "timestamp": "2026-01-01T12:00:00Z",
        })
    }
}

fn check(id: &str, name: &str, category: &str, status: &str, severity: &str, message: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "category": category,
        "status": status,
        "severity": severity,
        "message": message,
        "details": {},
    })
}

#[async_trait]
impl DatasetCatalog for ScriptedEngine {
    async fn dataset_info(&self, _dataset_id: &str) -> Result<DatasetInfo, RunError> {
        if !self.metadata_delay.is_zero() {
            tokio::time::sleep(self.metadata_delay).await;
        }
        if let Some(err) = &self.metadata_error {
            return Err(err.clone());
        }
        Ok(DatasetInfo::with_columns(self.columns.iter().cloned()).with_rows(self.row_count))
    }
}

#[async_trait]
impl ValidationEngine for ScriptedEngine {
    async fn validate(
        &self,
        dataset_id: &str,
        target_column: Option<&str>,
    ) -> Result<Value, RunError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(dataset_id, ?target_column, "scripted validation started");
        if !self.validate_delay.is_zero() {
            tokio::time::sleep(self.validate_delay).await;
        }
        self.validations_finished.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Report;

    #[tokio::test]
    async fn metadata_lists_columns_in_order() {
        let engine = ScriptedEngine::new(["age", "income"]).with_row_count(12);
        let info = engine.dataset_info("1").await.unwrap();
        assert_eq!(info.column_names, vec!["age", "income"]);
        assert_eq!(info.row_count, 12);
        assert_eq!(info.column_count, 2);
    }

    #[tokio::test]
    async fn metadata_failure_is_returned() {
        let engine = ScriptedEngine::new(["a"]).failing_metadata(RunError::Metadata("gone".into()));
        assert!(engine.dataset_info("1").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn validate_waits_and_counts() {
        let engine = ScriptedEngine::new(["a"]).with_validate_delay(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let payload = engine.validate("1", Some("a")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(engine.validate_calls(), 1);
        assert_eq!(engine.validations_finished(), 1);
        assert_eq!(payload["healthScore"], 80);
    }

    #[test]
    fn sample_report_is_a_valid_report() {
        let report = Report::from_payload(ScriptedEngine::sample_report()).unwrap();
        assert_eq!(report.checks.len(), 10);
        assert_eq!(report.total_checks, 10);
        assert_eq!(report.passed_checks, 8);
        assert_eq!(report.health_score, 80.0);
        assert_eq!(report.ready_for_ml, Some(false));
    }
}
