//! Report model: the authoritative result returned by the validation engine.
//!
//! Wire names are camelCase. Only `checks` is required; everything else falls back
//! to defaults so a minimal payload is still a report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::errors::RunError;
use super::score::Tally;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    #[default]
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Blocking,
}

impl From<CheckStatus> for Severity {
    fn from(status: CheckStatus) -> Self {
        match status {
            CheckStatus::Fail => Severity::Blocking,
            CheckStatus::Warning => Severity::Warning,
            CheckStatus::Pass => Severity::Info,
        }
    }
}

/// One check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: CheckStatus,
    /// Missing on the wire means "derive from status".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Check {
    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or_else(|| self.status.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckStatus>,
    pub checks: Vec<Check>,
    #[serde(default)]
    pub total_checks: u32,
    #[serde(default)]
    pub passed_checks: u32,
    #[serde(default)]
    pub warning_checks: u32,
    #[serde(default)]
    pub failed_checks: u32,
    #[serde(default)]
    pub blocking_issues_count: u32,
    #[serde(default)]
    pub warning_issues_count: u32,
    #[serde(default)]
    pub health_score: f64,
    #[serde(default, rename = "readyForML", skip_serializing_if = "Option::is_none")]
    pub ready_for_ml: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Report {
    /// Accept a raw engine payload only if it is an object carrying a `checks` array.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, RunError> {
        let Some(object) = payload.as_object() else {
            return Err(RunError::invalid_response("payload is not an object"));
        };
        match object.get("checks") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => return Err(RunError::invalid_response("`checks` is not an array")),
            None => return Err(RunError::invalid_response("missing `checks`")),
        }
        let sent: HashSet<String> = object.keys().cloned().collect();
        let mut report: Report = serde_json::from_value(payload)
            .map_err(|e| RunError::invalid_response(format!("report decode: {e}")))?;
        report.fill_missing_counters(&sent);
        Ok(report)
    }

    /// Summary fields the engine left out are derived from `checks`.
    /// Whatever it did send is kept as is.
    fn fill_missing_counters(&mut self, sent: &HashSet<String>) {
        if self.checks.is_empty() {
            return;
        }
        let missing = |key: &str| !sent.contains(key);
        let tally = Tally::from_checks(&self.checks);
        if missing("totalChecks") {
            self.total_checks = tally.total;
        }
        if missing("passedChecks") {
            self.passed_checks = tally.passed;
        }
        if missing("warningChecks") {
            self.warning_checks = tally.warnings;
        }
        if missing("failedChecks") {
            self.failed_checks = tally.failed;
        }
        if missing("blockingIssuesCount") {
            self.blocking_issues_count = tally.blocking_issues;
        }
        if missing("warningIssuesCount") {
            self.warning_issues_count = tally.warning_issues;
        }
        if missing("healthScore") {
            self.health_score = f64::from(tally.health_score());
        }
        if self.ready_for_ml.is_none() {
            self.ready_for_ml = Some(tally.ready_for_ml());
        }
        if self.status.is_none() {
            self.status = Some(tally.overall_status());
        }
    }
}
