//! Summary counters and health score for a list of checks.
//!
//! Same formula the validation engine uses when it builds its report:
//! - base = passed / total * 100
//! - blocking penalty: 10 per issue, capped at 50
//! - warning penalty: 2 per warning check, capped at 20
//! - clamped to 0..=100 and rounded; 0 when there are no checks

use super::report::{Check, CheckStatus, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: u32,
    pub passed: u32,
    pub warnings: u32,
    pub failed: u32,
    pub blocking_issues: u32,
    pub warning_issues: u32,
}

impl Tally {
    pub fn from_checks(checks: &[Check]) -> Self {
        let mut tally = Tally::default();
        for check in checks {
            tally.total += 1;
            match check.status {
                CheckStatus::Pass => tally.passed += 1,
                CheckStatus::Warning => tally.warnings += 1,
                CheckStatus::Fail => tally.failed += 1,
            }
            match check.effective_severity() {
                Severity::Blocking => tally.blocking_issues += 1,
                Severity::Warning => tally.warning_issues += 1,
                Severity::Info => {}
            }
        }
        tally
    }

    pub fn health_score(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let base = f64::from(self.passed) / f64::from(self.total) * 100.0;
        let blocking_penalty = f64::from((self.blocking_issues * 10).min(50));
        let warning_penalty = f64::from((self.warnings * 2).min(20));
        (base - blocking_penalty - warning_penalty).clamp(0.0, 100.0).round() as u32
    }

    /// No blocking issues and warnings below 30% of all checks.
    pub fn ready_for_ml(&self) -> bool {
        self.blocking_issues == 0
            && (self.total == 0 || f64::from(self.warnings) < f64::from(self.total) * 0.3)
    }

    pub fn overall_status(&self) -> CheckStatus {
        if self.blocking_issues > 0 {
            CheckStatus::Fail
        } else if self.warning_issues > 0 {
            CheckStatus::Warning
        } else {
            CheckStatus::Pass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn check(status: CheckStatus) -> Check {
        Check {
            id: String::new(),
            name: String::new(),
            category: String::new(),
            status,
            severity: None,
            message: String::new(),
            details: serde_json::Value::Null,
        }
    }

    fn tally(pass: usize, warn: usize, fail: usize) -> Tally {
        let mut checks = Vec::new();
        checks.extend(std::iter::repeat_with(|| check(CheckStatus::Pass)).take(pass));
        checks.extend(std::iter::repeat_with(|| check(CheckStatus::Warning)).take(warn));
        checks.extend(std::iter::repeat_with(|| check(CheckStatus::Fail)).take(fail));
        Tally::from_checks(&checks)
    }

    #[rstest]
    #[case::all_pass(10, 0, 0, 100)]
    #[case::empty(0, 0, 0, 0)]
    #[case::one_warning(9, 1, 0, 88)]
    #[case::blocking_cap(0, 0, 10, 0)]
    #[case::penalties_capped(90, 10, 20, 5)]
    #[case::mixed(8, 1, 1, 68)]
    fn health_score(
        #[case] pass: usize,
        #[case] warn: usize,
        #[case] fail: usize,
        #[case] expected: u32,
    ) {
        assert_eq!(tally(pass, warn, fail).health_score(), expected);
    }

    #[test]
    fn ready_for_ml_requires_no_blocking() {
        assert!(tally(10, 2, 0).ready_for_ml());
        assert!(!tally(10, 0, 1).ready_for_ml());
        assert!(!tally(5, 5, 0).ready_for_ml());
    }

    #[test]
    fn explicit_severity_overrides_status() {
        let mut c = check(CheckStatus::Warning);
        c.severity = Some(Severity::Blocking);
        let t = Tally::from_checks(&[c]);
        assert_eq!(t.blocking_issues, 1);
        assert_eq!(t.warnings, 1);
        assert_eq!(t.overall_status(), CheckStatus::Fail);
    }
}
