use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Issues,
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Issues => "issues",
            CheckStatus::Error => "error",
        }
    }
}

impl Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub check: String,
    pub status: CheckStatus,
    pub issues_found: i64,
    pub issues_fixed: i64,
    pub details: Vec<String>,
}

impl ReconciliationResult {
    pub fn passed(check: &str) -> Self {
        Self {
            check: check.to_string(),
            status: CheckStatus::Passed,
            issues_found: 0,
            issues_fixed: 0,
            details: Vec::new(),
        }
    }

    pub fn errored(check: &str, message: String) -> Self {
        Self {
            check: check.to_string(),
            status: CheckStatus::Error,
            issues_found: 0,
            issues_fixed: 0,
            details: vec![message],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Critical,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Critical => "critical",
        }
    }
}

impl Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub ran_at: DateTime<Utc>,
    pub window_days: i64,
    pub autofix: bool,
    pub checks: Vec<ReconciliationResult>,
    pub total_issues: i64,
    pub total_fixed: i64,
    pub overall_status: OverallStatus,
}

impl ReconciliationReport {
    /// Critical when any check errored or a single check found widespread
    /// drift (more than 10 issues); degraded when anything at all was found.
    pub fn overall_status_for(checks: &[ReconciliationResult]) -> OverallStatus {
        let any_error = checks.iter().any(|c| c.status == CheckStatus::Error);
        let widespread = checks.iter().any(|c| c.issues_found > 10);
        if any_error || widespread {
            OverallStatus::Critical
        } else if checks.iter().any(|c| c.issues_found > 0) {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_issues(check: &str, issues_found: i64) -> ReconciliationResult {
        ReconciliationResult {
            issues_found,
            status: if issues_found > 0 {
                CheckStatus::Issues
            } else {
                CheckStatus::Passed
            },
            ..ReconciliationResult::passed(check)
        }
    }

    #[test]
    fn small_issue_counts_spread_over_checks_stay_degraded() {
        let checks: Vec<_> = (0..6).map(|i| with_issues(&format!("check_{i}"), 2)).collect();

        assert_eq!(
            ReconciliationReport::overall_status_for(&checks),
            OverallStatus::Degraded
        );
    }

    #[test]
    fn one_check_over_ten_issues_is_critical() {
        let checks = vec![with_issues("wallet_drift", 11)];

        assert_eq!(
            ReconciliationReport::overall_status_for(&checks),
            OverallStatus::Critical
        );
    }

    #[test]
    fn errored_check_is_critical_without_any_issues() {
        let checks = vec![
            with_issues("pending_bookings", 0),
            ReconciliationResult::errored("wallet_drift", "db unavailable".to_string()),
        ];

        assert_eq!(
            ReconciliationReport::overall_status_for(&checks),
            OverallStatus::Critical
        );
    }
}
