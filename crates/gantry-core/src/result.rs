//! Canonical result model
//!
//! Every report parser, regardless of the framework's native format,
//! normalizes into these types. `RunResult::success` is always computed
//! from the counts, never stored ad hoc: zero executed cases is a failure
//! no matter what the exit code claimed.

use serde::{Deserialize, Serialize};

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
    Error,
}

/// Result of a single test case execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    /// Framework-specific fully-qualified identifier (often dotted suite.test)
    pub name: String,
    pub status: CaseStatus,
    pub duration_ms: f64,
    /// Empty unless status is Failed or Error
    #[serde(default)]
    pub failure_message: String,
    /// Best-effort source location
    #[serde(default)]
    pub file_path: String,
}

impl CaseResult {
    pub fn new(name: impl Into<String>, status: CaseStatus) -> Self {
        Self {
            name: name.into(),
            status,
            duration_ms: 0.0,
            failure_message: String::new(),
            file_path: String::new(),
        }
    }
}

/// Aggregated result of one test run (or a merge of several partial runs)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub duration_ms: f64,
    #[serde(default)]
    pub test_cases: Vec<CaseResult>,
    /// Full diagnostic transcript of every stage that ran
    #[serde(default)]
    pub raw_output: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageReport>,
}

impl RunResult {
    /// A terminal failed result carrying only the diagnostic transcript
    pub fn failure(raw_output: impl Into<String>) -> Self {
        Self {
            raw_output: raw_output.into(),
            ..Default::default()
        }
    }

    /// Total number of test cases across all statuses
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errors
    }

    /// Record one case, bumping the matching counter and the run duration
    pub fn push_case(&mut self, case: CaseResult) {
        match case.status {
            CaseStatus::Passed => self.passed += 1,
            CaseStatus::Failed => self.failed += 1,
            CaseStatus::Skipped => self.skipped += 1,
            CaseStatus::Error => self.errors += 1,
        }
        self.duration_ms += case.duration_ms;
        self.test_cases.push(case);
    }

    /// Fold another partial result into this one
    ///
    /// Sums every counter and concatenates cases; merge order does not
    /// affect the final counts. `success` must be recomputed once after
    /// the last merge, never read mid-merge.
    pub fn merge(&mut self, source: RunResult) {
        self.passed += source.passed;
        self.failed += source.failed;
        self.skipped += source.skipped;
        self.errors += source.errors;
        self.duration_ms += source.duration_ms;
        self.test_cases.extend(source.test_cases);
    }

    /// Recompute `success` from the counts
    pub fn recompute_success(&mut self) {
        self.success = self.failed == 0 && self.errors == 0 && self.total() > 0;
    }
}

/// Result of validating candidate test source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_errors(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// Coverage summary handed back by the external coverage collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Overall line coverage as a fraction (0.0 - 1.0)
    pub line_coverage: f64,
    #[serde(default)]
    pub files: Vec<FileCoverage>,
}

/// Per-file coverage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCoverage {
    pub path: String,
    pub line_coverage: f64,
    pub lines_covered: usize,
    pub lines_total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(passed: usize, failed: usize, skipped: usize, errors: usize) -> RunResult {
        RunResult {
            passed,
            failed,
            skipped,
            errors,
            duration_ms: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_total_is_sum_of_counts() {
        let result = counts(3, 2, 1, 4);
        assert_eq!(result.total(), 10);
    }

    #[test]
    fn test_push_case_keeps_counts_consistent() {
        let mut result = RunResult::default();
        result.push_case(CaseResult::new("a", CaseStatus::Passed));
        result.push_case(CaseResult::new("b", CaseStatus::Failed));
        result.push_case(CaseResult::new("c", CaseStatus::Skipped));
        result.push_case(CaseResult::new("d", CaseStatus::Error));

        assert_eq!(result.total(), 4);
        assert_eq!(result.total(), result.test_cases.len());
    }

    #[test]
    fn test_success_requires_at_least_one_case() {
        let mut empty = RunResult::default();
        empty.recompute_success();
        assert!(!empty.success);

        let mut passing = counts(5, 0, 0, 0);
        passing.recompute_success();
        assert!(passing.success);
    }

    #[test]
    fn test_success_false_on_failures_or_errors() {
        let mut failing = counts(5, 1, 0, 0);
        failing.recompute_success();
        assert!(!failing.success);

        let mut erroring = counts(5, 0, 0, 1);
        erroring.recompute_success();
        assert!(!erroring.success);

        let mut skipping = counts(5, 0, 3, 0);
        skipping.recompute_success();
        assert!(skipping.success);
    }

    #[test]
    fn test_merge_is_commutative_on_counts() {
        let mut ab = counts(1, 2, 0, 1);
        ab.merge(counts(4, 0, 3, 0));

        let mut ba = counts(4, 0, 3, 0);
        ba.merge(counts(1, 2, 0, 1));

        assert_eq!(ab.passed, ba.passed);
        assert_eq!(ab.failed, ba.failed);
        assert_eq!(ab.skipped, ba.skipped);
        assert_eq!(ab.errors, ba.errors);
        assert_eq!(ab.total(), ba.total());
    }

    #[test]
    fn test_merge_is_associative_on_counts() {
        let a = counts(1, 0, 0, 0);
        let b = counts(0, 2, 1, 0);
        let c = counts(3, 0, 0, 2);

        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        let mut bc = b;
        bc.merge(c);
        let mut right = a;
        right.merge(bc);

        assert_eq!(left.total(), right.total());
        assert_eq!(left.passed, right.passed);
        assert_eq!(left.errors, right.errors);
        assert!((left.duration_ms - right.duration_ms).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failure_constructor_keeps_transcript() {
        let result = RunResult::failure("$ ctest\nexit_code=1");
        assert!(!result.success);
        assert_eq!(result.total(), 0);
        assert!(result.raw_output.contains("exit_code=1"));
    }

    #[test]
    fn test_case_status_serializes_lowercase() {
        let json = serde_json::to_string(&CaseStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }
}
