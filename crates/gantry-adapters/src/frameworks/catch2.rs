//! Catch2 adapter for C/C++ projects
//!
//! Same CTest-first orchestration as the Google Test adapter, but the
//! direct fallback asks each binary for a JUnit report and, when a binary
//! predates `--out` support, falls back again to scraping the plaintext
//! summary line.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::instrument;

use gantry_core::{RunResult, ValidationResult};

use crate::context::RunContext;
use crate::coverage::{attach_coverage, CoverageRunner};
use crate::detect;
use crate::exec::{run_command, Transcript};
use crate::frameworks::cmake;
use crate::report::junit::{self, JunitDialect};
use crate::traits::TestFrameworkAdapter;
use crate::validate::{validate_source, SyntaxChecker};

const CMAKE_MARKERS: [&str; 4] = [
    "find_package(catch2",
    "catch_discover_tests",
    "catch2::catch2",
    "catch2::catch2withmain",
];

const TEST_PATTERNS: [&str; 4] = [
    "**/*_test.cpp",
    "**/*_test.cc",
    "**/*.catch2.cpp",
    "**/*_tests.cpp",
];

const SCAN_EXTENSIONS: [&str; 7] = ["cpp", "cc", "cxx", "h", "hh", "hpp", "hxx"];

const BINARY_PATTERNS: [&str; 3] = ["*test*", "*_tests", "*catch2*"];

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#include\s*[<"](catch2/catch[^">]*|catch\.hpp)[>"]"#).expect("Invalid regex")
});

static ALL_PASSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)All tests passed \(\d+ assertions? in (?P<cases>\d+) test cases?\)")
        .expect("Invalid regex")
});

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)test cases:\s*(?P<total>\d+)\s*\|\s*(?P<passed>\d+)\s*passed\s*\|\s*(?P<failed>\d+)\s*failed(?:\s*\|\s*(?P<skipped>\d+)\s*skipped)?",
    )
    .expect("Invalid regex")
});

/// Catch2 framework adapter
pub struct Catch2Adapter {
    checker: Arc<dyn SyntaxChecker>,
    coverage: Option<Arc<dyn CoverageRunner>>,
}

impl Catch2Adapter {
    pub fn new(checker: Arc<dyn SyntaxChecker>) -> Self {
        Self {
            checker,
            coverage: None,
        }
    }

    pub fn with_coverage(mut self, runner: Arc<dyn CoverageRunner>) -> Self {
        self.coverage = Some(runner);
        self
    }

    async fn run_direct(
        &self,
        binaries: &[PathBuf],
        report_dir: &Path,
        ctx: &RunContext,
        transcript: &mut Transcript,
    ) -> RunResult {
        if binaries.is_empty() {
            transcript.note("No Catch2 binaries found for direct execution.");
            return RunResult::failure(transcript.render());
        }

        let mut aggregate = RunResult::default();
        for (idx, binary) in binaries.iter().enumerate() {
            let report = report_dir.join(format!("catch2-{idx}.xml"));
            let cwd = binary.parent().unwrap_or(report_dir);
            let cmd = vec![
                binary.display().to_string(),
                "--reporter".to_string(),
                "junit".to_string(),
                "--out".to_string(),
                report.display().to_string(),
            ];

            let outcome = run_command(&cmd, cwd, ctx.timeout).await;
            transcript.record(&cmd, &outcome);

            if outcome.timed_out {
                aggregate.errors += 1;
                continue;
            }

            if let Ok(xml) = std::fs::read_to_string(&report) {
                aggregate.merge(junit::parse(&xml, "", JunitDialect::CATCH2));
                continue;
            }

            // Older binaries ignore --out; scrape the console summary.
            let summary =
                parse_text_summary(&format!("{}\n{}", outcome.stdout, outcome.stderr));
            if summary.total() > 0 {
                aggregate.merge(summary);
            } else if outcome.exit_code != 0 {
                aggregate.errors += 1;
            }
        }

        aggregate.raw_output = transcript.render();
        aggregate.recompute_success();
        aggregate
    }
}

#[async_trait]
impl TestFrameworkAdapter for Catch2Adapter {
    fn name(&self) -> &'static str {
        "catch2"
    }

    fn language(&self) -> &'static str {
        "cpp"
    }

    fn detect(&self, project_path: &Path) -> bool {
        detect::config_has_marker(project_path, "CMakeLists.txt", "catch2", &CMAKE_MARKERS)
            || detect::source_include_present(project_path, &SCAN_EXTENSIONS, &INCLUDE_RE)
            || detect::matches_test_pattern(project_path, &TEST_PATTERNS)
    }

    fn test_patterns(&self) -> &'static [&'static str] {
        &TEST_PATTERNS
    }

    #[instrument(skip(self, ctx), fields(adapter = "catch2"))]
    async fn run_tests(&self, project_path: &Path, ctx: &RunContext) -> RunResult {
        let report_dir = match tempfile::Builder::new().prefix("gantry-catch2-").tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                return RunResult::failure(format!("Failed to create report directory: {err}"));
            }
        };

        let mut transcript = Transcript::new();
        let build_dir = cmake::find_build_dir(project_path);

        let ctest = cmake::try_ctest(
            build_dir.as_deref(),
            report_dir.path(),
            ctx,
            &mut transcript,
            JunitDialect::CATCH2,
        )
        .await;

        let mut result = match ctest {
            Some(result) => result,
            None => {
                let discovered = cmake::discover_test_binaries(
                    project_path,
                    build_dir.as_deref(),
                    &BINARY_PATTERNS,
                );
                let binaries = cmake::select_binaries(discovered, &ctx.test_files);
                self.run_direct(&binaries, report_dir.path(), ctx, &mut transcript)
                    .await
            }
        };

        if ctx.collect_coverage {
            attach_coverage(
                self.coverage.as_deref(),
                &mut result,
                project_path,
                &ctx.test_files,
                ctx.timeout,
            )
            .await;
        }

        result
    }

    fn validate_test(&self, test_code: &str) -> ValidationResult {
        validate_source(self.checker.as_ref(), test_code, self.language())
    }

    fn required_commands(&self) -> &'static [&'static str] {
        &["cmake"]
    }
}

/// Parse the Catch2 console summary into bare counts.
///
/// Two shapes exist: the all-passed banner, and the `test cases:` tally.
/// When the tally's total exceeds the listed statuses the remainder is
/// counted as errors (crashed before reporting).
fn parse_text_summary(output: &str) -> RunResult {
    let mut result = RunResult::default();

    if let Some(captures) = ALL_PASSED_RE.captures(output) {
        result.passed = captures["cases"].parse().unwrap_or(0);
        result.recompute_success();
        return result;
    }

    let Some(captures) = SUMMARY_RE.captures(output) else {
        return result;
    };

    result.passed = captures["passed"].parse().unwrap_or(0);
    result.failed = captures["failed"].parse().unwrap_or(0);
    result.skipped = captures
        .name("skipped")
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    let total: usize = captures["total"].parse().unwrap_or(0);
    if total > result.total() {
        result.errors = total - result.total();
    }
    result.recompute_success();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::testing::StubChecker;
    use tempfile::TempDir;

    fn adapter() -> Catch2Adapter {
        Catch2Adapter::new(Arc::new(StubChecker::valid()))
    }

    #[test]
    fn test_detects_cmake_target_marker() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("CMakeLists.txt"),
            "target_link_libraries(tests PRIVATE Catch2::Catch2WithMain)\n",
        )
        .unwrap();

        assert!(adapter().detect(dir.path()));
    }

    #[test]
    fn test_detects_header_include() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("calc.cpp"),
            "#include <catch2/catch_test_macros.hpp>\n",
        )
        .unwrap();

        assert!(adapter().detect(dir.path()));
    }

    #[test]
    fn test_detects_legacy_single_header() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("calc.cpp"), "#include \"catch.hpp\"\n").unwrap();

        assert!(adapter().detect(dir.path()));
    }

    #[test]
    fn test_empty_project_not_detected() {
        let dir = TempDir::new().unwrap();
        assert!(!adapter().detect(dir.path()));
    }

    #[test]
    fn test_text_summary_all_passed_banner() {
        let result =
            parse_text_summary("All tests passed (12 assertions in 4 test cases)");
        assert_eq!(result.passed, 4);
        assert!(result.success);
    }

    #[test]
    fn test_text_summary_tally_line() {
        let result = parse_text_summary("test cases: 5 | 3 passed | 1 failed | 1 skipped");
        assert_eq!(result.passed, 3);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 0);
        assert!(!result.success);
    }

    #[test]
    fn test_text_summary_missing_cases_become_errors() {
        let result = parse_text_summary("test cases: 6 | 3 passed | 1 failed");
        assert_eq!(result.errors, 2);
        assert!(!result.success);
    }

    #[test]
    fn test_text_summary_unrecognized_output() {
        let result = parse_text_summary("Segmentation fault (core dumped)");
        assert_eq!(result.total(), 0);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_no_binaries_is_a_failure_with_note() {
        let dir = TempDir::new().unwrap();
        let result = adapter().run_tests(dir.path(), &RunContext::new()).await;

        assert!(!result.success);
        assert!(result
            .raw_output
            .contains("No Catch2 binaries found for direct execution."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_direct_binary_text_summary_fallback() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("calc_tests");
        // Ignores --out, prints the console tally like pre-3.x binaries
        let script = "#!/bin/sh\necho 'test cases: 3 | 2 passed | 1 failed'\nexit 1\n";
        std::fs::write(&binary, script).unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let result = adapter().run_tests(dir.path(), &RunContext::new()).await;

        assert_eq!(result.passed, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hanging_binary_counts_one_error_and_run_continues() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let dir = TempDir::new().unwrap();

        let hang = dir.path().join("a_hang_tests");
        std::fs::write(&hang, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&hang, std::fs::Permissions::from_mode(0o755)).unwrap();

        let good = dir.path().join("z_calc_tests");
        let script = "#!/bin/sh\necho 'test cases: 2 | 2 passed | 0 failed'\nexit 0\n";
        std::fs::write(&good, script).unwrap();
        std::fs::set_permissions(&good, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = RunContext::new().with_timeout(Duration::from_millis(500));
        let result = adapter().run_tests(dir.path(), &ctx).await;

        assert_eq!(result.errors, 1);
        assert_eq!(result.passed, 2);
        assert!(!result.success);
    }

    #[test]
    fn test_validate_delegates_to_checker() {
        let adapter = Catch2Adapter::new(Arc::new(StubChecker::with_error(1, 2)));
        let result = adapter.validate_test("TEST_CASE(\"adds\") {");

        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Syntax error at line 1-2"]);
    }
}
