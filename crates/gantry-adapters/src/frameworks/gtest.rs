//! Google Test adapter for C/C++ projects

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
use crate::report::gtest_json;
use crate::report::junit::JunitDialect;
use crate::traits::TestFrameworkAdapter;
use crate::validate::{validate_source, SyntaxChecker};

const CMAKE_MARKERS: [&str; 3] = [
    "find_package(GTest",
    "gtest_discover_tests",
    "target_link_libraries",
];

const TEST_PATTERNS: [&str; 2] = ["**/*_test.cpp", "**/*_test.cc"];

const SCAN_EXTENSIONS: [&str; 7] = ["cpp", "cc", "cxx", "h", "hh", "hpp", "hxx"];

const BINARY_PATTERNS: [&str; 2] = ["*test*", "*_tests"];

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#include\s*[<"]gtest/gtest\.h[>"]"#).expect("Invalid regex")
});

/// Google Test framework adapter
pub struct GtestAdapter {
    checker: Arc<dyn SyntaxChecker>,
    coverage: Option<Arc<dyn CoverageRunner>>,
}

impl GtestAdapter {
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

    /// Run discovered test binaries directly, one JSON report each
    async fn run_direct(
        &self,
        binaries: &[PathBuf],
        report_dir: &Path,
        ctx: &RunContext,
        transcript: &mut Transcript,
    ) -> RunResult {
        if binaries.is_empty() {
            transcript.note("No Google Test binaries found for direct execution.");
            return RunResult::failure(transcript.render());
        }

        let mut aggregate = RunResult::default();
        for (idx, binary) in binaries.iter().enumerate() {
            let report = report_dir.join(format!("gtest-{idx}.json"));
            let cwd = binary.parent().unwrap_or(report_dir);
            let cmd = vec![
                binary.display().to_string(),
                format!("--gtest_output=json:{}", report.display()),
            ];

            let outcome = run_command(&cmd, cwd, ctx.timeout).await;
            transcript.record(&cmd, &outcome);

            // A hanging binary costs one error, not the whole run
            if outcome.timed_out {
                aggregate.errors += 1;
                continue;
            }

            if let Ok(json) = std::fs::read_to_string(&report) {
                aggregate.merge(gtest_json::parse(&json, ""));
            }
        }

        aggregate.raw_output = transcript.render();
        aggregate.recompute_success();
        aggregate
    }
}

#[async_trait]
impl TestFrameworkAdapter for GtestAdapter {
    fn name(&self) -> &'static str {
        "gtest"
    }

    fn language(&self) -> &'static str {
        "cpp"
    }

    fn detect(&self, project_path: &Path) -> bool {
        detect::config_has_marker(project_path, "CMakeLists.txt", "gtest", &CMAKE_MARKERS)
            || detect::source_include_present(project_path, &SCAN_EXTENSIONS, &INCLUDE_RE)
            || detect::matches_test_pattern(project_path, &TEST_PATTERNS)
    }

    fn test_patterns(&self) -> &'static [&'static str] {
        &TEST_PATTERNS
    }

    #[instrument(skip(self, ctx), fields(adapter = "gtest"))]
    async fn run_tests(&self, project_path: &Path, ctx: &RunContext) -> RunResult {
        let report_dir = match tempfile::Builder::new().prefix("gantry-gtest-").tempdir() {
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
            JunitDialect::CTEST,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::testing::StubChecker;
    use tempfile::TempDir;

    fn adapter() -> GtestAdapter {
        GtestAdapter::new(Arc::new(StubChecker::valid()))
    }

    #[test]
    fn test_detects_cmake_marker() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("CMakeLists.txt"),
            "find_package(GTest REQUIRED)\n",
        )
        .unwrap();

        assert!(adapter().detect(dir.path()));
    }

    #[test]
    fn test_cmake_name_without_marker_is_not_enough() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "# gtest someday\n").unwrap();

        assert!(!adapter().detect(dir.path()));
    }

    #[test]
    fn test_detects_include_directive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("calc.cpp"),
            "#include <gtest/gtest.h>\nTEST(Calc, Adds) {}\n",
        )
        .unwrap();

        assert!(adapter().detect(dir.path()));
    }

    #[test]
    fn test_detects_test_file_pattern() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("tests")).unwrap();
        std::fs::write(dir.path().join("tests/math_test.cpp"), "int main(){}\n").unwrap();

        assert!(adapter().detect(dir.path()));
    }

    #[test]
    fn test_empty_project_not_detected() {
        let dir = TempDir::new().unwrap();
        assert!(!adapter().detect(dir.path()));
    }

    #[tokio::test]
    async fn test_no_binaries_is_a_failure_with_note() {
        let dir = TempDir::new().unwrap();
        let result = adapter().run_tests(dir.path(), &RunContext::new()).await;

        assert!(!result.success);
        assert_eq!(result.total(), 0);
        assert!(result
            .raw_output
            .contains("No Google Test binaries found for direct execution."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_direct_binary_json_report_parsed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("calc_test");
        // Stands in for a gtest binary: honors --gtest_output=json:PATH
        let script = r#"#!/bin/sh
out="${1#--gtest_output=json:}"
cat > "$out" <<'JSON'
{"name": "AllTests", "testsuites": [{"name": "Calc", "testsuite": [
  {"name": "Adds", "status": "RUN", "time": "0.001s"},
  {"name": "Breaks", "status": "RUN", "failures": [{"failure": "boom"}]}
]}]}
JSON
exit 1
"#;
        std::fs::write(&binary, script).unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let result = adapter().run_tests(dir.path(), &RunContext::new()).await;

        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.success);
        assert!(result.raw_output.contains("exit_code=1"));
        let failed = result
            .test_cases
            .iter()
            .find(|c| c.name == "AllTests.Calc.Breaks")
            .unwrap();
        assert_eq!(failed.failure_message, "boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hanging_binary_counts_one_error_and_run_continues() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let dir = TempDir::new().unwrap();

        let hang = dir.path().join("a_hang_test");
        std::fs::write(&hang, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&hang, std::fs::Permissions::from_mode(0o755)).unwrap();

        let good = dir.path().join("z_good_test");
        let script = r#"#!/bin/sh
out="${1#--gtest_output=json:}"
cat > "$out" <<'JSON'
{"name": "AllTests", "testsuites": [{"name": "Calc", "testsuite": [
  {"name": "Adds", "status": "RUN", "time": "0.001s"}
]}]}
JSON
exit 0
"#;
        std::fs::write(&good, script).unwrap();
        std::fs::set_permissions(&good, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = RunContext::new().with_timeout(Duration::from_millis(500));
        let result = adapter().run_tests(dir.path(), &ctx).await;

        assert_eq!(result.errors, 1);
        assert_eq!(result.passed, 1);
        assert!(!result.success);
    }

    #[test]
    fn test_validate_reports_syntax_errors() {
        let adapter = GtestAdapter::new(Arc::new(StubChecker::with_error(3, 5)));
        let result = adapter.validate_test("TEST(Calc, Adds) {");

        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Syntax error at line 3-5"]);
    }

    #[test]
    fn test_prerequisites_name_cmake() {
        assert_eq!(adapter().required_commands(), ["cmake"]);
    }
}
