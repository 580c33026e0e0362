//! pytest adapter for Python projects

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use gantry_core::{RunResult, ValidationResult};

use crate::context::RunContext;
use crate::coverage::{attach_coverage, CoverageRunner};
use crate::exec::{run_command, Transcript};
use crate::report::pytest_json;
use crate::traits::TestFrameworkAdapter;
use crate::validate::{validate_source, SyntaxChecker};

const TEST_PATTERNS: [&str; 2] = ["**/test_*.py", "**/*_test.py"];

/// pytest framework adapter
pub struct PytestAdapter {
    checker: Arc<dyn SyntaxChecker>,
    coverage: Option<Arc<dyn CoverageRunner>>,
}

impl PytestAdapter {
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
}

#[async_trait]
impl TestFrameworkAdapter for PytestAdapter {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn language(&self) -> &'static str {
        "python"
    }

    /// Ordered OR of configuration signals, cheapest first:
    /// `conftest.py`, `pytest.ini`, a `[tool.pytest` section in
    /// `pyproject.toml`, a `[tool:pytest]` section in `setup.cfg`, and
    /// finally pytest named as a dependency in `pyproject.toml`.
    fn detect(&self, project_path: &Path) -> bool {
        project_path.join("conftest.py").is_file()
            || project_path.join("pytest.ini").is_file()
            || file_contains(project_path, "pyproject.toml", "[tool.pytest")
            || file_contains(project_path, "setup.cfg", "[tool:pytest]")
            || has_pytest_dependency(project_path)
    }

    fn test_patterns(&self) -> &'static [&'static str] {
        &TEST_PATTERNS
    }

    #[instrument(skip(self, ctx), fields(adapter = "pytest"))]
    async fn run_tests(&self, project_path: &Path, ctx: &RunContext) -> RunResult {
        // --json-report-file=- is unreliable; write to a scoped temp file
        let report_dir = match tempfile::Builder::new().prefix("gantry-pytest-").tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                return RunResult::failure(format!("Failed to create report directory: {err}"));
            }
        };
        let report_path = report_dir.path().join("pytest-report.json");

        let mut cmd = vec![
            "pytest".to_string(),
            "--json-report".to_string(),
            format!("--json-report-file={}", report_path.display()),
            "-q".to_string(),
        ];
        cmd.extend(ctx.test_files.iter().map(|f| f.display().to_string()));

        let mut transcript = Transcript::new();
        let outcome = run_command(&cmd, project_path, ctx.timeout).await;
        transcript.record(&cmd, &outcome);

        if outcome.timed_out || outcome.not_found {
            return RunResult::failure(transcript.render());
        }

        let report_content = std::fs::read_to_string(&report_path).unwrap_or_default();
        let mut result = pytest_json::parse(&report_content, &transcript.render());

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

    fn required_packages(&self) -> &'static [&'static str] {
        &["pytest", "pytest-json-report"]
    }

    fn required_commands(&self) -> &'static [&'static str] {
        &["python"]
    }
}

fn file_contains(project_path: &Path, file_name: &str, needle: &str) -> bool {
    let path = project_path.join(file_name);
    match std::fs::read_to_string(path) {
        Ok(content) => content.contains(needle),
        Err(_) => false,
    }
}

/// Line scan of `pyproject.toml` for pytest in a dependency list.
///
/// Section headers are skipped so `[tool.pytest.ini_options]` itself
/// does not count; that signal is handled separately.
fn has_pytest_dependency(project_path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(project_path.join("pyproject.toml")) else {
        return false;
    };

    content.lines().any(|line| {
        let stripped = line.trim().trim_matches(|c| c == '"' || c == '\'');
        !stripped.starts_with('[')
            && stripped.to_lowercase().contains("pytest")
            && !stripped.contains("tool.pytest")
    })
}
