//! xUnit adapter for C#/.NET projects
//!
//! Runs `dotnet test` against a solution or test project with the TRX
//! logger. Unlike the C++ adapters there is no second execution route:
//! without a usable project file the run fails outright.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::instrument;

use gantry_core::{RunResult, ValidationResult};

use crate::context::RunContext;
use crate::coverage::{attach_coverage, CoverageRunner};
use crate::detect::{self, walk_visible_files};
use crate::exec::{run_command, Transcript};
use crate::report::trx;
use crate::traits::TestFrameworkAdapter;
use crate::validate::{validate_source, SyntaxChecker};

const TEST_PATTERNS: [&str; 2] = ["**/*Tests.cs", "**/*Test.cs"];

static CSPROJ_XUNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)PackageReference\s+Include\s*=\s*["'][^"']*xunit[^"']*["']"#)
        .expect("Invalid regex")
});

static XUNIT_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"using\s+Xunit\s*;").expect("Invalid regex"));

/// xUnit framework adapter
pub struct XunitAdapter {
    checker: Arc<dyn SyntaxChecker>,
    coverage: Option<Arc<dyn CoverageRunner>>,
}

impl XunitAdapter {
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
impl TestFrameworkAdapter for XunitAdapter {
    fn name(&self) -> &'static str {
        "xunit"
    }

    fn language(&self) -> &'static str {
        "csharp"
    }

    fn detect(&self, project_path: &Path) -> bool {
        has_xunit_csproj(project_path)
            || (has_xunit_import(project_path)
                && detect::matches_test_pattern(project_path, &TEST_PATTERNS))
    }

    fn test_patterns(&self) -> &'static [&'static str] {
        &TEST_PATTERNS
    }

    #[instrument(skip(self, ctx), fields(adapter = "xunit"))]
    async fn run_tests(&self, project_path: &Path, ctx: &RunContext) -> RunResult {
        let Some(target) = find_sln_or_csproj(project_path) else {
            return RunResult::failure("No .sln or .csproj found");
        };

        let report_dir = match tempfile::Builder::new().prefix("gantry-xunit-").tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                return RunResult::failure(format!("Failed to create report directory: {err}"));
            }
        };
        let trx_path = report_dir.path().join("xunit-results.trx");

        let mut cmd = vec![
            "dotnet".to_string(),
            "test".to_string(),
            target.display().to_string(),
            "--logger".to_string(),
            format!("trx;LogFileName={}", trx_path.display()),
        ];
        let filter = fully_qualified_filter(&ctx.test_files);
        if !filter.is_empty() {
            cmd.push("--filter".to_string());
            cmd.push(filter);
        }

        let mut transcript = Transcript::new();
        let outcome = run_command(&cmd, project_path, ctx.timeout).await;
        transcript.record(&cmd, &outcome);

        if outcome.timed_out || outcome.not_found {
            return RunResult::failure(transcript.render());
        }

        let Ok(xml) = std::fs::read_to_string(&trx_path) else {
            transcript.note("dotnet test produced no TRX report.");
            return RunResult::failure(transcript.render());
        };

        let mut result = trx::parse(&xml, &transcript.render());

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
        &["dotnet"]
    }
}

fn has_xunit_csproj(project_path: &Path) -> bool {
    csproj_files(project_path)
        .into_iter()
        .any(|path| match std::fs::read_to_string(&path) {
            Ok(content) => CSPROJ_XUNIT_RE.is_match(&content),
            Err(_) => false,
        })
}

fn has_xunit_import(project_path: &Path) -> bool {
    for entry in walk_visible_files(project_path) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("cs") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        if XUNIT_IMPORT_RE.is_match(&content) {
            return true;
        }
    }
    false
}

/// Pick what `dotnet test` runs against: a top-level solution first, then
/// a project that references xUnit, then any project at all.
fn find_sln_or_csproj(project_path: &Path) -> Option<PathBuf> {
    if let Ok(entries) = std::fs::read_dir(project_path) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sln") {
                return Some(path);
            }
        }
    }

    let projects = csproj_files(project_path);
    for path in &projects {
        if let Ok(content) = std::fs::read_to_string(path) {
            if CSPROJ_XUNIT_RE.is_match(&content) {
                return Some(path.clone());
            }
        }
    }

    projects.into_iter().next()
}

fn csproj_files(project_path: &Path) -> Vec<PathBuf> {
    walk_visible_files(project_path)
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csproj"))
        .collect()
}

/// `dotnet test --filter` expression matching the requested test classes
fn fully_qualified_filter(test_files: &[PathBuf]) -> String {
    let clauses: Vec<String> = test_files
        .iter()
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("cs"))
        .filter_map(|path| path.file_stem())
        .filter_map(|stem| stem.to_str())
        .map(|stem| format!("FullyQualifiedName~{stem}"))
        .collect();
    clauses.join("|")
}
