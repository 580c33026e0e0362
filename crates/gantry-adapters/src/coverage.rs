//! Coverage collaborator seam
//!
//! Coverage collection runs strictly after test execution and is isolated
//! from the already-computed result: any error the collaborator raises is
//! logged and discarded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use gantry_core::{CoverageReport, Result, RunResult};

/// External coverage collection collaborator
#[async_trait]
pub trait CoverageRunner: Send + Sync {
    async fn run_coverage(
        &self,
        project_path: &Path,
        test_files: &[PathBuf],
        timeout: Duration,
    ) -> Result<CoverageReport>;
}

/// Attach coverage to *result* if a runner is configured.
///
/// Must never convert an otherwise-successful result into a failure.
pub(crate) async fn attach_coverage(
    runner: Option<&dyn CoverageRunner>,
    result: &mut RunResult,
    project_path: &Path,
    test_files: &[PathBuf],
    timeout: Duration,
) {
    let Some(runner) = runner else {
        return;
    };

    match runner.run_coverage(project_path, test_files, timeout).await {
        Ok(report) => {
            info!(
                line_coverage = report.line_coverage,
                "coverage collected"
            );
            result.coverage = Some(report);
        }
        Err(err) => {
            warn!(error = %err, "failed to collect coverage");
        }
    }
}
