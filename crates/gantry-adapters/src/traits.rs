//! Core trait for test framework adapters
//!
//! Every framework implements this one contract. Higher-level consumers
//! (coverage analysis, risk scoring, self-healing, reporting) depend on
//! nothing below it.

use std::path::Path;

use async_trait::async_trait;

use gantry_core::{RunResult, ValidationResult};

use crate::context::RunContext;

/// Identifier for the prompt template a generation layer should use.
///
/// Prompt construction itself lives outside this crate; adapters only
/// name the template that matches their framework and language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub framework: &'static str,
    pub language: &'static str,
}

/// Test framework adapter contract
///
/// Adapter instances are stateless configuration: distinct calls (or
/// distinct adapters) may run concurrently from multiple tasks without
/// coordination. Each `run_tests` call exclusively owns one scoped
/// temporary directory for report artifacts.
#[async_trait]
pub trait TestFrameworkAdapter: Send + Sync {
    /// Framework identifier (e.g. `"gtest"`, `"pytest"`)
    fn name(&self) -> &'static str;

    /// Primary language (e.g. `"cpp"`, `"python"`)
    fn language(&self) -> &'static str;

    /// Return `true` when the project likely uses this framework.
    ///
    /// Read-only and bounded-cost: never touches the network, never
    /// spawns processes.
    fn detect(&self, project_path: &Path) -> bool;

    /// Glob patterns for this framework's test files
    fn test_patterns(&self) -> &'static [&'static str];

    /// Template identifier for the test-generation layer (pass-through)
    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            framework: self.name(),
            language: self.language(),
        }
    }

    /// Execute tests and normalize the outcome.
    ///
    /// This boundary is an exception firewall: every failure mode (missing
    /// tools, timeouts, malformed reports, subprocess errors) is folded
    /// into a `RunResult` with `success == false` and a transcript naming
    /// the stage that failed. Nothing framework-specific escapes.
    async fn run_tests(&self, project_path: &Path, ctx: &RunContext) -> RunResult;

    /// Check candidate test source for syntax errors without executing it
    fn validate_test(&self, test_code: &str) -> ValidationResult;

    /// Packages that must be installed for this framework
    fn required_packages(&self) -> &'static [&'static str] {
        &[]
    }

    /// Commands that must be available on PATH
    fn required_commands(&self) -> &'static [&'static str] {
        &[]
    }

    /// Probe PATH for every required command
    fn check_prerequisites(&self) -> PrerequisiteStatus {
        let mut status = PrerequisiteStatus::ok();
        for command in self.required_commands() {
            status = match which::which(command) {
                Ok(path) => status.with_tool(ToolStatus::found(
                    *command,
                    Some(path.display().to_string()),
                )),
                Err(_) => status.with_tool(ToolStatus::missing(
                    *command,
                    format!("Install '{command}' and ensure it is on PATH"),
                )),
            };
        }
        status
    }
}

/// Status of a prerequisites check
#[derive(Debug, Clone)]
pub struct PrerequisiteStatus {
    pub satisfied: bool,
    pub tools: Vec<ToolStatus>,
}

impl PrerequisiteStatus {
    pub fn ok() -> Self {
        Self {
            satisfied: true,
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: ToolStatus) -> Self {
        if !tool.available {
            self.satisfied = false;
        }
        self.tools.push(tool);
        self
    }
}

/// Availability of one required tool
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub resolved_path: Option<String>,
    pub install_hint: String,
}

impl ToolStatus {
    pub fn found(name: impl Into<String>, resolved_path: Option<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
            resolved_path,
            install_hint: String::new(),
        }
    }

    pub fn missing(name: impl Into<String>, install_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: false,
            resolved_path: None,
            install_hint: install_hint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerequisite_status_tracks_missing_tools() {
        let status = PrerequisiteStatus::ok()
            .with_tool(ToolStatus::found("cmake", None))
            .with_tool(ToolStatus::missing("ctest", "Install CMake"));

        assert!(!status.satisfied);
        assert_eq!(status.tools.len(), 2);
    }
}
