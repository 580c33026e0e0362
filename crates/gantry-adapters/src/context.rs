//! Run context for test execution
//!
//! Carries the per-call options a caller hands to `run_tests`. Adapters
//! themselves are stateless; everything that varies between runs lives here.

use std::path::PathBuf;
use std::time::Duration;

/// Options for a single `run_tests` invocation
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Specific test files to run; empty runs everything
    pub test_files: Vec<PathBuf>,
    /// Budget for each subprocess the adapter spawns
    pub timeout: Duration,
    /// Collect coverage after execution (failure never flips the result)
    pub collect_coverage: bool,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            test_files: Vec::new(),
            timeout: Duration::from_secs(180),
            collect_coverage: false,
        }
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_files(mut self, files: Vec<PathBuf>) -> Self {
        self.test_files = files;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_coverage(mut self, collect: bool) -> Self {
        self.collect_coverage = collect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = RunContext::new()
            .with_test_files(vec![PathBuf::from("calc_test.cpp")])
            .with_timeout(Duration::from_secs(30))
            .with_coverage(true);

        assert_eq!(ctx.test_files.len(), 1);
        assert_eq!(ctx.timeout, Duration::from_secs(30));
        assert!(ctx.collect_coverage);
    }
}
