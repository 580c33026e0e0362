//! Gantry Adapters - Test framework adapter layer
//!
//! One uniform contract per framework: detect which toolchain a project
//! uses, drive its build/execute machinery through fallback strategies,
//! and normalize its native report format into the canonical result model.
//!
//! Supported frameworks: Google Test and Catch2 (CMake/CTest with direct
//! binary fallback), xUnit (dotnet test + TRX), pytest (JSON report).

pub mod context;
pub mod coverage;
pub mod detect;
pub mod exec;
pub mod frameworks;
pub mod registry;
pub mod report;
pub mod traits;
pub mod validate;

pub use context::RunContext;
pub use coverage::CoverageRunner;
pub use frameworks::{Catch2Adapter, GtestAdapter, PytestAdapter, XunitAdapter};
pub use registry::AdapterRegistry;
pub use traits::{
    PrerequisiteStatus, PromptTemplate, TestFrameworkAdapter, ToolStatus,
};
pub use validate::{LineSpan, SyntaxChecker};
