//! Gantry Core - Canonical test result model
//!
//! This crate provides the shared data schema every framework adapter
//! produces (`RunResult`, `CaseResult`, `ValidationResult`) along with
//! the error types used at the adapter resolution boundary.

pub mod error;
pub mod result;

pub use error::{AdapterError, Result};
pub use result::{
    CaseResult, CaseStatus, CoverageReport, FileCoverage, RunResult, ValidationResult,
};
