//! Built-in framework adapters

use std::sync::Arc;

pub mod catch2;
mod cmake;
pub mod gtest;
pub mod pytest;
pub mod xunit;

pub use catch2::Catch2Adapter;
pub use gtest::GtestAdapter;
pub use pytest::PytestAdapter;
pub use xunit::XunitAdapter;

use crate::registry::AdapterRegistry;
use crate::validate::SyntaxChecker;

/// Register every built-in adapter.
///
/// Registration order is detection priority: the C++ frameworks carry
/// the most specific signals and go first, pytest's broad dependency
/// scan goes last.
pub fn register_all(registry: &mut AdapterRegistry, checker: Arc<dyn SyntaxChecker>) {
    registry.register(GtestAdapter::new(checker.clone()));
    registry.register(Catch2Adapter::new(checker.clone()));
    registry.register(XunitAdapter::new(checker.clone()));
    registry.register(PytestAdapter::new(checker));
}
