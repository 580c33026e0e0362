//! Report parsers
//!
//! Pure functions, one per (framework, wire-format) pair, converting raw
//! report text into the canonical result model. Parsers never panic:
//! malformed or empty input yields a zero-case, unsuccessful result.

pub mod duration;
pub mod gtest_json;
pub mod junit;
pub mod pytest_json;
pub mod trx;
