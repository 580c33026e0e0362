//! Validation gate for candidate test source
//!
//! Syntax checking is delegated to an external collaborator behind the
//! `SyntaxChecker` trait; this module only turns its error spans into
//! human-readable messages. Purely syntactic - candidate code is never
//! executed.

use gantry_core::ValidationResult;

/// One syntax-error region, in 1-based line numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start_line: usize,
    pub end_line: usize,
}

/// External syntax-checking collaborator
///
/// Implementations parse the source in the named language and report the
/// line span of every error node in the parse tree. An empty result means
/// the source is syntactically valid.
pub trait SyntaxChecker: Send + Sync {
    fn error_spans(&self, source: &[u8], language: &str) -> Vec<LineSpan>;
}

/// Run *source* through the checker and format one message per error span
pub fn validate_source(
    checker: &dyn SyntaxChecker,
    source: &str,
    language: &str,
) -> ValidationResult {
    let spans = checker.error_spans(source.as_bytes(), language);
    if spans.is_empty() {
        return ValidationResult::ok();
    }

    let errors = spans
        .iter()
        .map(|span| format!("Syntax error at line {}-{}", span.start_line, span.end_line))
        .collect();
    ValidationResult::with_errors(errors)
}


#[cfg(test)]
mod tests {
    use super::testing::StubChecker;
    use super::*;

    #[test]
    fn test_valid_source_has_no_errors() {
        let checker = StubChecker::valid();
        let result = validate_source(&checker, "int main() {}", "cpp");
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_error_spans_become_messages() {
        let checker = StubChecker::with_error(3, 5);
        let result = validate_source(&checker, "int main() {", "cpp");
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Syntax error at line 3-5"]);
    }
}
