//! Unit tests for diagnostics and the error reporter.

use crate::errors::errors::{ErrorCategory, ErrorImpl, ErrorReporter, ErrorTip, InternalError, Severity};
use crate::{ast::ast::NodeId, Position, Span};
use std::rc::Rc;

fn span_at(offset: u32) -> Span {
    Span {
        start: Position(offset, Rc::new("test.sol".to_string())),
        end: Position(offset + 1, Rc::new("test.sol".to_string())),
    }
}

#[test]
fn test_error_name() {
    let error = ErrorImpl::UnresolvedReference { name: "foo".to_string() };
    assert_eq!(error.get_error_name(), "UnresolvedReference");
}

#[test]
fn test_type_mismatch_message() {
    let error = ErrorImpl::TypeMismatch {
        expected: "uint256".to_string(),
        received: "bool".to_string(),
    };

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(
        error.to_string(),
        "Type bool is not implicitly convertible to expected type uint256."
    );
    assert_eq!(error.category(), ErrorCategory::Type);
}

#[test]
fn test_argument_count_message() {
    let error = ErrorImpl::ArgumentCount {
        context: "function call".to_string(),
        given: 1,
        expected: 2,
    };

    assert_eq!(
        error.to_string(),
        "Wrong argument count for function call: 1 arguments given but expected 2."
    );
}

#[test]
fn test_operator_not_compatible_message() {
    let error = ErrorImpl::OperatorNotCompatible {
        operator: "+".to_string(),
        left: "uint256".to_string(),
        right: "bool".to_string(),
    };

    assert_eq!(error.to_string(), "Operator + not compatible with types uint256 and bool.");
}

#[test]
fn test_categories() {
    assert_eq!(
        ErrorImpl::InheritanceCycle { contract: "A".to_string() }.category(),
        ErrorCategory::Structural
    );
    assert_eq!(
        ErrorImpl::AmbiguousReference { name: "f".to_string() }.category(),
        ErrorCategory::Reference
    );
    assert_eq!(
        ErrorImpl::InvalidAbiDecodeUsage { message: String::new() }.category(),
        ErrorCategory::Abi
    );
    assert_eq!(ErrorImpl::DoubleStorageAssignment.category(), ErrorCategory::Warning);
    assert_eq!(ErrorCategory::Abi.to_string(), "ABIError");
}

#[test]
fn test_error_tip() {
    let tip = ErrorImpl::DoubleStorageAssignment.get_tip();
    assert!(matches!(tip, ErrorTip::Suggestion(_)));

    let tip = ErrorImpl::Deprecated { message: "x".to_string() }.get_tip();
    assert!(matches!(tip, ErrorTip::None));
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_reporter_keeps_order() {
    let mut reporter = ErrorReporter::new();
    assert!(reporter.is_empty());

    reporter.record_error(ErrorImpl::UnresolvedReference { name: "a".to_string() }, &span_at(3));
    reporter.record_warning(ErrorImpl::DoubleStorageAssignment, &span_at(7));
    reporter.record_error(ErrorImpl::UnresolvedReference { name: "b".to_string() }, &span_at(9));

    assert_eq!(reporter.len(), 3);
    assert!(reporter.has_errors());
    assert_eq!(reporter.errors().count(), 2);
    assert_eq!(reporter.warnings().count(), 1);

    let offsets: Vec<u32> = reporter.diagnostics().iter().map(|d| d.span.start.0).collect();
    assert_eq!(offsets, vec![3, 7, 9]);
    assert_eq!(reporter.diagnostics()[1].severity, Severity::Warning);
}

#[test]
fn test_warnings_do_not_count_as_errors() {
    let mut reporter = ErrorReporter::new();
    reporter.record_warning(ErrorImpl::DoubleStorageAssignment, &span_at(0));
    reporter.record_warning(
        ErrorImpl::Deprecated { message: "\"selfdestruct\" has been deprecated.".to_string() },
        &span_at(0),
    );

    assert!(!reporter.has_errors());
    assert_eq!(reporter.warnings().count(), 2);
}

#[test]
fn test_diagnostic_display() {
    let mut reporter = ErrorReporter::new();
    reporter.record_error(ErrorImpl::NotAwaitable { type_: "uint256".to_string() }, &span_at(0));

    let diagnostic = &reporter.diagnostics()[0];
    assert_eq!(
        diagnostic.to_string(),
        "TypeError: Expression of type uint256 cannot be awaited, expected a message handle."
    );
}

#[test]
fn test_diagnostic_serializes_kind() {
    let mut reporter = ErrorReporter::new();
    reporter.record_error(ErrorImpl::UnresolvedReference { name: "x".to_string() }, &span_at(1));

    let json = serde_json::to_value(&reporter.diagnostics()[0]).unwrap();
    assert_eq!(json["error"]["kind"], "UnresolvedReference");
    assert_eq!(json["error"]["name"], "x");
    assert_eq!(json["severity"], "error");
}

#[test]
fn test_internal_error_message() {
    let error = InternalError::AnnotationRewritten { node: NodeId(12) };
    assert_eq!(error.to_string(), "type annotation of node #12 written twice");
}

#[test]
fn test_argument_names_mismatch_message() {
    let error = InternalError::ArgumentNamesMismatch {
        node: NodeId(7),
        names: 2,
        values: 1,
    };
    assert_eq!(error.to_string(), "node #7 carries 2 argument names for 1 arguments");
}

#[test]
fn test_external_only_reference() {
    let error = ErrorImpl::ExternalOnlyReference { name: "g".to_string() };
    assert_eq!(error.get_error_name(), "ExternalOnlyReference");
    assert_eq!(error.category(), ErrorCategory::Reference);
    assert_eq!(
        error.to_string(),
        "\"g\" is an external function and only reachable via \"this.g\"."
    );
    assert!(matches!(error.get_tip(), ErrorTip::Suggestion(tip) if tip.contains("this.g")));
}

#[test]
fn test_display_error_without_source() {
    let mut reporter = ErrorReporter::new();
    reporter.record_error(ErrorImpl::UnresolvedReference { name: "x".to_string() }, &span_at(1));

    let output = crate::display_error(&reporter.diagnostics()[0], "test.sol", None);
    assert_eq!(
        output,
        "Error: UnresolvedReference (`x` is not declared in this scope)\n-> test.sol\n"
    );
}

#[test]
fn test_display_error_with_source() {
    let source = "contract C {\n    uint a = true;\n}\n";
    let mut reporter = ErrorReporter::new();
    reporter.record_error(
        ErrorImpl::TypeMismatch {
            expected: "uint256".to_string(),
            received: "bool".to_string(),
        },
        &span_at(26),
    );

    let output = crate::display_error(&reporter.diagnostics()[0], "test.sol", Some(source));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[2], "  |");
    assert_eq!(lines[3], "2 | uint a = true;");
    assert_eq!(lines[4], "  | ---------^");
}
