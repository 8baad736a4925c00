use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::{ast::ast::NodeId, Span};

/// The family a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    Structural,
    Reference,
    Type,
    Abi,
    Warning,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Structural => "StructuralError",
            ErrorCategory::Reference => "ReferenceError",
            ErrorCategory::Type => "TypeError",
            ErrorCategory::Abi => "ABIError",
            ErrorCategory::Warning => "Warning",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub error: ErrorImpl,
    pub span: Span,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn category(&self) -> ErrorCategory {
        self.error.category()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error.category(), self.error)
    }
}

/// Append-only diagnostic sink shared by every part of the checker.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter { diagnostics: vec![] }
    }

    pub fn record_error(&mut self, error: ErrorImpl, span: &Span) {
        tracing::debug!(kind = error.get_error_name(), "{}", error);
        self.diagnostics.push(Diagnostic {
            error,
            span: span.clone(),
            severity: Severity::Error,
        });
    }

    pub fn record_warning(&mut self, error: ErrorImpl, span: &Span) {
        tracing::debug!(kind = error.get_error_name(), "warning: {}", error);
        self.diagnostics.push(Diagnostic {
            error,
            span: span.clone(),
            severity: Severity::Warning,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diagnostic| diagnostic.severity == Severity::Warning)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl ErrorImpl {
    pub fn get_error_name(&self) -> &'static str {
        match self {
            ErrorImpl::InheritanceCycle { .. } => "InheritanceCycle",
            ErrorImpl::FunctionSignature { .. } => "FunctionSignature",
            ErrorImpl::InvalidDeclaration { .. } => "InvalidDeclaration",
            ErrorImpl::InvalidDataLocation { .. } => "InvalidDataLocation",
            ErrorImpl::InvalidStatement { .. } => "InvalidStatement",
            ErrorImpl::UnresolvedReference { .. } => "UnresolvedReference",
            ErrorImpl::ExternalOnlyReference { .. } => "ExternalOnlyReference",
            ErrorImpl::AmbiguousReference { .. } => "AmbiguousReference",
            ErrorImpl::NoMatchingOverload { .. } => "NoMatchingOverload",
            ErrorImpl::MemberNotFound { .. } => "MemberNotFound",
            ErrorImpl::NotModifierOrBase { .. } => "NotModifierOrBase",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::NotAssignable { .. } => "NotAssignable",
            ErrorImpl::OperatorNotApplicable { .. } => "OperatorNotApplicable",
            ErrorImpl::OperatorNotCompatible { .. } => "OperatorNotCompatible",
            ErrorImpl::NoCommonType { .. } => "NoCommonType",
            ErrorImpl::InvalidIndexOperation { .. } => "InvalidIndexOperation",
            ErrorImpl::NotAwaitable { .. } => "NotAwaitable",
            ErrorImpl::ArgumentCount { .. } => "ArgumentCount",
            ErrorImpl::UnknownNamedArgument { .. } => "UnknownNamedArgument",
            ErrorImpl::DuplicateNamedArgument { .. } => "DuplicateNamedArgument",
            ErrorImpl::ArgumentType { .. } => "ArgumentType",
            ErrorImpl::ExplicitConversionNotAllowed { .. } => "ExplicitConversionNotAllowed",
            ErrorImpl::InvalidLiteral { .. } => "InvalidLiteral",
            ErrorImpl::InvalidTypeName { .. } => "InvalidTypeName",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::InvalidNewExpression { .. } => "InvalidNewExpression",
            ErrorImpl::FeatureUnavailable { .. } => "FeatureUnavailable",
            ErrorImpl::InvalidTypeOperation { .. } => "InvalidTypeOperation",
            ErrorImpl::NotAbiEncodable { .. } => "NotAbiEncodable",
            ErrorImpl::InvalidAbiDecodeUsage { .. } => "InvalidAbiDecodeUsage",
            ErrorImpl::InvalidCallOption { .. } => "InvalidCallOption",
            ErrorImpl::DoubleStorageAssignment => "DoubleStorageAssignment",
            ErrorImpl::Deprecated { .. } => "Deprecated",
            ErrorImpl::UnusedCallResult { .. } => "UnusedCallResult",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorImpl::InheritanceCycle { .. }
            | ErrorImpl::FunctionSignature { .. }
            | ErrorImpl::InvalidDeclaration { .. }
            | ErrorImpl::InvalidDataLocation { .. }
            | ErrorImpl::InvalidStatement { .. } => ErrorCategory::Structural,
            ErrorImpl::UnresolvedReference { .. }
            | ErrorImpl::ExternalOnlyReference { .. }
            | ErrorImpl::AmbiguousReference { .. }
            | ErrorImpl::NoMatchingOverload { .. }
            | ErrorImpl::MemberNotFound { .. }
            | ErrorImpl::NotModifierOrBase { .. } => ErrorCategory::Reference,
            ErrorImpl::TypeMismatch { .. }
            | ErrorImpl::NotAssignable { .. }
            | ErrorImpl::OperatorNotApplicable { .. }
            | ErrorImpl::OperatorNotCompatible { .. }
            | ErrorImpl::NoCommonType { .. }
            | ErrorImpl::InvalidIndexOperation { .. }
            | ErrorImpl::NotAwaitable { .. }
            | ErrorImpl::ArgumentCount { .. }
            | ErrorImpl::UnknownNamedArgument { .. }
            | ErrorImpl::DuplicateNamedArgument { .. }
            | ErrorImpl::ArgumentType { .. }
            | ErrorImpl::ExplicitConversionNotAllowed { .. }
            | ErrorImpl::InvalidLiteral { .. }
            | ErrorImpl::InvalidTypeName { .. }
            | ErrorImpl::NotCallable { .. }
            | ErrorImpl::InvalidNewExpression { .. }
            | ErrorImpl::FeatureUnavailable { .. }
            | ErrorImpl::InvalidTypeOperation { .. } => ErrorCategory::Type,
            ErrorImpl::NotAbiEncodable { .. }
            | ErrorImpl::InvalidAbiDecodeUsage { .. }
            | ErrorImpl::InvalidCallOption { .. } => ErrorCategory::Abi,
            ErrorImpl::DoubleStorageAssignment
            | ErrorImpl::Deprecated { .. }
            | ErrorImpl::UnusedCallResult { .. } => ErrorCategory::Warning,
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match self {
            ErrorImpl::InheritanceCycle { contract } => {
                ErrorTip::Suggestion(format!("Remove `{}` from its own chain of base contracts", contract))
            }
            ErrorImpl::UnresolvedReference { name } => {
                ErrorTip::Suggestion(format!("`{}` is not declared in this scope", name))
            }
            ErrorImpl::ExternalOnlyReference { name } => {
                ErrorTip::Suggestion(format!("Call it as `this.{}` or make it public", name))
            }
            ErrorImpl::AmbiguousReference { name } => ErrorTip::Suggestion(format!(
                "Several overloads of `{}` accept these arguments, add explicit conversions",
                name
            )),
            ErrorImpl::NoMatchingOverload { name } => {
                ErrorTip::Suggestion(format!("Check the argument types passed to `{}`", name))
            }
            ErrorImpl::ArgumentCount { expected, .. } => {
                ErrorTip::Suggestion(format!("Expected {} arguments", expected))
            }
            ErrorImpl::TypeMismatch { expected, .. } => {
                ErrorTip::Suggestion(format!("Convert the value to `{}` explicitly if this is intended", expected))
            }
            ErrorImpl::NotAwaitable { .. } => {
                ErrorTip::Suggestion(String::from("Only the result of sending a message can be awaited"))
            }
            ErrorImpl::InvalidAbiDecodeUsage { .. } => {
                ErrorTip::Suggestion(String::from("Write the result types inline, e.g. `abi.decode(data, (uint256, bool))`"))
            }
            ErrorImpl::DoubleStorageAssignment => ErrorTip::Suggestion(String::from(
                "Split the assignment into separate statements to make the order explicit",
            )),
            ErrorImpl::FeatureUnavailable { evm_version, .. } => {
                ErrorTip::Suggestion(format!("Select a newer target than {}", evm_version))
            }
            ErrorImpl::NotAbiEncodable { .. } => {
                ErrorTip::Suggestion(String::from("Enable the new encoder with `pragma abicoder v2;`"))
            }
            _ => ErrorTip::None,
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

/// User-facing diagnostics. Messages follow the wording users know from solc.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum ErrorImpl {
    // structural
    #[error("Definition of base has to precede definition of derived contract: {contract} inherits from itself.")]
    InheritanceCycle { contract: String },
    #[error("{message}")]
    FunctionSignature { message: String },
    #[error("{message}")]
    InvalidDeclaration { message: String },
    #[error("{message}")]
    InvalidDataLocation { message: String },
    #[error("{message}")]
    InvalidStatement { message: String },

    // reference
    #[error("Undeclared identifier \"{name}\".")]
    UnresolvedReference { name: String },
    #[error("\"{name}\" is an external function and only reachable via \"this.{name}\".")]
    ExternalOnlyReference { name: String },
    #[error("No unique declaration found after argument-dependent lookup of \"{name}\".")]
    AmbiguousReference { name: String },
    #[error("No matching declaration found after argument-dependent lookup of \"{name}\".")]
    NoMatchingOverload { name: String },
    #[error("Member \"{member}\" not found or not visible after argument-dependent lookup in {type_}.")]
    MemberNotFound { member: String, type_: String },
    #[error("Referenced declaration \"{name}\" is neither modifier nor base class.")]
    NotModifierOrBase { name: String },

    // type
    #[error("Type {received} is not implicitly convertible to expected type {expected}.")]
    TypeMismatch { expected: String, received: String },
    #[error("{message}")]
    NotAssignable { message: String },
    #[error("Unary operator {operator} cannot be applied to type {type_}.")]
    OperatorNotApplicable { operator: String, type_: String },
    #[error("Operator {operator} not compatible with types {left} and {right}.")]
    OperatorNotCompatible { operator: String, left: String, right: String },
    #[error("True expression's type {left} does not match false expression's type {right}.")]
    NoCommonType { left: String, right: String },
    #[error("{message}")]
    InvalidIndexOperation { message: String },
    #[error("Expression of type {type_} cannot be awaited, expected a message handle.")]
    NotAwaitable { type_: String },
    #[error("Wrong argument count for {context}: {given} arguments given but expected {expected}.")]
    ArgumentCount { context: String, given: usize, expected: usize },
    #[error("Named argument \"{name}\" does not match function declaration.")]
    UnknownNamedArgument { name: String },
    #[error("Duplicate named argument \"{name}\".")]
    DuplicateNamedArgument { name: String },
    #[error("Invalid type for argument in {context}. Invalid implicit conversion from {received} to {expected} requested.")]
    ArgumentType { context: String, expected: String, received: String },
    #[error("Explicit type conversion not allowed from \"{from}\" to \"{to}\".")]
    ExplicitConversionNotAllowed { from: String, to: String },
    #[error("Invalid literal {value}: {message}")]
    InvalidLiteral { value: String, message: String },
    #[error("{message}")]
    InvalidTypeName { message: String },
    #[error("Type is not callable: {type_}")]
    NotCallable { type_: String },
    #[error("{message}")]
    InvalidNewExpression { message: String },
    #[error("\"{feature}\" is not supported by the VM version {evm_version}.")]
    FeatureUnavailable { feature: String, evm_version: String },
    #[error("{message}")]
    InvalidTypeOperation { message: String },

    // abi
    #[error("{message}")]
    NotAbiEncodable { type_: String, message: String },
    #[error("{message}")]
    InvalidAbiDecodeUsage { message: String },
    #[error("{message}")]
    InvalidCallOption { message: String },

    // warnings
    #[error("This assignment performs two copies to storage. Since storage copies do not first copy to a temporary location, one of them might be overwritten before the second is executed and thus may have unexpected effects. It is safer to perform the copies separately or assign to storage pointers first.")]
    DoubleStorageAssignment,
    #[error("{message}")]
    Deprecated { message: String },
    #[error("{message}")]
    UnusedCallResult { message: String },
}

/// Broken invariants of the checker itself or of the upstream passes. These
/// abort the run instead of being reported to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("type annotation of node {node} written twice")]
    AnnotationRewritten { node: NodeId },
    #[error("node {node} references declaration {declaration}, which does not exist")]
    DanglingReference { node: NodeId, declaration: NodeId },
    #[error("node {node} was never type checked")]
    MissingAnnotation { node: NodeId },
    #[error("node {node} carries {names} argument names for {values} arguments")]
    ArgumentNamesMismatch { node: NodeId, names: usize, values: usize },
}
