//! Type checking and semantic analysis module.
//!
//! This module performs type checking and semantic analysis on a name-linked
//! AST. Every visited expression and variable declaration receives exactly one
//! type annotation while:
//!
//! - Verifying type correctness of expressions and statements
//! - Resolving references and narrowing overloaded candidates
//! - Checking function calls, ABI encoding and call options
//! - Detecting inheritance cycles and malformed declarations
//! - Warning about overlapping storage writes
//!
//! Diagnostics go to an append-only `ErrorReporter`; broken invariants of the
//! checker itself abort the run with an `InternalError`.

pub mod abi;
pub mod annotations;
pub mod calls;
pub mod contracts;
pub mod declarations;
pub mod expressions;
pub mod members;
pub mod rational;
pub mod statements;
pub mod storage;
pub mod type_checker;
pub mod types;
pub mod variables;

#[cfg(test)]
mod tests;
