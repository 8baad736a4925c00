//! Diagnostics produced by the type checker.
//!
//! This module defines:
//!
//! - `ErrorImpl`, one variant per user-facing diagnostic, with solc-style messages
//! - `ErrorCategory` and `Severity` used to classify them
//! - `ErrorReporter`, the append-only diagnostic sink
//! - `InternalError`, fatal violations of the checker's own invariants

pub mod errors;

#[cfg(test)]
mod tests;
