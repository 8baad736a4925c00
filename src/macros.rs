//! Utility macros for building AST nodes.
//!
//! - `MK_EXPR!` - Creates an Expression with a fresh id from a builder
//! - `MK_STMT!` - Creates a Statement with a fresh id from a builder
//! - `MK_TYPE_NAME!` - Creates a TypeName with a fresh id from a builder
//!
//! These macros reduce boilerplate in `ast::builder` and in tests.

/// Creates an Expression node.
///
/// # Arguments
///
/// * `$builder` - An `AstBuilder` used to allocate the id and span
/// * `$kind` - The ExprKind
///
/// # Example
///
/// ```ignore
/// let expr = MK_EXPR!(builder, ExprKind::Await(AwaitExpr { expression: Box::new(handle) }));
/// ```
#[macro_export]
macro_rules! MK_EXPR {
    ($builder:expr, $kind:expr) => {{
        let (id, span) = $builder.allocate();
        $crate::ast::expressions::Expression { id, kind: $kind, span }
    }};
}

/// Creates a Statement node.
///
/// # Example
///
/// ```ignore
/// let stmt = MK_STMT!(builder, StmtKind::Break);
/// ```
#[macro_export]
macro_rules! MK_STMT {
    ($builder:expr, $kind:expr) => {{
        let (id, span) = $builder.allocate();
        $crate::ast::statements::Statement { id, kind: $kind, span }
    }};
}

/// Creates a TypeName node.
#[macro_export]
macro_rules! MK_TYPE_NAME {
    ($builder:expr, $kind:expr) => {{
        let (id, span) = $builder.allocate();
        $crate::ast::types::TypeName { id, kind: $kind, span }
    }};
}
