/// AST (Abstract Syntax Tree) module
/// Contains the name-linked tree the checker consumes
///
/// Submodules:
/// - ast: Node ids, source units and shared enums
/// - declarations: Contracts, functions, variables and other declarations
/// - expressions: Definitions for various expression types
/// - statements: Definitions for various statement types
/// - types: Type names as written in the source
/// - globals: Builtin declarations with reserved ids
/// - builder: Programmatic construction with fresh ids
pub mod ast;
pub mod builder;
pub mod declarations;
pub mod expressions;
pub mod globals;
pub mod statements;
pub mod types;

#[cfg(test)]
mod tests;
