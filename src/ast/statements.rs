use std::slice::Iter;

use serde::{Deserialize, Serialize};

use crate::Span;

use super::{ast::NodeId, declarations::VariableDeclaration, expressions::Expression};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: StmtKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum StmtKind {
    Block(Block),
    /// `_;` inside a modifier body.
    Placeholder,
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Continue,
    Break,
    Return(ReturnStmt),
    Emit(EmitStmt),
    VariableDeclaration(VariableDeclarationStmt),
    Expression(ExpressionStmt),
    Try(TryStmt),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Serialized as `blockId` and `blockSpan`; a block statement already
    /// carries an `id` and a `span`.
    #[serde(rename = "blockId")]
    pub id: NodeId,
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub unchecked: bool,
    #[serde(default, rename = "blockSpan")]
    pub span: Span,
}

impl Block {
    pub fn iter(&self) -> Iter<'_, Statement> {
        self.statements.iter()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expression,
    pub true_body: Box<Statement>,
    #[serde(default)]
    pub false_body: Option<Box<Statement>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: Box<Statement>,
    #[serde(default)]
    pub is_do_while: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStmt {
    #[serde(default)]
    pub initialization: Option<Box<Statement>>,
    #[serde(default)]
    pub condition: Option<Expression>,
    #[serde(default)]
    pub loop_expression: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStmt {
    #[serde(default)]
    pub expression: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitStmt {
    pub event_call: Expression,
}

/// `uint a = 1;` or `(uint a, , bool c) = f();`. Skipped tuple slots are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclarationStmt {
    pub declarations: Vec<Option<VariableDeclaration>>,
    #[serde(default)]
    pub initial_value: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionStmt {
    pub expression: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryStmt {
    pub external_call: Expression,
    pub clauses: Vec<TryCatchClause>,
}

/// The first clause is the success clause (`returns (...)`), the rest are
/// `catch` clauses identified by `error_name` (`""`, `Error`, `Panic`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryCatchClause {
    pub id: NodeId,
    #[serde(default)]
    pub error_name: String,
    #[serde(default)]
    pub parameters: Option<Vec<VariableDeclaration>>,
    pub block: Block,
    #[serde(default)]
    pub span: Span,
}
