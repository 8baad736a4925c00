use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Span;

use super::{ast::NodeId, types::TypeName};

/// Expression node. The checker annotates every visited expression by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum ExprKind {
    Identifier(Identifier),
    ElementaryTypeName(ElementaryTypeNameExpr),
    Literal(Literal),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Assignment(AssignmentExpr),
    Conditional(ConditionalExpr),
    Tuple(TupleExpr),
    FunctionCall(FunctionCallExpr),
    CallOptions(CallOptionsExpr),
    New(NewExpr),
    Await(AwaitExpr),
    MemberAccess(MemberAccessExpr),
    IndexAccess(IndexAccessExpr),
    IndexRangeAccess(IndexRangeAccessExpr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    /// Declaration chosen by the name resolver, when unique.
    #[serde(default)]
    pub referenced_declaration: Option<NodeId>,
    /// All same-named candidates when the name is overloaded.
    #[serde(default)]
    pub overloaded_declarations: Vec<NodeId>,
}

/// An elementary type used as an expression, e.g. `uint8(x)` or `payable(a)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementaryTypeNameExpr {
    pub name: String,
    #[serde(default)]
    pub payable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralKind {
    Number,
    Bool,
    String,
    HexString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubDenomination {
    Wei,
    Gwei,
    Ether,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl SubDenomination {
    pub fn multiplier(&self) -> u64 {
        match self {
            SubDenomination::Wei | SubDenomination::Seconds => 1,
            SubDenomination::Gwei => 1_000_000_000,
            SubDenomination::Ether => 1_000_000_000_000_000_000,
            SubDenomination::Minutes => 60,
            SubDenomination::Hours => 3_600,
            SubDenomination::Days => 86_400,
            SubDenomination::Weeks => 604_800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Source text of the literal; for strings the unescaped contents, for hex
    /// strings the hex digits.
    pub value: String,
    #[serde(default)]
    pub sub_denomination: Option<SubDenomination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "-")]
    Negate,
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
    #[serde(rename = "delete")]
    Delete,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Negate => "-",
            UnaryOperator::Increment => "++",
            UnaryOperator::Decrement => "--",
            UnaryOperator::Delete => "delete",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    #[serde(default = "default_prefix")]
    pub prefix: bool,
    pub sub_expression: Box<Expression>,
}

fn default_prefix() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Exp,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterEqual,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Less
                | BinaryOperator::LessEqual
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEqual
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOperator::Shl | BinaryOperator::Shr)
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, BinaryOperator::BitAnd | BinaryOperator::BitOr | BinaryOperator::BitXor)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod
        )
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Exp => "**",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

/// `=` when `operator` is `None`, otherwise the compound form (`+=`, `<<=`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentExpr {
    #[serde(default)]
    pub operator: Option<BinaryOperator>,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl AssignmentExpr {
    pub fn operator_symbol(&self) -> String {
        match self.operator {
            Some(operator) => format!("{}=", operator),
            None => String::from("="),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub true_expression: Box<Expression>,
    pub false_expression: Box<Expression>,
}

/// Parenthesised tuple `(a, , b)` or inline array `[a, b]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TupleExpr {
    pub components: Vec<Option<Expression>>,
    #[serde(default)]
    pub is_inline_array: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallExpr {
    pub expression: Box<Expression>,
    pub arguments: Vec<Expression>,
    /// Parameter names for `f({a: 1, b: 2})`; empty for positional calls.
    #[serde(default)]
    pub names: Vec<String>,
}

/// `f{value: 1, gas: 2}`: options attached to a callee before the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOptionsExpr {
    pub expression: Box<Expression>,
    pub names: Vec<String>,
    pub options: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpr {
    pub type_name: TypeName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwaitExpr {
    pub expression: Box<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAccessExpr {
    pub expression: Box<Expression>,
    pub member_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexAccessExpr {
    pub base: Box<Expression>,
    #[serde(default)]
    pub index: Option<Box<Expression>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRangeAccessExpr {
    pub base: Box<Expression>,
    #[serde(default)]
    pub start: Option<Box<Expression>>,
    #[serde(default)]
    pub end: Option<Box<Expression>>,
}
