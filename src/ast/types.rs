//! Type names as written in the source.
//!
//! These are syntactic: `uint`, `mapping(address => uint)`, `S[3]`. The type
//! checker turns them into semantic `Type`s (see `type_checker::types`).

use serde::{Deserialize, Serialize};

use crate::Span;

use super::{
    ast::{IdentifierPath, NodeId, StateMutability, Visibility},
    declarations::VariableDeclaration,
    expressions::Expression,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeName {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: TypeNameKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum TypeNameKind {
    Elementary(ElementaryTypeName),
    UserDefined(UserDefinedTypeName),
    Mapping(MappingTypeName),
    Array(ArrayTypeName),
    Function(FunctionTypeName),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementaryTypeName {
    pub name: String,
    #[serde(default)]
    pub payable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDefinedTypeName {
    pub path: IdentifierPath,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingTypeName {
    pub key_type: Box<TypeName>,
    pub value_type: Box<TypeName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayTypeName {
    pub base_type: Box<TypeName>,
    #[serde(default)]
    pub length: Option<Box<Expression>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionTypeName {
    #[serde(default)]
    pub parameter_types: Vec<VariableDeclaration>,
    #[serde(default)]
    pub return_parameter_types: Vec<VariableDeclaration>,
    pub visibility: Visibility,
    pub state_mutability: StateMutability,
}
