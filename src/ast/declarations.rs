//! Declaration nodes: contracts and everything that can live inside them.

use serde::{Deserialize, Serialize};

use crate::Span;

use super::{
    ast::{DataLocationKeyword, IdentifierPath, NodeId, StateMutability, Visibility},
    expressions::Expression,
    statements::Block,
    types::TypeName,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub id: NodeId,
    pub name: String,
    pub kind: ContractKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub base_contracts: Vec<InheritanceSpecifier>,
    /// C3 linearization computed by the name resolver, most derived first
    /// (the contract itself included). May be empty if the resolver could not
    /// linearize the hierarchy.
    #[serde(default)]
    pub linearized_base_contracts: Vec<NodeId>,
    pub nodes: Vec<ContractPart>,
    #[serde(default)]
    pub span: Span,
}

impl ContractDefinition {
    pub fn is_library(&self) -> bool {
        self.kind == ContractKind::Library
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ContractKind::Interface
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.nodes.iter().filter_map(|part| match part {
            ContractPart::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn state_variables(&self) -> impl Iterator<Item = &VariableDeclaration> {
        self.nodes.iter().filter_map(|part| match part {
            ContractPart::StateVariable(variable) => Some(variable),
            _ => None,
        })
    }

    pub fn constructor(&self) -> Option<&FunctionDefinition> {
        self.functions().find(|function| function.kind == FunctionKind::Constructor)
    }

    pub fn using_for_directives(&self) -> impl Iterator<Item = &UsingForDirective> {
        self.nodes.iter().filter_map(|part| match part {
            ContractPart::UsingFor(directive) => Some(directive),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum ContractPart {
    Function(FunctionDefinition),
    StateVariable(VariableDeclaration),
    Event(EventDefinition),
    Message(MessageDefinition),
    Modifier(ModifierDefinition),
    Struct(StructDefinition),
    UsingFor(UsingForDirective),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceSpecifier {
    pub id: NodeId,
    pub base_name: IdentifierPath,
    /// `None` when written without parentheses, `Some(vec![])` for `Base()`.
    #[serde(default)]
    pub arguments: Option<Vec<Expression>>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Function,
    Constructor,
    Fallback,
    Receive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub state_mutability: StateMutability,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub return_parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub modifiers: Vec<ModifierInvocation>,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

impl FunctionDefinition {
    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    pub fn is_implemented(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierInvocation {
    pub id: NodeId,
    pub modifier_name: IdentifierPath,
    #[serde(default)]
    pub arguments: Option<Vec<Expression>>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierDefinition {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub span: Span,
}

/// Asynchronous message declared by a contract. Sending one to a contract
/// instance yields a message handle that can be awaited for `return_parameters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDefinition {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub return_parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDefinition {
    pub id: NodeId,
    pub name: String,
    pub members: Vec<VariableDeclaration>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableMutability {
    Mutable,
    Constant,
    Immutable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: String,
    /// Absent only for the upstream-inferred loop variables of older dialects;
    /// the checker reports a missing type.
    #[serde(default)]
    pub type_name: Option<TypeName>,
    #[serde(default)]
    pub value: Option<Expression>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default = "default_mutability")]
    pub mutability: VariableMutability,
    #[serde(default = "default_location")]
    pub location: DataLocationKeyword,
    #[serde(default)]
    pub is_state_variable: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub span: Span,
}

fn default_visibility() -> Visibility {
    Visibility::Internal
}

fn default_mutability() -> VariableMutability {
    VariableMutability::Mutable
}

fn default_location() -> DataLocationKeyword {
    DataLocationKeyword::Default
}

impl VariableDeclaration {
    pub fn is_constant(&self) -> bool {
        self.mutability == VariableMutability::Constant
    }

    pub fn is_immutable(&self) -> bool {
        self.mutability == VariableMutability::Immutable
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsingForDirective {
    pub id: NodeId,
    pub library_name: IdentifierPath,
    /// `None` for `using L for *;`
    #[serde(default)]
    pub type_name: Option<TypeName>,
    #[serde(default)]
    pub span: Span,
}
