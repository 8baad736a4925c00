use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{config::AbiCoderVersion, Span};

use super::declarations::{ContractDefinition, FunctionDefinition, StructDefinition, UsingForDirective};

/// Stable node identity assigned by the parser.
///
/// Negative ids are reserved for the global magic declarations (`msg`, `abi`,
/// `require`, ...), see `ast::globals::GLOBAL_LOOKUP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl NodeId {
    pub fn is_magic(&self) -> bool {
        self.0 < 0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single parsed and name-linked source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    pub id: NodeId,
    #[serde(default)]
    pub path: String,
    /// `pragma abicoder v1|v2;` when present in the file.
    #[serde(default)]
    pub abi_coder: Option<AbiCoderVersion>,
    pub nodes: Vec<SourceUnitPart>,
    #[serde(default)]
    pub span: Span,
}

impl SourceUnit {
    pub fn contracts(&self) -> impl Iterator<Item = &ContractDefinition> {
        self.nodes.iter().filter_map(|node| match node {
            SourceUnitPart::Contract(contract) => Some(contract),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum SourceUnitPart {
    Contract(ContractDefinition),
    Struct(StructDefinition),
    Function(FunctionDefinition),
    UsingFor(UsingForDirective),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Default,
    Private,
    Internal,
    Public,
    External,
}

impl Visibility {
    pub fn is_externally_visible(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::External)
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Visibility::Default => "default",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
            Visibility::External => "external",
        };
        write!(f, "{}", name)
    }
}

/// Ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Display for StateMutability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        };
        write!(f, "{}", name)
    }
}

/// Data location as written in the source (`storage`, `memory`, `calldata`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLocationKeyword {
    Default,
    Storage,
    Memory,
    Calldata,
}

impl Display for DataLocationKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataLocationKeyword::Default => "none",
            DataLocationKeyword::Storage => "storage",
            DataLocationKeyword::Memory => "memory",
            DataLocationKeyword::Calldata => "calldata",
        };
        write!(f, "{}", name)
    }
}

/// Reference to a declaration by a (possibly qualified) path, e.g. `A.B`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierPath {
    pub id: NodeId,
    pub path: Vec<String>,
    #[serde(default)]
    pub referenced_declaration: Option<NodeId>,
    #[serde(default)]
    pub span: Span,
}

impl IdentifierPath {
    pub fn name(&self) -> String {
        self.path.join(".")
    }
}
