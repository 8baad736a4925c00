//! Global (magic) declarations.
//!
//! The name resolver links identifiers such as `msg`, `abi` or `require` to
//! these fixed negative ids; overloaded builtins (`require`, `revert`) get one
//! id per overload.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::ast::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalKind {
    Abi,
    Block,
    Message,
    Transaction,
    This,
    Super,
    MetaType,
    Require,
    RequireWithMessage,
    Assert,
    Revert,
    RevertWithMessage,
    Keccak256,
    Sha256,
    Ripemd160,
    Ecrecover,
    AddMod,
    MulMod,
    GasLeft,
    BlockHash,
    Selfdestruct,
}

#[derive(Debug, Clone, Copy)]
pub struct GlobalDeclaration {
    pub id: NodeId,
    pub name: &'static str,
    pub kind: GlobalKind,
}

const GLOBALS: &[GlobalDeclaration] = &[
    GlobalDeclaration { id: NodeId(-1), name: "abi", kind: GlobalKind::Abi },
    GlobalDeclaration { id: NodeId(-2), name: "addmod", kind: GlobalKind::AddMod },
    GlobalDeclaration { id: NodeId(-3), name: "assert", kind: GlobalKind::Assert },
    GlobalDeclaration { id: NodeId(-4), name: "block", kind: GlobalKind::Block },
    GlobalDeclaration { id: NodeId(-5), name: "blockhash", kind: GlobalKind::BlockHash },
    GlobalDeclaration { id: NodeId(-6), name: "ecrecover", kind: GlobalKind::Ecrecover },
    GlobalDeclaration { id: NodeId(-7), name: "gasleft", kind: GlobalKind::GasLeft },
    GlobalDeclaration { id: NodeId(-8), name: "keccak256", kind: GlobalKind::Keccak256 },
    GlobalDeclaration { id: NodeId(-15), name: "msg", kind: GlobalKind::Message },
    GlobalDeclaration { id: NodeId(-16), name: "mulmod", kind: GlobalKind::MulMod },
    GlobalDeclaration { id: NodeId(-18), name: "require", kind: GlobalKind::Require },
    GlobalDeclaration { id: NodeId(-19), name: "require", kind: GlobalKind::RequireWithMessage },
    GlobalDeclaration { id: NodeId(-20), name: "revert", kind: GlobalKind::Revert },
    GlobalDeclaration { id: NodeId(-21), name: "revert", kind: GlobalKind::RevertWithMessage },
    GlobalDeclaration { id: NodeId(-22), name: "ripemd160", kind: GlobalKind::Ripemd160 },
    GlobalDeclaration { id: NodeId(-23), name: "selfdestruct", kind: GlobalKind::Selfdestruct },
    GlobalDeclaration { id: NodeId(-24), name: "sha256", kind: GlobalKind::Sha256 },
    GlobalDeclaration { id: NodeId(-26), name: "tx", kind: GlobalKind::Transaction },
    GlobalDeclaration { id: NodeId(-27), name: "type", kind: GlobalKind::MetaType },
    GlobalDeclaration { id: NodeId(-28), name: "this", kind: GlobalKind::This },
    GlobalDeclaration { id: NodeId(-29), name: "super", kind: GlobalKind::Super },
];

lazy_static! {
    pub static ref GLOBAL_LOOKUP: HashMap<NodeId, GlobalDeclaration> =
        GLOBALS.iter().map(|global| (global.id, *global)).collect();
    pub static ref GLOBAL_NAME_LOOKUP: HashMap<&'static str, Vec<NodeId>> = {
        let mut map: HashMap<&'static str, Vec<NodeId>> = HashMap::new();
        for global in GLOBALS {
            map.entry(global.name).or_default().push(global.id);
        }
        map
    };
}

pub fn global_declaration(id: NodeId) -> Option<&'static GlobalDeclaration> {
    GLOBAL_LOOKUP.get(&id)
}

/// Ids a name resolver would attach to a reference to the global `name`.
pub fn global_ids(name: &str) -> Vec<NodeId> {
    GLOBAL_NAME_LOOKUP.get(name).cloned().unwrap_or_default()
}
