//! ABI coder compatibility.
//!
//! Two generations of encoding rules exist. The legacy encoder cannot handle
//! nested dynamic data; the strict (v2) rules only exclude types that have no
//! ABI representation at all.

use std::collections::HashSet;

use crate::ast::ast::NodeId;

use super::types::{CallKind, DataLocation, Type};

/// Access to struct member types, which the types themselves only reference
/// by declaration id.
pub trait StructMembers {
    fn member_types(&self, id: NodeId) -> Vec<Type>;
}

/// Whether `type_` can be passed through the legacy encoder. Storage data
/// handed to a library is passed by reference and always accepted.
pub fn type_supported_by_legacy_encoder(type_: &Type, is_library_call: bool, structs: &impl StructMembers) -> bool {
    if is_library_call && type_.data_location() == Some(DataLocation::Storage) {
        return true;
    }
    match type_ {
        Type::Struct(structure) => structs
            .member_types(structure.id)
            .iter()
            .all(|member| !is_dynamically_encoded(member, structs) && type_supported_by_legacy_encoder(member, false, structs)),
        Type::Array(array) if !array.is_byte_array() => {
            let base = array.base_type();
            type_supported_by_legacy_encoder(&base, false, structs) && !is_dynamically_encoded(&base, structs)
        }
        _ => true,
    }
}

/// Dynamic arrays, `bytes`, `string` and anything containing them.
pub fn is_dynamically_encoded(type_: &Type, structs: &impl StructMembers) -> bool {
    let mut visiting = HashSet::new();
    dynamically_encoded(type_, structs, &mut visiting)
}

fn dynamically_encoded(type_: &Type, structs: &impl StructMembers, visiting: &mut HashSet<NodeId>) -> bool {
    match type_ {
        Type::Array(array) => {
            array.length.is_none() || dynamically_encoded(&array.base_type(), structs, visiting)
        }
        Type::Struct(structure) => {
            if !visiting.insert(structure.id) {
                return false;
            }
            let dynamic = structs
                .member_types(structure.id)
                .iter()
                .any(|member| dynamically_encoded(member, structs, visiting));
            visiting.remove(&structure.id);
            dynamic
        }
        _ => false,
    }
}

/// Whether `type_` has an ABI representation under the strict rules.
pub fn abi_encodable(type_: &Type, structs: &impl StructMembers) -> bool {
    match type_ {
        Type::Invalid => true,
        Type::Integer { .. }
        | Type::Bool
        | Type::Address { .. }
        | Type::FixedBytes(_)
        | Type::Contract(_)
        | Type::StringLiteral(_) => true,
        Type::RationalNumber(_) => type_.mobile_type().is_some(),
        Type::Function(function) => function.kind == CallKind::External,
        Type::Array(array) => array.is_byte_array() || abi_encodable(&array.base_type(), structs),
        Type::Struct(structure) => {
            !is_recursive_struct(structure.id, structs)
                && structs
                    .member_types(structure.id)
                    .iter()
                    .all(|member| abi_encodable(member, structs))
        }
        Type::Mapping(..)
        | Type::Tuple(_)
        | Type::TypeType(_)
        | Type::Magic(_)
        | Type::Modifier(_)
        | Type::MessageHandle(_)
        | Type::Overloaded(_) => false,
    }
}

/// A struct that reaches itself through its members.
pub fn is_recursive_struct(id: NodeId, structs: &impl StructMembers) -> bool {
    let mut visited = HashSet::new();
    let mut pending: Vec<Type> = structs.member_types(id);
    while let Some(member) = pending.pop() {
        match member {
            Type::Struct(structure) => {
                if structure.id == id {
                    return true;
                }
                if visited.insert(structure.id) {
                    pending.extend(structs.member_types(structure.id));
                }
            }
            Type::Array(array) if !array.is_byte_array() => pending.push(array.base_type()),
            _ => {}
        }
    }
    false
}

/// A struct reaching itself without a dynamic array in between has infinite
/// size.
pub fn has_infinite_size(id: NodeId, structs: &impl StructMembers) -> bool {
    let mut visited = HashSet::new();
    let mut pending: Vec<Type> = structs.member_types(id);
    while let Some(member) = pending.pop() {
        match member {
            Type::Struct(structure) => {
                if structure.id == id {
                    return true;
                }
                if visited.insert(structure.id) {
                    pending.extend(structs.member_types(structure.id));
                }
            }
            Type::Array(array) if !array.is_byte_array() && array.length.is_some() => pending.push(array.base_type()),
            _ => {}
        }
    }
    false
}

/// Mappings anywhere inside `type_`, looking through structs and arrays.
pub fn contains_mapping(type_: &Type, structs: &impl StructMembers) -> bool {
    let mut visited = HashSet::new();
    let mut pending = vec![type_.clone()];
    while let Some(current) = pending.pop() {
        match current {
            Type::Mapping(..) => return true,
            Type::Struct(structure) => {
                if visited.insert(structure.id) {
                    pending.extend(structs.member_types(structure.id));
                }
            }
            Type::Array(array) if !array.is_byte_array() => pending.push(array.base_type()),
            _ => {}
        }
    }
    false
}
