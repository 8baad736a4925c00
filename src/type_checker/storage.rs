//! Overlapping storage writes in tuple assignments.
//!
//! `(s.a, s) = (1, t)` writes `s.a` and then overwrites all of `s`; which
//! value survives depends on the order in which the components are stored.

use crate::{
    ast::{
        ast::NodeId,
        expressions::{ExprKind, Expression},
    },
    errors::errors::{ErrorImpl, InternalError},
};

use super::{
    declarations::DeclarationKind,
    rational::Rational,
    type_checker::TypeChecker,
    types::{DataLocation, Type},
};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Member(String),
    /// `None` when the index is not a compile-time constant.
    Index(Option<Rational>),
}

impl Segment {
    fn may_alias(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Member(a), Segment::Member(b)) => a == b,
            (Segment::Index(Some(a)), Segment::Index(Some(b))) => a == b,
            (Segment::Index(_), Segment::Index(_)) => true,
            _ => false,
        }
    }
}

/// A storage location written by one tuple component, e.g. `s.items[2].x`.
#[derive(Debug)]
struct StoragePath {
    root: NodeId,
    segments: Vec<Segment>,
}

impl StoragePath {
    fn is_prefix_of(&self, other: &StoragePath) -> bool {
        self.root == other.root
            && self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.may_alias(b))
    }
}

pub fn check_double_storage_assignment(
    checker: &mut TypeChecker,
    assignment: &Expression,
    left: &Expression,
    right_type: &Type,
) -> Result<(), InternalError> {
    let ExprKind::Tuple(tuple) = &left.kind else {
        return Ok(());
    };
    let right_components: Vec<Option<Type>> = match right_type {
        Type::Tuple(components) => components.clone(),
        other => vec![Some(other.clone())],
    };

    let mut paths = vec![];
    let mut to_storage_copies = 0;
    let mut storage_to_storage_copies = 0;
    for (index, component) in tuple.components.iter().enumerate() {
        let Some(component) = component else {
            continue;
        };
        let type_ = checker
            .annotations
            .try_type_of(component)
            .ok_or(InternalError::MissingAnnotation { node: component.id })?;
        if type_.is_storage_reference() {
            to_storage_copies += 1;
            let from_storage = right_components
                .get(index)
                .and_then(Option::as_ref)
                .is_some_and(|source| source.data_location() == Some(DataLocation::Storage));
            if from_storage {
                storage_to_storage_copies += 1;
            }
        }
        if let Some(path) = storage_path(checker, component)? {
            paths.push(path);
        }
    }

    let overlapping = paths.iter().enumerate().any(|(i, a)| {
        paths
            .iter()
            .enumerate()
            .any(|(j, b)| i != j && a.is_prefix_of(b))
    });
    let copies_interfere = to_storage_copies >= 2 && storage_to_storage_copies >= 1;
    if overlapping || copies_interfere {
        tracing::debug!(node = %assignment.id, overlapping, copies_interfere, "double storage assignment");
        checker.record_warning(ErrorImpl::DoubleStorageAssignment, &assignment.span);
    }
    Ok(())
}

/// Path of `expression` if it is rooted at a state variable or a storage
/// pointer.
fn storage_path(checker: &TypeChecker, expression: &Expression) -> Result<Option<StoragePath>, InternalError> {
    let mut segments = vec![];
    let mut current = expression;
    loop {
        match &current.kind {
            ExprKind::MemberAccess(member) => {
                segments.push(Segment::Member(member.member_name.clone()));
                current = &member.expression;
            }
            ExprKind::IndexAccess(index) => {
                let value = match &index.index {
                    Some(index) => checker.evaluate_constant(index)?,
                    None => None,
                };
                segments.push(Segment::Index(value));
                current = &index.base;
            }
            ExprKind::Tuple(tuple) if !tuple.is_inline_array && tuple.components.len() == 1 => {
                match &tuple.components[0] {
                    Some(inner) => current = inner,
                    None => return Ok(None),
                }
            }
            ExprKind::Identifier(identifier) => {
                let Some(id) = identifier.referenced_declaration else {
                    return Ok(None);
                };
                let Some(declaration) = checker.declarations.lookup(id) else {
                    return Ok(None);
                };
                let DeclarationKind::Variable(variable) = declaration.kind else {
                    return Ok(None);
                };
                let rooted_in_storage = (variable.is_state_variable && !variable.is_constant() && !variable.is_immutable())
                    || checker
                        .annotations
                        .try_type_of(current)
                        .is_some_and(|type_| type_.is_storage_pointer());
                if !rooted_in_storage {
                    return Ok(None);
                }
                segments.reverse();
                return Ok(Some(StoragePath { root: id, segments }));
            }
            _ => return Ok(None),
        }
    }
}
