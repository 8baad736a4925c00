//! Write-once type annotations keyed by node id.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    ast::{ast::NodeId, declarations::VariableDeclaration, expressions::Expression},
    errors::errors::InternalError,
};

use super::types::Type;

/// The output of a run: one type per visited expression and per variable
/// declaration. Outlives the checker that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeAnnotations {
    expressions: BTreeMap<NodeId, Type>,
    variables: BTreeMap<NodeId, Type>,
}

impl TypeAnnotations {
    pub fn new() -> Self {
        TypeAnnotations::default()
    }

    pub fn annotate_expression(&mut self, node: NodeId, type_: Type) -> Result<(), InternalError> {
        tracing::trace!(%node, type_ = %type_, "annotate expression");
        if self.expressions.insert(node, type_).is_some() {
            return Err(InternalError::AnnotationRewritten { node });
        }
        Ok(())
    }

    pub fn annotate_variable(&mut self, node: NodeId, type_: Type) -> Result<(), InternalError> {
        tracing::trace!(%node, type_ = %type_, "annotate variable");
        if self.variables.insert(node, type_).is_some() {
            return Err(InternalError::AnnotationRewritten { node });
        }
        Ok(())
    }

    /// # Panics
    ///
    /// When `expression` was never visited by the checker.
    pub fn type_of(&self, expression: &Expression) -> &Type {
        match self.expressions.get(&expression.id) {
            Some(type_) => type_,
            None => panic!("{}", InternalError::MissingAnnotation { node: expression.id }),
        }
    }

    /// # Panics
    ///
    /// When `variable` was never visited by the checker.
    pub fn type_of_variable(&self, variable: &VariableDeclaration) -> &Type {
        match self.variables.get(&variable.id) {
            Some(type_) => type_,
            None => panic!("{}", InternalError::MissingAnnotation { node: variable.id }),
        }
    }

    pub fn try_type_of(&self, expression: &Expression) -> Option<&Type> {
        self.expressions.get(&expression.id)
    }

    pub fn try_type_of_variable(&self, variable: &VariableDeclaration) -> Option<&Type> {
        self.variables.get(&variable.id)
    }

    pub fn expression_type(&self, node: NodeId) -> Option<&Type> {
        self.expressions.get(&node)
    }

    pub fn variable_type(&self, node: NodeId) -> Option<&Type> {
        self.variables.get(&node)
    }

    pub fn expressions(&self) -> impl Iterator<Item = (&NodeId, &Type)> {
        self.expressions.iter()
    }

    pub fn variables(&self) -> impl Iterator<Item = (&NodeId, &Type)> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.expressions.len() + self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty() && self.variables.is_empty()
    }
}
