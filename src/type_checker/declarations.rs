//! Declaration table and reference resolution.
//!
//! The table is built in one pre-pass over the whole source unit, before any
//! body is checked, so that references to members declared further down the
//! file resolve. Lookups of references that the upstream name resolver left
//! empty are user errors; ids that point nowhere are internal errors.

use std::collections::{HashMap, HashSet};

use crate::{
    ast::{
        ast::{IdentifierPath, NodeId, SourceUnit, SourceUnitPart, StateMutability, Visibility},
        declarations::{
            ContractDefinition, ContractPart, EventDefinition, FunctionDefinition, FunctionKind, MessageDefinition,
            ModifierDefinition, ModifierInvocation, StructDefinition, VariableDeclaration,
        },
        expressions::{ExprKind, Expression},
        globals::{global_declaration, GlobalDeclaration},
        statements::{Block, Statement, StmtKind},
        types::{TypeName, TypeNameKind},
    },
    errors::errors::{ErrorImpl, InternalError},
    Span,
};

use super::{
    calls::{check_call_arguments, CallArguments},
    type_checker::TypeChecker,
    types::{same_function_signature, Type},
};

#[derive(Debug, Clone, Copy)]
pub enum DeclarationKind<'a> {
    Contract(&'a ContractDefinition),
    Function(&'a FunctionDefinition),
    Modifier(&'a ModifierDefinition),
    Event(&'a EventDefinition),
    Message(&'a MessageDefinition),
    Struct(&'a StructDefinition),
    Variable(&'a VariableDeclaration),
    Magic(&'static GlobalDeclaration),
}

#[derive(Debug, Clone, Copy)]
pub struct Declaration<'a> {
    pub kind: DeclarationKind<'a>,
    /// Contract the declaration lives in, `None` at file level.
    pub scope: Option<NodeId>,
}

impl<'a> Declaration<'a> {
    pub fn name(&self) -> &str {
        match self.kind {
            DeclarationKind::Contract(contract) => &contract.name,
            DeclarationKind::Function(function) => &function.name,
            DeclarationKind::Modifier(modifier) => &modifier.name,
            DeclarationKind::Event(event) => &event.name,
            DeclarationKind::Message(message) => &message.name,
            DeclarationKind::Struct(structure) => &structure.name,
            DeclarationKind::Variable(variable) => &variable.name,
            DeclarationKind::Magic(global) => global.name,
        }
    }
}

#[derive(Debug, Default)]
pub struct DeclarationTable<'a> {
    declarations: HashMap<NodeId, Declaration<'a>>,
    contracts: Vec<&'a ContractDefinition>,
}

impl<'a> DeclarationTable<'a> {
    pub fn build(source: &'a SourceUnit) -> Self {
        let mut table = DeclarationTable::default();
        for part in &source.nodes {
            match part {
                SourceUnitPart::Contract(contract) => table.register_contract(contract),
                SourceUnitPart::Struct(structure) => table.register_struct(structure, None),
                SourceUnitPart::Function(function) => table.register_function(function, None),
                SourceUnitPart::UsingFor(_) => {}
            }
        }
        tracing::debug!(declarations = table.declarations.len(), "declaration table built");
        table
    }

    fn insert(&mut self, id: NodeId, kind: DeclarationKind<'a>, scope: Option<NodeId>) {
        self.declarations.insert(id, Declaration { kind, scope });
    }

    fn register_contract(&mut self, contract: &'a ContractDefinition) {
        self.insert(contract.id, DeclarationKind::Contract(contract), None);
        self.contracts.push(contract);
        let scope = Some(contract.id);
        for part in &contract.nodes {
            match part {
                ContractPart::Function(function) => self.register_function(function, scope),
                ContractPart::StateVariable(variable) => self.register_variable(variable, scope),
                ContractPart::Event(event) => {
                    self.insert(event.id, DeclarationKind::Event(event), scope);
                    event.parameters.iter().for_each(|p| self.register_variable(p, scope));
                }
                ContractPart::Message(message) => {
                    self.insert(message.id, DeclarationKind::Message(message), scope);
                    message.parameters.iter().for_each(|p| self.register_variable(p, scope));
                    message.return_parameters.iter().for_each(|p| self.register_variable(p, scope));
                }
                ContractPart::Modifier(modifier) => {
                    self.insert(modifier.id, DeclarationKind::Modifier(modifier), scope);
                    modifier.parameters.iter().for_each(|p| self.register_variable(p, scope));
                    if let Some(body) = &modifier.body {
                        self.register_block(body, scope);
                    }
                }
                ContractPart::Struct(structure) => self.register_struct(structure, scope),
                ContractPart::UsingFor(_) => {}
            }
        }
    }

    fn register_struct(&mut self, structure: &'a StructDefinition, scope: Option<NodeId>) {
        self.insert(structure.id, DeclarationKind::Struct(structure), scope);
        structure.members.iter().for_each(|member| self.register_variable(member, scope));
    }

    fn register_function(&mut self, function: &'a FunctionDefinition, scope: Option<NodeId>) {
        self.insert(function.id, DeclarationKind::Function(function), scope);
        function.parameters.iter().for_each(|p| self.register_variable(p, scope));
        function.return_parameters.iter().for_each(|p| self.register_variable(p, scope));
        if let Some(body) = &function.body {
            self.register_block(body, scope);
        }
    }

    fn register_variable(&mut self, variable: &'a VariableDeclaration, scope: Option<NodeId>) {
        self.insert(variable.id, DeclarationKind::Variable(variable), scope);
        if let Some(type_name) = &variable.type_name {
            self.register_type_name(type_name, scope);
        }
    }

    fn register_type_name(&mut self, type_name: &'a TypeName, scope: Option<NodeId>) {
        match &type_name.kind {
            TypeNameKind::Function(function) => {
                function.parameter_types.iter().for_each(|p| self.register_variable(p, scope));
                function.return_parameter_types.iter().for_each(|p| self.register_variable(p, scope));
            }
            TypeNameKind::Mapping(mapping) => {
                self.register_type_name(&mapping.key_type, scope);
                self.register_type_name(&mapping.value_type, scope);
            }
            TypeNameKind::Array(array) => self.register_type_name(&array.base_type, scope),
            TypeNameKind::Elementary(_) | TypeNameKind::UserDefined(_) => {}
        }
    }

    fn register_block(&mut self, block: &'a Block, scope: Option<NodeId>) {
        block.iter().for_each(|statement| self.register_statement(statement, scope));
    }

    fn register_statement(&mut self, statement: &'a Statement, scope: Option<NodeId>) {
        match &statement.kind {
            StmtKind::Block(block) => self.register_block(block, scope),
            StmtKind::If(if_stmt) => {
                self.register_statement(&if_stmt.true_body, scope);
                if let Some(false_body) = &if_stmt.false_body {
                    self.register_statement(false_body, scope);
                }
            }
            StmtKind::While(while_stmt) => self.register_statement(&while_stmt.body, scope),
            StmtKind::For(for_stmt) => {
                if let Some(initialization) = &for_stmt.initialization {
                    self.register_statement(initialization, scope);
                }
                self.register_statement(&for_stmt.body, scope);
            }
            StmtKind::VariableDeclaration(declaration) => {
                declaration.declarations.iter().flatten().for_each(|v| self.register_variable(v, scope));
            }
            StmtKind::Try(try_stmt) => {
                for clause in &try_stmt.clauses {
                    if let Some(parameters) = &clause.parameters {
                        parameters.iter().for_each(|p| self.register_variable(p, scope));
                    }
                    self.register_block(&clause.block, scope);
                }
            }
            StmtKind::Placeholder
            | StmtKind::Continue
            | StmtKind::Break
            | StmtKind::Return(_)
            | StmtKind::Emit(_)
            | StmtKind::Expression(_) => {}
        }
    }

    pub fn lookup(&self, id: NodeId) -> Option<Declaration<'a>> {
        if id.is_magic() {
            return global_declaration(id).map(|global| Declaration {
                kind: DeclarationKind::Magic(global),
                scope: None,
            });
        }
        self.declarations.get(&id).copied()
    }

    pub fn contract(&self, id: NodeId) -> Option<&'a ContractDefinition> {
        match self.declarations.get(&id)?.kind {
            DeclarationKind::Contract(contract) => Some(contract),
            _ => None,
        }
    }

    pub fn structure(&self, id: NodeId) -> Option<(&'a StructDefinition, Option<NodeId>)> {
        let declaration = self.declarations.get(&id)?;
        match declaration.kind {
            DeclarationKind::Struct(structure) => Some((structure, declaration.scope)),
            _ => None,
        }
    }

    pub fn contracts(&self) -> &[&'a ContractDefinition] {
        &self.contracts
    }

    /// Direct bases as written in the inheritance list.
    pub fn direct_bases(&self, contract: &ContractDefinition) -> Vec<NodeId> {
        contract
            .base_contracts
            .iter()
            .filter_map(|base| base.base_name.referenced_declaration)
            .filter(|id| self.contract(*id).is_some())
            .collect()
    }

    /// Linearized bases, most derived first. Falls back to a depth-first
    /// order when the resolver did not provide a linearization.
    pub fn linearized_bases(&self, contract: &ContractDefinition) -> Vec<NodeId> {
        if !contract.linearized_base_contracts.is_empty() {
            return contract.linearized_base_contracts.clone();
        }
        let mut order = vec![];
        let mut seen = HashSet::new();
        self.collect_bases(contract, &mut order, &mut seen);
        order
    }

    fn collect_bases(&self, contract: &ContractDefinition, order: &mut Vec<NodeId>, seen: &mut HashSet<NodeId>) {
        if !seen.insert(contract.id) {
            return;
        }
        order.push(contract.id);
        for base in self.direct_bases(contract).into_iter().rev() {
            if let Some(base) = self.contract(base) {
                self.collect_bases(base, order, seen);
            }
        }
    }

    /// Contracts that can receive plain ether transfers.
    pub fn can_receive(&self, contract: &ContractDefinition) -> bool {
        self.linearized_bases(contract)
            .into_iter()
            .filter_map(|id| self.contract(id))
            .flat_map(|contract| contract.functions())
            .any(|function| {
                function.kind == FunctionKind::Receive
                    || (function.kind == FunctionKind::Fallback && function.state_mutability == StateMutability::Payable)
            })
    }

    /// Inheritance cycle reachable from `contract`, as the list of contracts on it.
    pub fn find_inheritance_cycle(&self, contract: &ContractDefinition) -> Option<Vec<NodeId>> {
        let mut path = vec![];
        let mut finished = HashSet::new();
        self.cycle_search(contract, &mut path, &mut finished)
    }

    fn cycle_search(
        &self,
        contract: &ContractDefinition,
        path: &mut Vec<NodeId>,
        finished: &mut HashSet<NodeId>,
    ) -> Option<Vec<NodeId>> {
        if let Some(index) = path.iter().position(|id| *id == contract.id) {
            return Some(path[index..].to_vec());
        }
        if finished.contains(&contract.id) {
            return None;
        }
        path.push(contract.id);
        for base in self.direct_bases(contract) {
            if let Some(base) = self.contract(base) {
                if let Some(cycle) = self.cycle_search(base, path, finished) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        finished.insert(contract.id);
        None
    }
}

/// A reference resolved to candidate declarations.
pub enum Resolved<'a> {
    /// The upstream resolver attached nothing; already reported.
    Unresolved,
    Declarations(Vec<(NodeId, Declaration<'a>)>),
}

impl<'a> TypeChecker<'a> {
    fn resolve_ids(&self, node: NodeId, ids: &[NodeId]) -> Result<Vec<(NodeId, Declaration<'a>)>, InternalError> {
        ids.iter()
            .map(|id| {
                self.declarations
                    .lookup(*id)
                    .map(|declaration| (*id, declaration))
                    .ok_or(InternalError::DanglingReference { node, declaration: *id })
            })
            .collect()
    }

    /// Candidate declarations of an identifier.
    pub fn dereference(&mut self, expression: &Expression) -> Result<Resolved<'a>, InternalError> {
        let ExprKind::Identifier(identifier) = &expression.kind else {
            return Ok(Resolved::Unresolved);
        };
        let ids: Vec<NodeId> = if !identifier.overloaded_declarations.is_empty() {
            identifier.overloaded_declarations.clone()
        } else {
            identifier.referenced_declaration.into_iter().collect()
        };
        if ids.is_empty() {
            self.reporter.record_error(
                ErrorImpl::UnresolvedReference { name: identifier.name.clone() },
                &expression.span,
            );
            return Ok(Resolved::Unresolved);
        }
        Ok(Resolved::Declarations(self.resolve_ids(expression.id, &ids)?))
    }

    /// Single declaration named by a path such as a base contract or a type.
    pub fn dereference_path(&mut self, path: &IdentifierPath) -> Result<Option<Declaration<'a>>, InternalError> {
        match path.referenced_declaration {
            None => {
                self.reporter
                    .record_error(ErrorImpl::UnresolvedReference { name: path.name() }, &path.span);
                Ok(None)
            }
            Some(id) => Ok(Some(self.resolve_ids(path.id, &[id])?[0].1)),
        }
    }

    /// Narrows same-named function candidates: private functions of other
    /// contracts are dropped, overridden signatures de-duplicated and, when the
    /// call site is known, candidates that cannot take the arguments removed.
    pub fn clean_overloaded_declarations(
        &mut self,
        name: &str,
        candidates: Vec<(Declaration<'a>, Type)>,
        arguments: Option<&CallArguments>,
        span: &Span,
    ) -> Type {
        let current_contract = self.current_contract().map(|contract| contract.id);
        let mut unique: Vec<(Declaration<'a>, Type)> = vec![];
        for (declaration, type_) in candidates {
            if let DeclarationKind::Function(function) = declaration.kind {
                if function.visibility == Visibility::Private && declaration.scope != current_contract {
                    continue;
                }
            }
            let duplicate = unique.iter().any(|(_, existing)| match (existing, &type_) {
                (Type::Function(a), Type::Function(b)) => a.has_equal_parameter_types(b) && a.kind == b.kind,
                (a, b) => same_function_signature(a, b),
            });
            if !duplicate {
                unique.push((declaration, type_));
            }
        }

        if unique.len() == 1 {
            return unique.remove(0).1;
        }
        if unique.is_empty() {
            self.reporter
                .record_error(ErrorImpl::NoMatchingOverload { name: String::from(name) }, span);
            return Type::Invalid;
        }

        let Some(arguments) = arguments else {
            return Type::Overloaded(unique.into_iter().map(|(_, type_)| type_).collect());
        };

        let mut matching: Vec<Type> = unique
            .into_iter()
            .map(|(_, type_)| type_)
            .filter(|type_| match type_ {
                Type::Function(function) => arguments.can_be_passed_to(function),
                _ => false,
            })
            .collect();
        tracing::debug!(name, survivors = matching.len(), "overload narrowing");

        match matching.len() {
            0 => {
                self.reporter
                    .record_error(ErrorImpl::NoMatchingOverload { name: String::from(name) }, span);
                Type::Invalid
            }
            1 => matching.remove(0),
            _ => {
                self.reporter
                    .record_error(ErrorImpl::AmbiguousReference { name: String::from(name) }, span);
                Type::Invalid
            }
        }
    }

    /// Checks a modifier invocation that may also be a base constructor call.
    /// `bases` are the contracts whose constructors may be invoked from here,
    /// which only the enclosing contract knows.
    pub fn visit_manually(&mut self, invocation: &'a ModifierInvocation, bases: &[NodeId]) -> Result<(), InternalError> {
        let arguments = match &invocation.arguments {
            Some(arguments) => Some(CallArguments::visit(self, arguments)?),
            None => None,
        };

        let Some(declaration) = self.dereference_path(&invocation.modifier_name)? else {
            return Ok(());
        };

        match declaration.kind {
            DeclarationKind::Contract(contract) if bases.contains(&contract.id) => {
                let (parameters, names) = match contract.constructor() {
                    Some(constructor) => (
                        self.parameter_types(&constructor.parameters)?,
                        constructor.parameters.iter().map(|p| p.name.clone()).collect(),
                    ),
                    None => (vec![], vec![]),
                };
                if let Some(arguments) = &arguments {
                    check_call_arguments(self, "constructor call", &parameters, &names, arguments, &invocation.span);
                }
            }
            DeclarationKind::Modifier(modifier) => {
                let parameters = self.parameter_types(&modifier.parameters)?;
                let names: Vec<String> = modifier.parameters.iter().map(|p| p.name.clone()).collect();
                let arguments = arguments.unwrap_or_default();
                check_call_arguments(self, "modifier invocation", &parameters, &names, &arguments, &invocation.span);
            }
            _ => {
                self.reporter.record_error(
                    ErrorImpl::NotModifierOrBase { name: invocation.modifier_name.name() },
                    &invocation.span,
                );
            }
        }
        Ok(())
    }
}
