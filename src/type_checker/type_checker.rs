use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    ast::{
        ast::{DataLocationKeyword, NodeId, SourceUnit, SourceUnitPart, StateMutability, Visibility},
        declarations::{
            ContractDefinition, EventDefinition, FunctionDefinition, MessageDefinition, ModifierDefinition,
            StructDefinition, VariableDeclaration,
        },
        expressions::{BinaryOperator, ExprKind, Expression, LiteralKind, UnaryOperator},
        globals::{GlobalDeclaration, GlobalKind},
        types::{TypeName, TypeNameKind},
    },
    config::{AbiCoderVersion, CheckerSettings},
    errors::errors::{Diagnostic, ErrorImpl, ErrorReporter, InternalError},
    Span,
};

use super::{
    abi::StructMembers,
    annotations::TypeAnnotations,
    calls::CallArguments,
    contracts::{type_check_contract, type_check_function, type_check_struct, type_check_using_for},
    declarations::{DeclarationKind, DeclarationTable},
    rational::{parse_number_literal, BigInt, BigUint, Rational},
    types::{CallKind, ContractType, DataLocation, FunctionType, MagicKind, StructType, Type},
};

lazy_static! {
    static ref INTEGER_TYPE: Regex = Regex::new(r"^(u?)int(\d*)$").unwrap();
    static ref FIXED_BYTES_TYPE: Regex = Regex::new(r"^bytes(\d+)$").unwrap();
}

/// One level of the scope stack: the source unit, a contract, or a function
/// or modifier inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment<'a> {
    pub contract: Option<&'a ContractDefinition>,
    pub function: Option<&'a FunctionDefinition>,
    pub modifier: Option<&'a ModifierDefinition>,
}

/// What the surrounding expression expects from the one being checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionContext<'c> {
    /// The expression is written to.
    pub lvalue: bool,
    /// Written to by `=` rather than a compound operator or `delete`.
    pub ordinary_assignment: bool,
    /// Arguments of the call this expression is the callee of.
    pub arguments: Option<&'c CallArguments>,
}

impl<'c> ExpressionContext<'c> {
    pub fn lvalue(ordinary_assignment: bool) -> Self {
        ExpressionContext {
            lvalue: true,
            ordinary_assignment,
            arguments: None,
        }
    }

    pub fn callee(arguments: &'c CallArguments) -> Self {
        ExpressionContext {
            lvalue: false,
            ordinary_assignment: false,
            arguments: Some(arguments),
        }
    }
}

pub struct TypeChecker<'a> {
    pub settings: CheckerSettings,
    pub reporter: &'a mut ErrorReporter,
    pub annotations: TypeAnnotations,
    pub declarations: DeclarationTable<'a>,
    pub environments: Vec<Environment<'a>>,
    pub source: Option<&'a SourceUnit>,
    /// Contracts on an inheritance cycle that was already reported.
    pub cyclic_contracts: HashSet<NodeId>,
    /// Values of constant variables, filled on first evaluation.
    pub constant_values: RefCell<HashMap<NodeId, Option<Rational>>>,
    pub inside_emit_statement: bool,
}

impl<'a> TypeChecker<'a> {
    pub fn new(settings: CheckerSettings, reporter: &'a mut ErrorReporter) -> Self {
        TypeChecker {
            settings,
            reporter,
            annotations: TypeAnnotations::new(),
            declarations: DeclarationTable::default(),
            environments: vec![],
            source: None,
            cyclic_contracts: HashSet::new(),
            constant_values: RefCell::new(HashMap::new()),
            inside_emit_statement: false,
        }
    }

    /// Checks the whole source unit. Returns whether no error was recorded;
    /// `Err` means an internal invariant was broken and the run was aborted.
    #[tracing::instrument(skip_all, fields(path = %source.path))]
    pub fn check_type_requirements(&mut self, source: &'a SourceUnit) -> Result<bool, InternalError> {
        self.declarations = DeclarationTable::build(source);
        self.source = Some(source);
        self.environments = vec![Environment::default()];

        for part in &source.nodes {
            match part {
                SourceUnitPart::Contract(contract) => type_check_contract(self, contract)?,
                SourceUnitPart::Struct(structure) => type_check_struct(self, structure, None)?,
                SourceUnitPart::Function(function) => type_check_function(self, function)?,
                SourceUnitPart::UsingFor(directive) => type_check_using_for(self, directive)?,
            }
        }

        self.environments.clear();
        Ok(!self.reporter.has_errors())
    }

    /// # Panics
    ///
    /// When `expression` was not visited.
    pub fn type_of(&self, expression: &Expression) -> &Type {
        self.annotations.type_of(expression)
    }

    /// # Panics
    ///
    /// When `variable` was not visited.
    pub fn type_of_variable(&self, variable: &VariableDeclaration) -> &Type {
        self.annotations.type_of_variable(variable)
    }

    pub fn into_annotations(self) -> TypeAnnotations {
        self.annotations
    }

    pub fn annotate(&mut self, expression: &Expression, type_: Type) -> Result<Type, InternalError> {
        self.annotations.annotate_expression(expression.id, type_.clone())?;
        Ok(type_)
    }

    pub fn push_environment(&mut self, environment: Environment<'a>) {
        self.environments.push(environment);
    }

    pub fn pop_environment(&mut self) {
        self.environments.pop();
    }

    pub fn get_current_environment(&self) -> Environment<'a> {
        self.environments.last().copied().unwrap_or_default()
    }

    pub fn current_contract(&self) -> Option<&'a ContractDefinition> {
        self.get_current_environment().contract
    }

    pub fn current_function(&self) -> Option<&'a FunctionDefinition> {
        self.get_current_environment().function
    }

    pub fn current_modifier(&self) -> Option<&'a ModifierDefinition> {
        self.get_current_environment().modifier
    }

    /// The file's `pragma abicoder` wins over the configured default.
    pub fn use_abi_coder_v2(&self) -> bool {
        let version = self.source.and_then(|source| source.abi_coder).unwrap_or(self.settings.abi_coder);
        version == AbiCoderVersion::V2
    }

    pub fn record_error(&mut self, error: ErrorImpl, span: &Span) {
        self.reporter.record_error(error, span);
    }

    pub fn record_warning(&mut self, error: ErrorImpl, span: &Span) {
        self.reporter.record_warning(error, span);
    }

    // TYPE NAMES

    /// Resolves a type name without reporting anything. The declaration that
    /// owns the type name reports the returned diagnostic once.
    pub fn resolve_type_name(
        &self,
        type_name: &TypeName,
        location: DataLocation,
        is_pointer: bool,
    ) -> Result<Result<Type, ErrorImpl>, InternalError> {
        match &type_name.kind {
            TypeNameKind::Elementary(elementary) => {
                Ok(elementary_type(&elementary.name, elementary.payable).map(|t| t.with_location(location, is_pointer)))
            }
            TypeNameKind::UserDefined(user_defined) => {
                let path = &user_defined.path;
                let Some(id) = path.referenced_declaration else {
                    return Ok(Err(ErrorImpl::UnresolvedReference { name: path.name() }));
                };
                let declaration = self
                    .declarations
                    .lookup(id)
                    .ok_or(InternalError::DanglingReference { node: path.id, declaration: id })?;
                match declaration.kind {
                    DeclarationKind::Contract(contract) => Ok(Ok(self.contract_type(contract))),
                    DeclarationKind::Struct(structure) => {
                        Ok(Ok(self.struct_type(structure, declaration.scope, location, is_pointer)))
                    }
                    _ => Ok(Err(ErrorImpl::InvalidTypeName {
                        message: String::from("Name has to refer to a struct, enum or contract."),
                    })),
                }
            }
            TypeNameKind::Mapping(mapping) => {
                let key = match self.resolve_type_name(&mapping.key_type, DataLocation::Memory, false)? {
                    Ok(key) => key,
                    Err(error) => return Ok(Err(error)),
                };
                let valid_key = key.is_value_type() || matches!(&key, Type::Array(array) if array.is_byte_array());
                if !valid_key {
                    return Ok(Err(ErrorImpl::InvalidTypeName {
                        message: String::from(
                            "Only elementary types, user defined value types, contract types or enums are allowed as mapping keys.",
                        ),
                    }));
                }
                let value = match self.resolve_type_name(&mapping.value_type, DataLocation::Storage, true)? {
                    Ok(value) => value,
                    Err(error) => return Ok(Err(error)),
                };
                Ok(Ok(Type::mapping(key, value)))
            }
            TypeNameKind::Array(array) => {
                let base = match self.resolve_type_name(&array.base_type, location, true)? {
                    Ok(base) => base,
                    Err(error) => return Ok(Err(error)),
                };
                let length = match &array.length {
                    None => None,
                    Some(length) => match self.evaluate_constant(length)? {
                        Some(value) if value.is_zero() => {
                            return Ok(Err(ErrorImpl::InvalidTypeName {
                                message: String::from("Array with zero length specified."),
                            }))
                        }
                        Some(value) => match value.to_u64() {
                            Some(length) => Some(length),
                            None => return Ok(Err(invalid_array_length())),
                        },
                        None => return Ok(Err(invalid_array_length())),
                    },
                };
                Ok(Ok(Type::array(base, length, location).with_location(location, is_pointer)))
            }
            TypeNameKind::Function(function) => {
                let mut parameters = vec![];
                for parameter in &function.parameter_types {
                    match self.declared_variable_type(parameter)? {
                        Ok(type_) => parameters.push(type_),
                        Err(error) => return Ok(Err(error)),
                    }
                }
                let mut returns = vec![];
                for parameter in &function.return_parameter_types {
                    match self.declared_variable_type(parameter)? {
                        Ok(type_) => returns.push(type_),
                        Err(error) => return Ok(Err(error)),
                    }
                }
                let kind = if function.visibility == Visibility::External {
                    CallKind::External
                } else {
                    CallKind::Internal
                };
                Ok(Ok(Type::function(FunctionType::new(kind, parameters, returns, function.state_mutability))))
            }
        }
    }

    /// Location a variable's reference type lives in, as declared.
    pub fn declared_location(&self, variable: &VariableDeclaration) -> (DataLocation, bool) {
        if variable.is_state_variable {
            return (DataLocation::Storage, false);
        }
        match variable.location {
            DataLocationKeyword::Storage => (DataLocation::Storage, true),
            DataLocationKeyword::Memory | DataLocationKeyword::Default => (DataLocation::Memory, false),
            DataLocationKeyword::Calldata => (DataLocation::CallData, false),
        }
    }

    /// Type of a variable from its type name, without consulting annotations.
    pub fn declared_variable_type(&self, variable: &VariableDeclaration) -> Result<Result<Type, ErrorImpl>, InternalError> {
        let Some(type_name) = &variable.type_name else {
            return Ok(Err(ErrorImpl::InvalidDeclaration {
                message: String::from("Use of the \"var\" keyword is disallowed."),
            }));
        };
        let (location, is_pointer) = self.declared_location(variable);
        self.resolve_type_name(type_name, location, is_pointer)
    }

    /// Annotated type of a variable, or its declared type when the
    /// declaration was not visited yet.
    pub fn variable_type(&self, variable: &VariableDeclaration) -> Result<Type, InternalError> {
        if let Some(type_) = self.annotations.try_type_of_variable(variable) {
            return Ok(type_.clone());
        }
        Ok(self.declared_variable_type(variable)?.unwrap_or(Type::Invalid))
    }

    pub fn parameter_types(&self, parameters: &[VariableDeclaration]) -> Result<Vec<Type>, InternalError> {
        parameters.iter().map(|parameter| self.variable_type(parameter)).collect()
    }

    /// Evaluates array lengths and similar compile-time constants.
    pub fn evaluate_constant(&self, expression: &Expression) -> Result<Option<Rational>, InternalError> {
        self.evaluate_constant_in(expression, &mut HashSet::new())
    }

    /// `active` holds the constants currently being evaluated; meeting one of
    /// them again means the constant refers to itself.
    fn evaluate_constant_in(
        &self,
        expression: &Expression,
        active: &mut HashSet<NodeId>,
    ) -> Result<Option<Rational>, InternalError> {
        match &expression.kind {
            ExprKind::Literal(literal) if literal.kind == LiteralKind::Number => {
                let Ok(value) = parse_number_literal(&literal.value) else {
                    return Ok(None);
                };
                Ok(match literal.sub_denomination {
                    Some(unit) => value.mul(&Rational::integer(BigInt::new(false, BigUint::from_u64(unit.multiplier())))),
                    None => Some(value),
                })
            }
            ExprKind::Identifier(identifier) => {
                let Some(id) = identifier.referenced_declaration else {
                    return Ok(None);
                };
                let declaration = self
                    .declarations
                    .lookup(id)
                    .ok_or(InternalError::DanglingReference { node: expression.id, declaration: id })?;
                let DeclarationKind::Variable(variable) = declaration.kind else {
                    return Ok(None);
                };
                let (true, Some(value)) = (variable.is_constant(), &variable.value) else {
                    return Ok(None);
                };
                if let Some(known) = self.constant_values.borrow().get(&id) {
                    return Ok(known.clone());
                }
                if !active.insert(id) {
                    tracing::debug!(constant = %variable.name, "cyclic constant");
                    return Ok(None);
                }
                let result = self.evaluate_constant_in(value, active)?;
                active.remove(&id);
                self.constant_values.borrow_mut().insert(id, result.clone());
                Ok(result)
            }
            ExprKind::Tuple(tuple) if tuple.components.len() == 1 && !tuple.is_inline_array => {
                match &tuple.components[0] {
                    Some(component) => self.evaluate_constant_in(component, active),
                    None => Ok(None),
                }
            }
            ExprKind::Unary(unary) if unary.operator == UnaryOperator::Negate => {
                Ok(self.evaluate_constant_in(&unary.sub_expression, active)?.map(|v| v.neg()))
            }
            ExprKind::Binary(binary) => {
                let Some(left) = self.evaluate_constant_in(&binary.left, active)? else {
                    return Ok(None);
                };
                let Some(right) = self.evaluate_constant_in(&binary.right, active)? else {
                    return Ok(None);
                };
                Ok(match binary.operator {
                    BinaryOperator::Add => left.add(&right),
                    BinaryOperator::Sub => left.sub(&right),
                    BinaryOperator::Mul => left.mul(&right),
                    BinaryOperator::Div => left.div(&right),
                    BinaryOperator::Mod => left.rem(&right),
                    BinaryOperator::Exp => left.pow(&right),
                    BinaryOperator::Shl => left.shl(&right),
                    BinaryOperator::Shr => left.shr(&right),
                    _ => None,
                })
            }
            _ => Ok(None),
        }
    }

    // DECLARATION TYPES

    pub fn contract_type(&self, contract: &ContractDefinition) -> Type {
        Type::Contract(ContractType {
            id: contract.id,
            name: contract.name.clone(),
            kind: contract.kind,
            can_receive: self.declarations.can_receive(contract),
            is_super: false,
            bases: self.declarations.linearized_bases(contract),
        })
    }

    pub fn struct_type(
        &self,
        structure: &StructDefinition,
        scope: Option<NodeId>,
        location: DataLocation,
        is_pointer: bool,
    ) -> Type {
        let name = match scope.and_then(|scope| self.declarations.contract(scope)) {
            Some(contract) => format!("{}.{}", contract.name, structure.name),
            None => structure.name.clone(),
        };
        Type::Struct(StructType {
            id: structure.id,
            name,
            location,
            is_pointer,
        })
    }

    /// Function type of a declaration as seen through `kind`.
    pub fn function_type(&self, function: &FunctionDefinition, kind: CallKind) -> Result<FunctionType, InternalError> {
        let mut parameter_types = self.parameter_types(&function.parameters)?;
        let mut return_types = self.parameter_types(&function.return_parameters)?;
        if kind == CallKind::External {
            // the caller passes memory, the callee sees calldata
            parameter_types = parameter_types.into_iter().map(calldata_to_memory).collect();
            return_types = return_types.into_iter().map(calldata_to_memory).collect();
        }
        let mut function_type = FunctionType::new(kind, parameter_types, return_types, function.state_mutability);
        function_type.parameter_names = function.parameters.iter().map(|p| p.name.clone()).collect();
        function_type.return_names = function.return_parameters.iter().map(|p| p.name.clone()).collect();
        function_type.declaration = Some(function.id);
        Ok(function_type)
    }

    pub fn event_type(&self, event: &EventDefinition) -> Result<Type, InternalError> {
        let mut function_type = FunctionType::new(
            CallKind::Event,
            self.parameter_types(&event.parameters)?,
            vec![],
            StateMutability::NonPayable,
        );
        function_type.parameter_names = event.parameters.iter().map(|p| p.name.clone()).collect();
        function_type.declaration = Some(event.id);
        Ok(Type::function(function_type))
    }

    /// Sending a message yields a handle for its eventual return values.
    pub fn message_type(&self, message: &MessageDefinition) -> Result<Type, InternalError> {
        let returns = self.parameter_types(&message.return_parameters)?;
        let mut function_type = FunctionType::new(
            CallKind::Message,
            self.parameter_types(&message.parameters)?
                .into_iter()
                .map(calldata_to_memory)
                .collect(),
            vec![Type::MessageHandle(returns)],
            StateMutability::Payable,
        );
        function_type.parameter_names = message.parameters.iter().map(|p| p.name.clone()).collect();
        function_type.declaration = Some(message.id);
        Ok(Type::function(function_type))
    }

    /// Type of the getter a public state variable exposes to other contracts.
    pub fn getter_type(&self, variable: &VariableDeclaration) -> Result<Type, InternalError> {
        let mut current = self.variable_type(variable)?;
        let mut parameters = vec![];
        loop {
            match current {
                Type::Mapping(key, value) => {
                    parameters.push(key.with_location(DataLocation::Memory, false));
                    current = *value;
                }
                Type::Array(ref array) if !array.is_byte_array() => {
                    parameters.push(Type::uint256());
                    current = array.base_type();
                }
                _ => break,
            }
        }
        let returns = match &current {
            Type::Struct(structure) => self
                .struct_members(structure.id, DataLocation::Memory)?
                .into_iter()
                .map(|(_, member)| member)
                .filter(|member| !matches!(member, Type::Mapping(..)) && !matches!(member, Type::Array(a) if !a.is_byte_array()))
                .collect(),
            other => vec![other.with_location(DataLocation::Memory, false)],
        };
        let mut function_type = FunctionType::new(CallKind::External, parameters, returns, StateMutability::View);
        function_type.declaration = Some(variable.id);
        Ok(Type::function(function_type))
    }

    pub fn modifier_type(&self, modifier: &ModifierDefinition) -> Result<Type, InternalError> {
        Ok(Type::Modifier(self.parameter_types(&modifier.parameters)?))
    }

    /// Type of a reference to a global. `None` when the global makes no sense
    /// here, e.g. `this` outside of a contract.
    pub fn global_type(&self, global: &GlobalDeclaration) -> Option<Type> {
        let builtin = |kind: CallKind, parameters: Vec<Type>, returns: Vec<Type>, mutability: StateMutability| {
            let mut function_type = FunctionType::new(kind, parameters, returns, mutability);
            function_type.declaration = Some(global.id);
            Some(Type::function(function_type))
        };
        match global.kind {
            GlobalKind::Abi => Some(Type::Magic(MagicKind::Abi)),
            GlobalKind::Block => Some(Type::Magic(MagicKind::Block)),
            GlobalKind::Message => Some(Type::Magic(MagicKind::Message)),
            GlobalKind::Transaction => Some(Type::Magic(MagicKind::Transaction)),
            GlobalKind::This => self.current_contract().map(|contract| self.contract_type(contract)),
            GlobalKind::Super => self.current_contract().map(|contract| match self.contract_type(contract) {
                Type::Contract(mut contract_type) => {
                    contract_type.is_super = true;
                    Type::Contract(contract_type)
                }
                other => other,
            }),
            GlobalKind::MetaType => builtin(CallKind::MetaType, vec![], vec![], StateMutability::Pure),
            GlobalKind::Require => builtin(CallKind::Require, vec![Type::Bool], vec![], StateMutability::Pure),
            GlobalKind::RequireWithMessage => builtin(
                CallKind::Require,
                vec![Type::Bool, Type::string_memory()],
                vec![],
                StateMutability::Pure,
            ),
            GlobalKind::Assert => builtin(CallKind::Assert, vec![Type::Bool], vec![], StateMutability::Pure),
            GlobalKind::Revert => builtin(CallKind::Revert, vec![], vec![], StateMutability::Pure),
            GlobalKind::RevertWithMessage => {
                builtin(CallKind::Revert, vec![Type::string_memory()], vec![], StateMutability::Pure)
            }
            GlobalKind::Keccak256 => builtin(
                CallKind::Keccak256,
                vec![Type::bytes_memory()],
                vec![Type::FixedBytes(32)],
                StateMutability::Pure,
            ),
            GlobalKind::Sha256 => builtin(
                CallKind::Sha256,
                vec![Type::bytes_memory()],
                vec![Type::FixedBytes(32)],
                StateMutability::Pure,
            ),
            GlobalKind::Ripemd160 => builtin(
                CallKind::Ripemd160,
                vec![Type::bytes_memory()],
                vec![Type::FixedBytes(20)],
                StateMutability::Pure,
            ),
            GlobalKind::Ecrecover => builtin(
                CallKind::ECRecover,
                vec![Type::FixedBytes(32), Type::uint(8), Type::FixedBytes(32), Type::FixedBytes(32)],
                vec![Type::address()],
                StateMutability::Pure,
            ),
            GlobalKind::AddMod => builtin(
                CallKind::AddMod,
                vec![Type::uint256(), Type::uint256(), Type::uint256()],
                vec![Type::uint256()],
                StateMutability::Pure,
            ),
            GlobalKind::MulMod => builtin(
                CallKind::MulMod,
                vec![Type::uint256(), Type::uint256(), Type::uint256()],
                vec![Type::uint256()],
                StateMutability::Pure,
            ),
            GlobalKind::GasLeft => builtin(CallKind::GasLeft, vec![], vec![Type::uint256()], StateMutability::View),
            GlobalKind::BlockHash => builtin(
                CallKind::BlockHash,
                vec![Type::uint256()],
                vec![Type::FixedBytes(32)],
                StateMutability::View,
            ),
            GlobalKind::Selfdestruct => builtin(
                CallKind::Selfdestruct,
                vec![Type::address_payable()],
                vec![],
                StateMutability::NonPayable,
            ),
        }
    }

    /// Member names and types of a struct, located at `location`.
    pub fn struct_members(&self, id: NodeId, location: DataLocation) -> Result<Vec<(String, Type)>, InternalError> {
        let Some((structure, _)) = self.declarations.structure(id) else {
            return Ok(vec![]);
        };
        let mut members = vec![];
        for member in &structure.members {
            let type_ = match &member.type_name {
                Some(type_name) => self.resolve_type_name(type_name, location, true)?.unwrap_or(Type::Invalid),
                None => Type::Invalid,
            };
            members.push((member.name.clone(), type_.with_location(location, false)));
        }
        Ok(members)
    }
}

impl<'a> StructMembers for TypeChecker<'a> {
    fn member_types(&self, id: NodeId) -> Vec<Type> {
        self.struct_members(id, DataLocation::Memory)
            .map(|members| members.into_iter().map(|(_, type_)| type_).collect())
            .unwrap_or_default()
    }
}

fn invalid_array_length() -> ErrorImpl {
    ErrorImpl::InvalidTypeName {
        message: String::from("Invalid array length, expected integer literal or constant expression."),
    }
}

fn calldata_to_memory(type_: Type) -> Type {
    if type_.data_location() == Some(DataLocation::CallData) {
        type_.with_location(DataLocation::Memory, false)
    } else {
        type_
    }
}

/// Parses `uint8`, `int`, `bytes32`, `address`, ... into a type.
pub fn elementary_type(name: &str, payable: bool) -> Result<Type, ErrorImpl> {
    let unknown = || ErrorImpl::InvalidTypeName {
        message: format!("Unknown elementary type \"{}\".", name),
    };
    match name {
        "bool" => return Ok(Type::Bool),
        "address" => return Ok(Type::Address { payable }),
        "string" => return Ok(Type::string_memory()),
        "bytes" => return Ok(Type::bytes_memory()),
        "byte" => return Ok(Type::FixedBytes(1)),
        _ => {}
    }
    if let Some(captures) = INTEGER_TYPE.captures(name) {
        let signed = captures[1].is_empty();
        let bits: u16 = match &captures[2] {
            "" => 256,
            digits => digits.parse().map_err(|_| unknown())?,
        };
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(unknown());
        }
        return Ok(Type::Integer { bits, signed });
    }
    if let Some(captures) = FIXED_BYTES_TYPE.captures(name) {
        let size: u8 = captures[1].parse().map_err(|_| unknown())?;
        if size == 0 || size > 32 {
            return Err(unknown());
        }
        return Ok(Type::FixedBytes(size));
    }
    if name.starts_with("fixed") || name.starts_with("ufixed") {
        return Err(ErrorImpl::InvalidTypeName {
            message: String::from("Fixed point types are not yet supported."),
        });
    }
    Err(unknown())
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct TypeCheckResult {
    pub passed: bool,
    pub annotations: TypeAnnotations,
    pub diagnostics: Vec<Diagnostic>,
}

/// Type checks `source` with a fresh diagnostic sink.
pub fn type_check(source: &SourceUnit, settings: CheckerSettings) -> Result<TypeCheckResult, InternalError> {
    let mut reporter = ErrorReporter::new();
    let mut type_checker = TypeChecker::new(settings, &mut reporter);
    let passed = type_checker.check_type_requirements(source)?;
    let annotations = type_checker.into_annotations();
    Ok(TypeCheckResult {
        passed,
        annotations,
        diagnostics: reporter.diagnostics().to_vec(),
    })
}
