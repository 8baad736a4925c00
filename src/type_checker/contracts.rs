//! Contract-level checks: inheritance, member declarations and the shape of
//! special functions.

use crate::{
    ast::{
        ast::{NodeId, StateMutability, Visibility},
        declarations::{
            ContractDefinition, ContractPart, EventDefinition, FunctionDefinition, FunctionKind, InheritanceSpecifier,
            MessageDefinition, ModifierDefinition, StructDefinition, UsingForDirective, VariableDeclaration,
        },
    },
    errors::errors::{ErrorImpl, InternalError},
    Span,
};

use super::{
    abi::{contains_mapping, has_infinite_size},
    calls::{check_call_arguments, CallArguments},
    declarations::DeclarationKind,
    statements::type_check_block,
    type_checker::{Environment, TypeChecker},
    types::{DataLocation, Type},
    variables::{check_abi_encodable, check_variable_value, declare_variable, VariableContext},
};

fn invalid_declaration(checker: &mut TypeChecker, message: impl Into<String>, span: &Span) {
    checker.record_error(
        ErrorImpl::InvalidDeclaration {
            message: message.into(),
        },
        span,
    );
}

fn signature_error(checker: &mut TypeChecker, message: impl Into<String>, span: &Span) {
    checker.record_error(
        ErrorImpl::FunctionSignature {
            message: message.into(),
        },
        span,
    );
}

/// Whether the contract sits on or behind an inheritance cycle. The cycle is
/// reported once, at a contract on the cycle.
fn skip_cyclic_contract(checker: &mut TypeChecker, contract: &ContractDefinition) -> bool {
    if checker.cyclic_contracts.contains(&contract.id) {
        return true;
    }
    let Some(cycle) = checker.declarations.find_inheritance_cycle(contract) else {
        return false;
    };
    tracing::debug!(contract = %contract.name, ?cycle, "inheritance cycle");
    let already_reported = cycle.iter().any(|id| checker.cyclic_contracts.contains(id));
    if !already_reported {
        // a derived contract may reach the cycle first; anchor at a member of it
        let anchor = cycle
            .first()
            .and_then(|id| checker.declarations.contract(*id))
            .unwrap_or(contract);
        checker.record_error(
            ErrorImpl::InheritanceCycle {
                contract: anchor.name.clone(),
            },
            &anchor.span,
        );
    }
    checker.cyclic_contracts.extend(cycle);
    checker.cyclic_contracts.insert(contract.id);
    true
}

#[tracing::instrument(level = "debug", skip_all, fields(contract = %contract.name))]
pub fn type_check_contract<'a>(checker: &mut TypeChecker<'a>, contract: &'a ContractDefinition) -> Result<(), InternalError> {
    if skip_cyclic_contract(checker, contract) {
        return Ok(());
    }
    checker.push_environment(Environment {
        contract: Some(contract),
        ..Environment::default()
    });

    for base in &contract.base_contracts {
        type_check_inheritance_specifier(checker, contract, base)?;
    }

    // state variable types first, so that bodies may refer to later ones
    let mut state_variable_types = vec![];
    for variable in contract.state_variables() {
        state_variable_types.push(declare_variable(checker, variable, VariableContext::State)?);
    }

    let mut state_variable_types = state_variable_types.into_iter();
    for part in &contract.nodes {
        match part {
            ContractPart::Function(function) => type_check_function(checker, function)?,
            ContractPart::StateVariable(variable) => {
                let type_ = state_variable_types.next().unwrap_or(Type::Invalid);
                check_variable_value(checker, variable, &type_)?;
                if variable.visibility == Visibility::Public && !type_.is_invalid() {
                    check_getter(checker, variable)?;
                }
            }
            ContractPart::Event(event) => type_check_event(checker, event)?,
            ContractPart::Message(message) => type_check_message(checker, message)?,
            ContractPart::Modifier(modifier) => type_check_modifier(checker, modifier)?,
            ContractPart::Struct(structure) => type_check_struct(checker, structure, Some(contract.id))?,
            ContractPart::UsingFor(directive) => type_check_using_for(checker, directive)?,
        }
    }

    check_contract_kind_restrictions(checker, contract);
    checker.pop_environment();
    Ok(())
}

fn type_check_inheritance_specifier<'a>(
    checker: &mut TypeChecker<'a>,
    contract: &ContractDefinition,
    specifier: &'a InheritanceSpecifier,
) -> Result<(), InternalError> {
    let arguments = match &specifier.arguments {
        Some(arguments) => Some(CallArguments::visit(checker, arguments)?),
        None => None,
    };
    let Some(declaration) = checker.dereference_path(&specifier.base_name)? else {
        return Ok(());
    };
    let DeclarationKind::Contract(base) = declaration.kind else {
        invalid_declaration(checker, "Contract expected.", &specifier.span);
        return Ok(());
    };

    if base.is_library() {
        invalid_declaration(checker, "Libraries cannot be inherited from.", &specifier.span);
    } else if contract.is_library() {
        invalid_declaration(checker, "Library is not allowed to inherit.", &specifier.span);
    } else if contract.is_interface() && !base.is_interface() {
        invalid_declaration(checker, "Interfaces can only inherit from other interfaces.", &specifier.span);
    }

    if let Some(arguments) = arguments {
        if contract.is_interface() {
            invalid_declaration(checker, "Interfaces cannot be given constructor arguments.", &specifier.span);
            return Ok(());
        }
        let (parameters, names) = match base.constructor() {
            Some(constructor) => (
                checker.parameter_types(&constructor.parameters)?,
                constructor.parameters.iter().map(|p| p.name.clone()).collect(),
            ),
            None => (vec![], vec![]),
        };
        check_call_arguments(checker, "constructor call", &parameters, &names, &arguments, &specifier.span);
    }
    Ok(())
}

/// A public state variable's getter returns memory copies, which have to be
/// ABI encodable.
fn check_getter(checker: &mut TypeChecker, variable: &VariableDeclaration) -> Result<(), InternalError> {
    let Type::Function(getter) = checker.getter_type(variable)? else {
        return Ok(());
    };
    for type_ in getter.parameter_types.iter().chain(&getter.return_types) {
        check_abi_encodable(checker, type_, false, &variable.span, "getters of public state variables");
    }
    Ok(())
}

fn check_contract_kind_restrictions(checker: &mut TypeChecker, contract: &ContractDefinition) {
    if contract.is_interface() {
        for variable in contract.state_variables() {
            invalid_declaration(checker, "Variables cannot be declared in interfaces.", &variable.span);
        }
        for function in contract.functions() {
            if function.is_constructor() {
                invalid_declaration(checker, "Constructor cannot be defined in interfaces.", &function.span);
                continue;
            }
            if function.visibility != Visibility::External {
                signature_error(checker, "Functions in interfaces must be declared external.", &function.span);
            }
            if function.body.is_some() {
                signature_error(checker, "Functions in interfaces cannot have an implementation.", &function.span);
            }
        }
    } else if contract.is_library() {
        for variable in contract.state_variables() {
            if !variable.is_constant() {
                invalid_declaration(checker, "Library cannot have non-constant state variables", &variable.span);
            }
        }
        for function in contract.functions() {
            let message = match function.kind {
                FunctionKind::Constructor => Some("Constructor cannot be defined in libraries."),
                FunctionKind::Fallback => Some("Libraries cannot have fallback functions."),
                FunctionKind::Receive => Some("Libraries cannot have receive ether functions."),
                FunctionKind::Function if function.state_mutability == StateMutability::Payable => {
                    Some("Library functions cannot be payable.")
                }
                FunctionKind::Function => None,
            };
            if let Some(message) = message {
                signature_error(checker, message, &function.span);
            }
        }
    } else if !contract.is_abstract {
        let unimplemented = contract.functions().any(|function| !function.is_implemented());
        if unimplemented {
            let message = format!("Contract \"{}\" should be marked as abstract.", contract.name);
            invalid_declaration(checker, message, &contract.span);
        }
    }
}

/// Visibility a function has towards callers when none was written.
fn effective_visibility(checker: &TypeChecker, function: &FunctionDefinition) -> Visibility {
    match (function.kind, function.visibility) {
        (FunctionKind::Fallback | FunctionKind::Receive, _) => Visibility::External,
        (FunctionKind::Constructor, _) => Visibility::Public,
        (_, Visibility::Default) if checker.current_contract().is_none() => Visibility::Internal,
        (_, Visibility::Default) => Visibility::Public,
        (_, visibility) => visibility,
    }
}

pub fn type_check_function<'a>(checker: &mut TypeChecker<'a>, function: &'a FunctionDefinition) -> Result<(), InternalError> {
    let contract = checker.current_contract();
    checker.push_environment(Environment {
        contract,
        function: Some(function),
        modifier: None,
    });

    let visibility = effective_visibility(checker, function);
    let is_library = contract.is_some_and(|c| c.is_library());
    for (parameters, is_return) in [(&function.parameters, false), (&function.return_parameters, true)] {
        for parameter in parameters {
            let context = VariableContext::Parameter {
                visibility,
                is_library,
                is_return,
            };
            declare_variable(checker, parameter, context)?;
        }
    }

    check_function_shape(checker, function);

    let bases: Vec<NodeId> = match contract {
        Some(contract) if function.is_constructor() => checker
            .declarations
            .linearized_bases(contract)
            .into_iter()
            .filter(|id| *id != contract.id)
            .collect(),
        _ => vec![],
    };
    for invocation in &function.modifiers {
        checker.visit_manually(invocation, &bases)?;
    }

    if let Some(body) = &function.body {
        type_check_block(checker, body)?;
    }
    checker.pop_environment();
    Ok(())
}

fn check_function_shape(checker: &mut TypeChecker, function: &FunctionDefinition) {
    let mutability = function.state_mutability;
    let span = &function.span;
    match function.kind {
        FunctionKind::Fallback => {
            if function.visibility != Visibility::External {
                signature_error(checker, "Fallback function must be defined as \"external\".", span);
            }
            if !matches!(mutability, StateMutability::Payable | StateMutability::NonPayable) {
                signature_error(
                    checker,
                    format!("Fallback function must be payable or non-payable, but is \"{}\".", mutability),
                    span,
                );
            }
            if !function.parameters.is_empty() {
                signature_error(checker, "Fallback function cannot take parameters.", span);
            }
            if !function.return_parameters.is_empty() {
                signature_error(checker, "Fallback function cannot return values.", span);
            }
        }
        FunctionKind::Receive => {
            if function.visibility != Visibility::External {
                signature_error(checker, "Receive ether function must be defined as \"external\".", span);
            }
            if mutability != StateMutability::Payable {
                signature_error(
                    checker,
                    format!("Receive ether function must be payable, but is \"{}\".", mutability),
                    span,
                );
            }
            if !function.parameters.is_empty() {
                signature_error(checker, "Receive ether function cannot take parameters.", span);
            }
            if !function.return_parameters.is_empty() {
                signature_error(checker, "Receive ether function cannot return values.", span);
            }
        }
        FunctionKind::Constructor => {
            if !matches!(mutability, StateMutability::Payable | StateMutability::NonPayable) {
                signature_error(
                    checker,
                    format!("Constructor must be payable or non-payable, but is \"{}\".", mutability),
                    span,
                );
            }
            if !function.return_parameters.is_empty() {
                signature_error(checker, "Non-empty \"returns\" directive for constructor.", span);
            }
        }
        FunctionKind::Function => {
            let in_interface = checker.current_contract().is_some_and(|c| c.is_interface());
            if function.body.is_none() && !in_interface && !function.is_virtual {
                signature_error(checker, "Functions without implementation must be marked virtual.", span);
            }
            if checker.current_contract().is_none() {
                if function.body.is_none() {
                    signature_error(checker, "Free functions must be implemented.", span);
                }
                if matches!(function.visibility, Visibility::Public | Visibility::External | Visibility::Private) {
                    signature_error(checker, "Free functions cannot have visibility.", span);
                }
            }
        }
    }
}

fn type_check_modifier<'a>(checker: &mut TypeChecker<'a>, modifier: &'a ModifierDefinition) -> Result<(), InternalError> {
    let contract = checker.current_contract();
    checker.push_environment(Environment {
        contract,
        function: None,
        modifier: Some(modifier),
    });
    let is_library = contract.is_some_and(|c| c.is_library());
    for parameter in &modifier.parameters {
        let context = VariableContext::Parameter {
            visibility: Visibility::Internal,
            is_library,
            is_return: false,
        };
        declare_variable(checker, parameter, context)?;
    }
    if let Some(body) = &modifier.body {
        type_check_block(checker, body)?;
    }
    checker.pop_environment();
    Ok(())
}

fn type_check_event(checker: &mut TypeChecker, event: &EventDefinition) -> Result<(), InternalError> {
    let mut indexed = 0;
    for parameter in &event.parameters {
        if parameter.indexed {
            indexed += 1;
        }
        let type_ = declare_variable(checker, parameter, VariableContext::EventParameter)?;
        if !type_.is_invalid() {
            check_abi_encodable(checker, &type_, false, &parameter.span, "event parameters");
        }
    }
    if event.anonymous && indexed > 4 {
        invalid_declaration(checker, "More than 4 indexed arguments for anonymous event.", &event.span);
    } else if !event.anonymous && indexed > 3 {
        invalid_declaration(checker, "More than 3 indexed arguments for event.", &event.span);
    }
    Ok(())
}

fn type_check_message(checker: &mut TypeChecker, message: &MessageDefinition) -> Result<(), InternalError> {
    for parameter in message.parameters.iter().chain(&message.return_parameters) {
        let type_ = declare_variable(checker, parameter, VariableContext::MessageParameter)?;
        if type_.is_invalid() {
            continue;
        }
        if contains_mapping(&type_, &*checker) {
            checker.record_error(
                ErrorImpl::NotAbiEncodable {
                    type_: type_.to_string(),
                    message: String::from("Types containing mappings cannot be passed in messages."),
                },
                &parameter.span,
            );
            continue;
        }
        check_abi_encodable(checker, &type_, false, &parameter.span, "message parameters");
    }
    Ok(())
}

/// Checks member type names and rejects structs of infinite size.
pub fn type_check_struct(
    checker: &mut TypeChecker,
    structure: &StructDefinition,
    scope: Option<NodeId>,
) -> Result<(), InternalError> {
    tracing::trace!(name = %structure.name, ?scope, "struct");
    if structure.members.is_empty() {
        invalid_declaration(checker, "Defining empty structs is disallowed.", &structure.span);
    }
    for member in &structure.members {
        let type_ = match &member.type_name {
            None => {
                invalid_declaration(checker, "Use of the \"var\" keyword is disallowed.", &member.span);
                Type::Invalid
            }
            Some(type_name) => match checker.resolve_type_name(type_name, DataLocation::Storage, false)? {
                Ok(type_) => type_,
                Err(error) => {
                    checker.record_error(error, &type_name.span);
                    Type::Invalid
                }
            },
        };
        checker.annotations.annotate_variable(member.id, type_)?;
    }
    if has_infinite_size(structure.id, &*checker) {
        invalid_declaration(checker, "Recursive struct definition.", &structure.span);
    }
    Ok(())
}

pub fn type_check_using_for(checker: &mut TypeChecker, directive: &UsingForDirective) -> Result<(), InternalError> {
    if let Some(declaration) = checker.dereference_path(&directive.library_name)? {
        let is_library = matches!(declaration.kind, DeclarationKind::Contract(contract) if contract.is_library());
        if !is_library {
            invalid_declaration(checker, "Library name expected.", &directive.library_name.span);
        }
    }
    if let Some(type_name) = &directive.type_name {
        if let Err(error) = checker.resolve_type_name(type_name, DataLocation::Storage, true)? {
            checker.record_error(error, &type_name.span);
        }
    }
    Ok(())
}
