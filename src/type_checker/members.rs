//! Member access: `s.field`, `c.f`, `a.balance`, `msg.sender`, bound library
//! functions and the rest.

use crate::{
    ast::{
        ast::{NodeId, SourceUnitPart, StateMutability, Visibility},
        declarations::{ContractDefinition, ContractPart, FunctionKind, UsingForDirective},
        expressions::{Expression, MemberAccessExpr},
    },
    errors::errors::{ErrorImpl, InternalError},
};

use super::{
    declarations::{Declaration, DeclarationKind},
    expressions::type_check_expr,
    type_checker::{ExpressionContext, TypeChecker},
    types::{CallKind, ContractType, DataLocation, FunctionType, MagicKind, Type},
};

/// A member candidate; builtin members have no declaration.
struct Member<'a> {
    declaration: Option<Declaration<'a>>,
    type_: Type,
}

impl<'a> Member<'a> {
    fn builtin(type_: Type) -> Self {
        Member { declaration: None, type_ }
    }

    fn declared(declaration: Declaration<'a>, type_: Type) -> Self {
        Member {
            declaration: Some(declaration),
            type_,
        }
    }
}

pub fn type_check_member_access<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    member: &'a MemberAccessExpr,
    ctx: &ExpressionContext,
) -> Result<Type, InternalError> {
    let base = type_check_expr(checker, &member.expression, &ExpressionContext::default())?;
    if base.is_invalid() {
        return Ok(Type::Invalid);
    }
    let name = member.member_name.as_str();

    let mut members = match builtin_member(checker, expr, &base, name, ctx)? {
        BuiltinLookup::Found(type_) => return Ok(type_),
        BuiltinLookup::Reported => return Ok(Type::Invalid),
        BuiltinLookup::NotFound => declared_members(checker, expr, &base, name)?,
    };
    if !matches!(base, Type::TypeType(_)) {
        members.extend(bound_functions(checker, &base, name)?);
    }

    if members.is_empty() {
        checker.record_error(
            ErrorImpl::MemberNotFound {
                member: String::from(name),
                type_: base.to_string(),
            },
            &expr.span,
        );
        return Ok(Type::Invalid);
    }
    if members.len() == 1 {
        return Ok(members.remove(0).type_);
    }
    let candidates: Vec<(Declaration<'a>, Type)> = members
        .into_iter()
        .filter_map(|member| member.declaration.map(|declaration| (declaration, member.type_)))
        .collect();
    Ok(checker.clean_overloaded_declarations(name, candidates, ctx.arguments, &expr.span))
}

enum BuiltinLookup {
    Found(Type),
    /// A diagnostic was already recorded.
    Reported,
    NotFound,
}

fn feature_gate(checker: &mut TypeChecker, expr: &Expression, feature: &str, available: bool, type_: Type) -> BuiltinLookup {
    if available {
        return BuiltinLookup::Found(type_);
    }
    checker.record_error(
        ErrorImpl::FeatureUnavailable {
            feature: String::from(feature),
            evm_version: checker.settings.evm_version.to_string(),
        },
        &expr.span,
    );
    BuiltinLookup::Reported
}

fn builtin_function(kind: CallKind, parameters: Vec<Type>, returns: Vec<Type>, mutability: StateMutability) -> Type {
    Type::function(FunctionType::new(kind, parameters, returns, mutability))
}

fn builtin_member(
    checker: &mut TypeChecker,
    expr: &Expression,
    base: &Type,
    name: &str,
    ctx: &ExpressionContext,
) -> Result<BuiltinLookup, InternalError> {
    let evm = checker.settings.evm_version;
    let found = BuiltinLookup::Found;
    Ok(match (base, name) {
        (Type::Address { .. }, "balance") => found(Type::uint256()),
        (Type::Address { .. }, "code") => found(Type::bytes_memory()),
        (Type::Address { .. }, "codehash") => {
            feature_gate(checker, expr, "codehash", evm.has_ext_code_hash(), Type::FixedBytes(32))
        }
        (Type::Address { payable }, "transfer" | "send") => {
            if !payable {
                checker.record_error(
                    ErrorImpl::MemberNotFound {
                        member: String::from(name),
                        type_: base.to_string(),
                    },
                    &expr.span,
                );
                return Ok(BuiltinLookup::Reported);
            }
            if name == "transfer" {
                found(builtin_function(CallKind::Transfer, vec![Type::uint256()], vec![], StateMutability::NonPayable))
            } else {
                found(builtin_function(CallKind::Send, vec![Type::uint256()], vec![Type::Bool], StateMutability::NonPayable))
            }
        }
        (Type::Address { .. }, "call") => found(builtin_function(
            CallKind::BareCall,
            vec![Type::bytes_memory()],
            vec![Type::Bool, Type::bytes_memory()],
            StateMutability::Payable,
        )),
        (Type::Address { .. }, "delegatecall") => found(builtin_function(
            CallKind::BareDelegateCall,
            vec![Type::bytes_memory()],
            vec![Type::Bool, Type::bytes_memory()],
            StateMutability::NonPayable,
        )),
        (Type::Address { .. }, "staticcall") => feature_gate(
            checker,
            expr,
            "staticcall",
            evm.has_static_call(),
            builtin_function(
                CallKind::BareStaticCall,
                vec![Type::bytes_memory()],
                vec![Type::Bool, Type::bytes_memory()],
                StateMutability::View,
            ),
        ),

        (Type::Array(_), "length") => found(Type::uint256()),
        (Type::Array(array), "push" | "pop") => {
            if array.location != DataLocation::Storage || array.length.is_some() || array.is_string() {
                return Ok(BuiltinLookup::NotFound);
            }
            let element = array.base_type().with_location(DataLocation::Storage, false);
            if name == "pop" {
                found(builtin_function(CallKind::ArrayPop, vec![], vec![], StateMutability::NonPayable))
            } else if ctx.arguments.is_some_and(|arguments| arguments.is_empty()) {
                found(builtin_function(CallKind::ArrayPush, vec![], vec![element], StateMutability::NonPayable))
            } else {
                found(builtin_function(CallKind::ArrayPush, vec![element], vec![], StateMutability::NonPayable))
            }
        }
        (Type::FixedBytes(_), "length") => found(Type::uint(8)),

        (Type::Function(function), "selector") if function.kind == CallKind::External => found(Type::FixedBytes(4)),
        (Type::Function(function), "address") if function.kind == CallKind::External => found(Type::address()),
        (Type::Function(function), "value" | "gas") if function.kind.is_external_call() || function.kind == CallKind::Creation => {
            checker.record_error(
                ErrorImpl::InvalidTypeOperation {
                    message: format!("Using \".{}(...)\" is deprecated. Use \"{{{}: ...}}\" instead.", name, name),
                },
                &expr.span,
            );
            BuiltinLookup::Reported
        }

        (Type::Magic(MagicKind::Message), "data") => found(Type::bytes(DataLocation::CallData)),
        (Type::Magic(MagicKind::Message), "sender") => found(Type::address()),
        (Type::Magic(MagicKind::Message), "sig") => found(Type::FixedBytes(4)),
        (Type::Magic(MagicKind::Message), "value") => found(Type::uint256()),
        (Type::Magic(MagicKind::Block), "coinbase") => found(Type::address_payable()),
        (Type::Magic(MagicKind::Block), "timestamp" | "number" | "difficulty" | "gaslimit") => found(Type::uint256()),
        (Type::Magic(MagicKind::Block), "chainid") => feature_gate(checker, expr, "chainid", evm.has_chain_id(), Type::uint256()),
        (Type::Magic(MagicKind::Block), "basefee") => feature_gate(checker, expr, "basefee", evm.has_base_fee(), Type::uint256()),
        (Type::Magic(MagicKind::Transaction), "origin") => found(Type::address()),
        (Type::Magic(MagicKind::Transaction), "gasprice") => found(Type::uint256()),
        (Type::Magic(MagicKind::Abi), "encode") => found(Type::function(
            FunctionType::new(CallKind::AbiEncode, vec![], vec![Type::bytes_memory()], StateMutability::Pure)
                .with_arbitrary_parameters(),
        )),
        (Type::Magic(MagicKind::Abi), "encodePacked") => found(Type::function(
            FunctionType::new(CallKind::AbiEncodePacked, vec![], vec![Type::bytes_memory()], StateMutability::Pure)
                .with_arbitrary_parameters(),
        )),
        (Type::Magic(MagicKind::Abi), "encodeWithSelector") => found(Type::function(
            FunctionType::new(
                CallKind::AbiEncodeWithSelector,
                vec![Type::FixedBytes(4)],
                vec![Type::bytes_memory()],
                StateMutability::Pure,
            )
            .with_arbitrary_parameters(),
        )),
        (Type::Magic(MagicKind::Abi), "encodeWithSignature") => found(Type::function(
            FunctionType::new(
                CallKind::AbiEncodeWithSignature,
                vec![Type::string_memory()],
                vec![Type::bytes_memory()],
                StateMutability::Pure,
            )
            .with_arbitrary_parameters(),
        )),
        (Type::Magic(MagicKind::Abi), "decode") => found(Type::function(
            FunctionType::new(CallKind::AbiDecode, vec![], vec![], StateMutability::Pure).with_arbitrary_parameters(),
        )),
        (Type::Magic(MagicKind::MetaType(actual)), _) => meta_type_member(checker, expr, actual, name),
        _ => BuiltinLookup::NotFound,
    })
}

/// Members of `type(T)`.
fn meta_type_member(checker: &mut TypeChecker, expr: &Expression, actual: &Type, name: &str) -> BuiltinLookup {
    match (actual, name) {
        (Type::Integer { .. }, "min" | "max") => BuiltinLookup::Found(actual.clone()),
        (Type::Contract(_), "name") => BuiltinLookup::Found(Type::string_memory()),
        (Type::Contract(contract), "interfaceId") => {
            let is_interface = checker.declarations.contract(contract.id).is_some_and(|c| c.is_interface());
            if is_interface {
                BuiltinLookup::Found(Type::FixedBytes(4))
            } else {
                BuiltinLookup::NotFound
            }
        }
        (Type::Contract(contract), "creationCode" | "runtimeCode") => {
            let circular = checker
                .current_contract()
                .is_some_and(|current| contract.bases.contains(&current.id));
            if circular {
                checker.record_error(
                    ErrorImpl::InvalidNewExpression {
                        message: String::from(
                            "Circular reference to contract bytecode either via \"new\" or \"type(...).creationCode\" / \"type(...).runtimeCode\".",
                        ),
                    },
                    &expr.span,
                );
                return BuiltinLookup::Reported;
            }
            BuiltinLookup::Found(Type::bytes_memory())
        }
        _ => BuiltinLookup::NotFound,
    }
}

fn declared_members<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &Expression,
    base: &Type,
    name: &str,
) -> Result<Vec<Member<'a>>, InternalError> {
    match base {
        Type::Struct(structure) => {
            let members = checker.struct_members(structure.id, structure.location)?;
            let Some((_, type_)) = members.into_iter().find(|(member, _)| member == name) else {
                return Ok(vec![]);
            };
            if matches!(type_, Type::Mapping(..)) && structure.location != DataLocation::Storage {
                checker.record_error(
                    ErrorImpl::InvalidTypeOperation {
                        message: format!(
                            "Member \"{}\" is not available in {} outside of storage.",
                            name, base
                        ),
                    },
                    &expr.span,
                );
                return Ok(vec![Member::builtin(Type::Invalid)]);
            }
            Ok(vec![Member::builtin(type_)])
        }
        Type::Contract(contract) if contract.is_super => super_members(checker, contract, name),
        Type::Contract(contract) => instance_members(checker, contract, name),
        Type::TypeType(actual) => match &**actual {
            Type::Contract(contract) => type_members(checker, contract, name),
            _ => Ok(vec![]),
        },
        _ => Ok(vec![]),
    }
}

fn linearized<'a>(checker: &TypeChecker<'a>, contract: &ContractType) -> Vec<&'a ContractDefinition> {
    contract
        .bases
        .iter()
        .filter_map(|id| checker.declarations.contract(*id))
        .collect()
}

/// Members visible on a contract instance: external view of functions,
/// public state variable getters and messages.
fn instance_members<'a>(
    checker: &mut TypeChecker<'a>,
    contract: &ContractType,
    name: &str,
) -> Result<Vec<Member<'a>>, InternalError> {
    let mut members = vec![];
    for definition in linearized(checker, contract) {
        let scope = Some(definition.id);
        for part in &definition.nodes {
            match part {
                ContractPart::Function(function)
                    if function.name == name
                        && function.kind == FunctionKind::Function
                        && function.visibility.is_externally_visible() =>
                {
                    let declaration = Declaration {
                        kind: DeclarationKind::Function(function),
                        scope,
                    };
                    let type_ = Type::function(checker.function_type(function, CallKind::External)?);
                    members.push(Member::declared(declaration, type_));
                }
                ContractPart::StateVariable(variable) if variable.name == name && variable.visibility == Visibility::Public => {
                    let declaration = Declaration {
                        kind: DeclarationKind::Variable(variable),
                        scope,
                    };
                    members.push(Member::declared(declaration, checker.getter_type(variable)?));
                }
                ContractPart::Message(message) if message.name == name => {
                    let declaration = Declaration {
                        kind: DeclarationKind::Message(message),
                        scope,
                    };
                    members.push(Member::declared(declaration, checker.message_type(message)?));
                }
                _ => {}
            }
        }
    }
    Ok(members)
}

/// `super.f`: the next implementation of `f` above the current contract.
fn super_members<'a>(
    checker: &mut TypeChecker<'a>,
    contract: &ContractType,
    name: &str,
) -> Result<Vec<Member<'a>>, InternalError> {
    let mut members = vec![];
    for definition in linearized(checker, contract).into_iter().skip(1) {
        for function in definition.functions() {
            if function.name != name
                || function.kind != FunctionKind::Function
                || function.visibility == Visibility::Private
                || function.visibility == Visibility::External
                || !function.is_implemented()
            {
                continue;
            }
            let declaration = Declaration {
                kind: DeclarationKind::Function(function),
                scope: Some(definition.id),
            };
            let type_ = Type::function(checker.function_type(function, CallKind::Internal)?);
            members.push(Member::declared(declaration, type_));
        }
    }
    Ok(members)
}

/// Members reachable through a contract name: library functions, inherited
/// functions, structs and events.
fn type_members<'a>(
    checker: &mut TypeChecker<'a>,
    contract: &ContractType,
    name: &str,
) -> Result<Vec<Member<'a>>, InternalError> {
    let Some(definition) = checker.declarations.contract(contract.id) else {
        return Ok(vec![]);
    };
    let scope = Some(definition.id);
    let derived = checker
        .current_contract()
        .is_some_and(|current| checker.declarations.linearized_bases(current).contains(&definition.id));

    let mut members = vec![];
    for part in &definition.nodes {
        match part {
            ContractPart::Function(function) if function.name == name && function.kind == FunctionKind::Function => {
                let kind = if definition.is_library() {
                    match function.visibility {
                        Visibility::Private if !derived => continue,
                        Visibility::Public | Visibility::External => CallKind::DelegateCall,
                        _ => CallKind::Internal,
                    }
                } else if derived && function.visibility != Visibility::External {
                    CallKind::Internal
                } else if function.visibility.is_externally_visible() {
                    // only usable for `.selector`
                    CallKind::External
                } else {
                    continue;
                };
                let declaration = Declaration {
                    kind: DeclarationKind::Function(function),
                    scope,
                };
                let type_ = Type::function(checker.function_type(function, kind)?);
                members.push(Member::declared(declaration, type_));
            }
            ContractPart::Struct(structure) if structure.name == name => {
                let type_ = checker.struct_type(structure, scope, DataLocation::Storage, true);
                members.push(Member::builtin(Type::TypeType(Box::new(type_))));
            }
            ContractPart::Event(event) if event.name == name => {
                let declaration = Declaration {
                    kind: DeclarationKind::Event(event),
                    scope,
                };
                members.push(Member::declared(declaration, checker.event_type(event)?));
            }
            _ => {}
        }
    }
    Ok(members)
}

fn active_using_directives<'a>(checker: &TypeChecker<'a>) -> Vec<&'a UsingForDirective> {
    let mut directives: Vec<&'a UsingForDirective> = vec![];
    if let Some(source) = checker.source {
        directives.extend(source.nodes.iter().filter_map(|part| match part {
            SourceUnitPart::UsingFor(directive) => Some(directive),
            _ => None,
        }));
    }
    if let Some(contract) = checker.current_contract() {
        for id in checker.declarations.linearized_bases(contract) {
            if let Some(base) = checker.declarations.contract(id) {
                directives.extend(base.using_for_directives());
            }
        }
    }
    directives
}

/// Library functions attached to `base` with `using L for T`.
fn bound_functions<'a>(checker: &mut TypeChecker<'a>, base: &Type, name: &str) -> Result<Vec<Member<'a>>, InternalError> {
    let mut members = vec![];
    let mut libraries: Vec<NodeId> = vec![];
    for directive in active_using_directives(checker) {
        let Some(library) = directive
            .library_name
            .referenced_declaration
            .and_then(|id| checker.declarations.contract(id))
        else {
            continue;
        };
        if !library.is_library() || libraries.contains(&library.id) {
            continue;
        }
        if let Some(type_name) = &directive.type_name {
            let Ok(target) = checker.resolve_type_name(type_name, DataLocation::Storage, true)? else {
                continue;
            };
            if !same_ignoring_location(&target, base) {
                continue;
            }
        }
        libraries.push(library.id);

        for function in library.functions() {
            if function.name != name || function.parameters.is_empty() || function.visibility == Visibility::Private {
                continue;
            }
            let kind = if function.visibility.is_externally_visible() {
                CallKind::DelegateCall
            } else {
                CallKind::Internal
            };
            let mut function_type = checker.function_type(function, kind)?;
            if !base.is_implicitly_convertible_to(&function_type.parameter_types[0]) {
                continue;
            }
            function_type.parameter_types.remove(0);
            function_type.parameter_names.remove(0);
            function_type.bound = true;
            let declaration = Declaration {
                kind: DeclarationKind::Function(function),
                scope: Some(library.id),
            };
            members.push(Member::declared(declaration, Type::function(function_type)));
        }
    }
    Ok(members)
}

fn same_ignoring_location(a: &Type, b: &Type) -> bool {
    a.with_location(DataLocation::Memory, false) == b.with_location(DataLocation::Memory, false)
}
