//! Function calls: argument checks, builtins, conversions, the ABI family
//! and call options.

use std::collections::HashSet;

use crate::{
    ast::expressions::{CallOptionsExpr, Expression, FunctionCallExpr},
    errors::errors::{ErrorImpl, InternalError},
    Span,
};

use super::{
    abi::{abi_encodable, contains_mapping, type_supported_by_legacy_encoder},
    expressions::type_check_expr,
    type_checker::{ExpressionContext, TypeChecker},
    types::{CallKind, DataLocation, FunctionType, MagicKind, Type},
};

/// Argument types of a call site, visited before the callee so that
/// overloaded callees can be narrowed.
#[derive(Debug, Clone, Default)]
pub struct CallArguments {
    pub types: Vec<Type>,
    /// Empty for positional calls.
    pub names: Vec<String>,
    pub spans: Vec<Span>,
}

impl CallArguments {
    pub fn visit<'a>(checker: &mut TypeChecker<'a>, arguments: &'a [Expression]) -> Result<Self, InternalError> {
        let mut types = Vec::with_capacity(arguments.len());
        for argument in arguments {
            types.push(type_check_expr(checker, argument, &ExpressionContext::default())?);
        }
        Ok(CallArguments {
            types,
            names: vec![],
            spans: arguments.iter().map(|argument| argument.span.clone()).collect(),
        })
    }

    pub fn with_names(mut self, names: &[String]) -> Self {
        self.names = names.to_vec();
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Static applicability used for overload narrowing.
    pub fn can_be_passed_to(&self, function: &FunctionType) -> bool {
        if function.arbitrary_parameters {
            return true;
        }
        if self.types.len() != function.parameter_types.len() {
            return false;
        }
        if self.names.is_empty() {
            return self
                .types
                .iter()
                .zip(&function.parameter_types)
                .all(|(argument, parameter)| argument.is_implicitly_convertible_to(parameter));
        }
        self.names.iter().zip(&self.types).all(|(name, argument)| {
            match function.parameter_names.iter().position(|parameter| parameter == name) {
                Some(index) => argument.is_implicitly_convertible_to(&function.parameter_types[index]),
                None => false,
            }
        })
    }
}

/// Argument count, named argument and argument type checks shared by every
/// kind of call.
pub fn check_call_arguments(
    checker: &mut TypeChecker,
    context: &str,
    parameters: &[Type],
    parameter_names: &[String],
    arguments: &CallArguments,
    span: &Span,
) {
    if arguments.len() != parameters.len() {
        checker.record_error(
            ErrorImpl::ArgumentCount {
                context: String::from(context),
                given: arguments.len(),
                expected: parameters.len(),
            },
            span,
        );
        return;
    }

    if arguments.names.is_empty() {
        for (index, (argument, parameter)) in arguments.types.iter().zip(parameters).enumerate() {
            if !argument.is_implicitly_convertible_to(parameter) {
                checker.record_error(
                    ErrorImpl::ArgumentType {
                        context: String::from(context),
                        expected: parameter.to_string(),
                        received: argument.to_string(),
                    },
                    &arguments.spans[index],
                );
            }
        }
        return;
    }

    let mut seen = HashSet::new();
    for (index, (name, argument)) in arguments.names.iter().zip(&arguments.types).enumerate() {
        let span = arguments.spans.get(index).unwrap_or(span);
        if !seen.insert(name) {
            checker.record_error(ErrorImpl::DuplicateNamedArgument { name: name.clone() }, span);
            continue;
        }
        let Some(position) = parameter_names.iter().position(|parameter| parameter == name) else {
            checker.record_error(ErrorImpl::UnknownNamedArgument { name: name.clone() }, span);
            continue;
        };
        if !argument.is_implicitly_convertible_to(&parameters[position]) {
            checker.record_error(
                ErrorImpl::ArgumentType {
                    context: String::from(context),
                    expected: parameters[position].to_string(),
                    received: argument.to_string(),
                },
                span,
            );
        }
    }
}

/// Named calls carry one name per argument; anything else is a malformed AST.
fn check_argument_names(expr: &Expression, names: usize, values: usize) -> Result<(), InternalError> {
    if names != 0 && names != values {
        return Err(InternalError::ArgumentNamesMismatch {
            node: expr.id,
            names,
            values,
        });
    }
    Ok(())
}

pub fn type_check_function_call<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    call: &'a FunctionCallExpr,
) -> Result<Type, InternalError> {
    check_argument_names(expr, call.names.len(), call.arguments.len())?;
    // only the outermost call of an emit statement is the event invocation
    let emitted = std::mem::replace(&mut checker.inside_emit_statement, false);
    let arguments = CallArguments::visit(checker, &call.arguments)?.with_names(&call.names);
    let callee = type_check_expr(checker, &call.expression, &ExpressionContext::callee(&arguments))?;

    match callee {
        Type::Invalid | Type::Overloaded(_) => Ok(Type::Invalid),
        Type::TypeType(actual) => match *actual {
            Type::Struct(structure) => {
                type_check_struct_constructor(checker, expr, Type::Struct(structure), &arguments)
            }
            actual => Ok(type_check_conversion(checker, expr, call, actual, &arguments)),
        },
        Type::Function(function) => type_check_call(checker, expr, call, *function, &arguments, emitted),
        other => {
            checker.record_error(ErrorImpl::NotCallable { type_: other.to_string() }, &expr.span);
            Ok(Type::Invalid)
        }
    }
}

fn type_check_call<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    call: &'a FunctionCallExpr,
    function: FunctionType,
    arguments: &CallArguments,
    emitted: bool,
) -> Result<Type, InternalError> {
    match function.kind {
        CallKind::AbiEncode
        | CallKind::AbiEncodePacked
        | CallKind::AbiEncodeWithSelector
        | CallKind::AbiEncodeWithSignature => {
            type_check_abi_encode_call(checker, expr, &function, arguments);
            return Ok(Type::bytes_memory());
        }
        CallKind::AbiDecode => return Ok(type_check_abi_decode_call(checker, expr, call, arguments)),
        CallKind::MetaType => return Ok(type_check_meta_type(checker, expr, arguments)),
        CallKind::Event if !emitted => {
            checker.record_error(
                ErrorImpl::InvalidTypeOperation {
                    message: String::from("Event invocations have to be prefixed by \"emit\"."),
                },
                &expr.span,
            );
        }
        CallKind::Selfdestruct => {
            checker.record_warning(
                ErrorImpl::Deprecated {
                    message: String::from(
                        "\"selfdestruct\" has been deprecated. The underlying opcode will eventually undergo breaking changes, and its use is not recommended.",
                    ),
                },
                &expr.span,
            );
        }
        _ => {}
    }

    let context = match function.kind {
        CallKind::Event => "event invocation",
        CallKind::Creation => "constructor call",
        CallKind::Message => "message call",
        _ => "function call",
    };
    check_call_arguments(
        checker,
        context,
        &function.parameter_types,
        &function.parameter_names,
        arguments,
        &expr.span,
    );

    if matches!(function.kind, CallKind::External | CallKind::DelegateCall)
        && !checker.settings.evm_version.supports_returndata()
        && function.return_types.iter().any(Type::is_dynamically_sized)
    {
        checker.record_error(
            ErrorImpl::FeatureUnavailable {
                feature: String::from("returning dynamically-sized data from an external call"),
                evm_version: checker.settings.evm_version.to_string(),
            },
            &expr.span,
        );
    }

    Ok(function.call_result())
}

fn type_check_struct_constructor(
    checker: &mut TypeChecker,
    expr: &Expression,
    structure: Type,
    arguments: &CallArguments,
) -> Result<Type, InternalError> {
    let Type::Struct(struct_type) = structure.with_location(DataLocation::Memory, false) else {
        return Ok(Type::Invalid);
    };
    let result = Type::Struct(struct_type.clone());
    if contains_mapping(&result, &*checker) {
        checker.record_error(
            ErrorImpl::InvalidTypeOperation {
                message: String::from("Struct containing a (nested) mapping cannot be constructed."),
            },
            &expr.span,
        );
        return Ok(result);
    }
    let members = checker.struct_members(struct_type.id, DataLocation::Memory)?;
    let names: Vec<String> = members.iter().map(|(name, _)| name.clone()).collect();
    let types: Vec<Type> = members.into_iter().map(|(_, type_)| type_).collect();
    check_call_arguments(checker, "struct constructor", &types, &names, arguments, &expr.span);
    Ok(result)
}

fn type_check_conversion(
    checker: &mut TypeChecker,
    expr: &Expression,
    call: &FunctionCallExpr,
    target: Type,
    arguments: &CallArguments,
) -> Type {
    if arguments.len() != 1 || !call.names.is_empty() {
        checker.record_error(
            ErrorImpl::InvalidTypeOperation {
                message: String::from("Exactly one argument expected for explicit type conversion."),
            },
            &expr.span,
        );
        return target;
    }
    let argument = &arguments.types[0];
    if argument.is_invalid() {
        return target;
    }

    let result = match (argument.data_location(), target.is_reference_type()) {
        (Some(location), true) => target.with_location(location, location == DataLocation::Storage),
        (None, true) => target.with_location(DataLocation::Memory, false),
        _ => target,
    };
    if !argument.is_explicitly_convertible_to(&result) {
        checker.record_error(
            ErrorImpl::ExplicitConversionNotAllowed {
                from: argument.to_string(),
                to: result.to_string(),
            },
            &expr.span,
        );
    }
    result
}

fn type_check_meta_type(checker: &mut TypeChecker, expr: &Expression, arguments: &CallArguments) -> Type {
    if arguments.len() != 1 {
        checker.record_error(
            ErrorImpl::ArgumentCount {
                context: String::from("type(...)"),
                given: arguments.len(),
                expected: 1,
            },
            &expr.span,
        );
        return Type::Invalid;
    }
    match &arguments.types[0] {
        Type::Invalid => Type::Invalid,
        Type::TypeType(actual) if matches!(**actual, Type::Contract(_) | Type::Integer { .. }) => {
            Type::Magic(MagicKind::MetaType(actual.clone()))
        }
        other => {
            checker.record_error(
                ErrorImpl::InvalidTypeOperation {
                    message: format!(
                        "Invalid type for argument in the function call. A contract type or an integer type is required, but {} provided.",
                        other
                    ),
                },
                &arguments.spans[0],
            );
            Type::Invalid
        }
    }
}

fn type_check_abi_encode_call(
    checker: &mut TypeChecker,
    expr: &Expression,
    function: &FunctionType,
    arguments: &CallArguments,
) {
    if !arguments.names.is_empty() {
        checker.record_error(
            ErrorImpl::InvalidTypeOperation {
                message: String::from("Named arguments cannot be used for functions that take arbitrary parameters."),
            },
            &expr.span,
        );
        return;
    }

    // encodeWithSelector and encodeWithSignature take a fixed first argument
    let fixed = function.parameter_types.len();
    if arguments.len() < fixed {
        checker.record_error(
            ErrorImpl::ArgumentCount {
                context: String::from("function call"),
                given: arguments.len(),
                expected: fixed,
            },
            &expr.span,
        );
        return;
    }
    for index in 0..fixed {
        let argument = &arguments.types[index];
        if !argument.is_implicitly_convertible_to(&function.parameter_types[index]) {
            checker.record_error(
                ErrorImpl::ArgumentType {
                    context: String::from("function call"),
                    expected: function.parameter_types[index].to_string(),
                    received: argument.to_string(),
                },
                &arguments.spans[index],
            );
        }
    }

    let packed = function.kind == CallKind::AbiEncodePacked;
    let use_v2 = checker.use_abi_coder_v2();
    for index in fixed..arguments.len() {
        let argument = &arguments.types[index];
        let span = &arguments.spans[index];
        if argument.is_invalid() {
            continue;
        }
        if let Type::RationalNumber(number) = argument {
            let message = if !number.value.is_integer() {
                "Fractional numbers cannot yet be encoded."
            } else if packed {
                "Cannot perform packed encoding for a literal. Please convert it to an explicit type first."
            } else if argument.mobile_type().is_none() {
                "Invalid rational number (too large or division by zero)."
            } else {
                continue;
            };
            checker.record_error(
                ErrorImpl::NotAbiEncodable {
                    type_: argument.to_string(),
                    message: String::from(message),
                },
                span,
            );
            continue;
        }

        let Some(encoded) = argument.mobile_type() else {
            continue;
        };
        if packed && !supported_in_packed_mode(&encoded) {
            checker.record_error(
                ErrorImpl::NotAbiEncodable {
                    type_: encoded.to_string(),
                    message: String::from("Type not supported in packed mode."),
                },
                span,
            );
            continue;
        }
        if !abi_encodable(&encoded, &*checker) {
            checker.record_error(
                ErrorImpl::NotAbiEncodable {
                    type_: encoded.to_string(),
                    message: String::from("This type cannot be encoded."),
                },
                span,
            );
        } else if !use_v2 && !type_supported_by_legacy_encoder(&encoded, false, &*checker) {
            checker.record_error(
                ErrorImpl::NotAbiEncodable {
                    type_: encoded.to_string(),
                    message: String::from(
                        "This type is only supported in ABI coder v2. Use \"pragma abicoder v2;\" to enable the feature.",
                    ),
                },
                span,
            );
        }
    }
}

fn supported_in_packed_mode(type_: &Type) -> bool {
    match type_ {
        Type::Struct(_) => false,
        Type::Array(array) if array.is_byte_array() => true,
        Type::Array(array) => {
            let base = array.base_type();
            base.is_value_type() && !matches!(base, Type::Function(_))
        }
        other => other.is_value_type(),
    }
}

fn type_check_abi_decode_call(
    checker: &mut TypeChecker,
    expr: &Expression,
    call: &FunctionCallExpr,
    arguments: &CallArguments,
) -> Type {
    if arguments.len() != 2 {
        checker.record_error(
            ErrorImpl::InvalidAbiDecodeUsage {
                message: format!(
                    "This function takes two arguments, but {} were provided.",
                    arguments.len()
                ),
            },
            &expr.span,
        );
        return Type::Invalid;
    }
    if !call.names.is_empty() {
        checker.record_error(
            ErrorImpl::InvalidAbiDecodeUsage {
                message: String::from("Named arguments cannot be used for functions that take arbitrary parameters."),
            },
            &expr.span,
        );
        return Type::Invalid;
    }

    let data = &arguments.types[0];
    if !data.is_invalid()
        && !data.is_implicitly_convertible_to(&Type::bytes_memory())
        && !data.is_implicitly_convertible_to(&Type::bytes(DataLocation::CallData))
    {
        checker.record_error(
            ErrorImpl::InvalidAbiDecodeUsage {
                message: format!(
                    "The first argument to \"abi.decode\" must be implicitly convertible to bytes memory or bytes calldata, but is of type {}.",
                    data
                ),
            },
            &arguments.spans[0],
        );
    }

    let decoded: Option<Vec<Type>> = match &arguments.types[1] {
        Type::Invalid => return Type::Invalid,
        Type::TypeType(actual) => Some(vec![(**actual).clone()]),
        Type::Tuple(components) => components
            .iter()
            .map(|component| match component {
                Some(Type::TypeType(actual)) => Some((**actual).clone()),
                _ => None,
            })
            .collect(),
        _ => None,
    };
    let Some(decoded) = decoded else {
        checker.record_error(
            ErrorImpl::InvalidAbiDecodeUsage {
                message: String::from("The second argument to \"abi.decode\" has to be a tuple of types."),
            },
            &arguments.spans[1],
        );
        return Type::Invalid;
    };

    let mut results = vec![];
    for type_ in decoded {
        let type_ = type_.with_location(DataLocation::Memory, false);
        if !abi_encodable(&type_, &*checker) {
            checker.record_error(
                ErrorImpl::NotAbiEncodable {
                    type_: type_.to_string(),
                    message: String::from("Decoding type not supported."),
                },
                &arguments.spans[1],
            );
            results.push(Type::Invalid);
        } else {
            results.push(type_);
        }
    }
    if results.len() == 1 {
        results.remove(0)
    } else {
        Type::tuple(results)
    }
}

/// `f{value: v, gas: g, salt: s}`
pub fn type_check_call_options<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    call_options: &'a CallOptionsExpr,
    ctx: &ExpressionContext,
) -> Result<Type, InternalError> {
    let callee_ctx = ExpressionContext {
        lvalue: false,
        ordinary_assignment: false,
        arguments: ctx.arguments,
    };
    if call_options.names.len() != call_options.options.len() {
        return Err(InternalError::ArgumentNamesMismatch {
            node: expr.id,
            names: call_options.names.len(),
            values: call_options.options.len(),
        });
    }
    let callee = type_check_expr(checker, &call_options.expression, &callee_ctx)?;
    let mut options = vec![];
    for option in &call_options.options {
        options.push(type_check_expr(checker, option, &ExpressionContext::default())?);
    }

    let mut function = match callee {
        Type::Invalid => return Ok(Type::Invalid),
        Type::Function(function)
            if matches!(
                function.kind,
                CallKind::External
                    | CallKind::Creation
                    | CallKind::Message
                    | CallKind::DelegateCall
                    | CallKind::BareCall
                    | CallKind::BareDelegateCall
                    | CallKind::BareStaticCall
            ) =>
        {
            *function
        }
        _ => {
            checker.record_error(
                ErrorImpl::InvalidCallOption {
                    message: String::from(
                        "Function call options can only be set on external function calls or contract creations.",
                    ),
                },
                &expr.span,
            );
            return Ok(Type::Invalid);
        }
    };

    let mut seen = HashSet::new();
    for ((name, option), option_type) in call_options.names.iter().zip(&call_options.options).zip(&options) {
        let span = &option.span;
        if !seen.insert(name.as_str()) {
            checker.record_error(
                ErrorImpl::InvalidCallOption {
                    message: format!("Duplicate option \"{}\".", name),
                },
                span,
            );
            continue;
        }
        let expected = match name.as_str() {
            "salt" => {
                if function.kind != CallKind::Creation {
                    option_error(checker, "Function call option \"salt\" can only be used with \"new\".", span);
                    continue;
                }
                if !checker.settings.evm_version.has_create2() {
                    checker.record_error(
                        ErrorImpl::FeatureUnavailable {
                            feature: String::from("salt"),
                            evm_version: checker.settings.evm_version.to_string(),
                        },
                        span,
                    );
                    continue;
                }
                if function.salt_set {
                    option_error(checker, "Option \"salt\" has already been set.", span);
                    continue;
                }
                function.salt_set = true;
                Type::FixedBytes(32)
            }
            "value" => {
                if matches!(function.kind, CallKind::DelegateCall | CallKind::BareDelegateCall) {
                    option_error(checker, "Cannot set option \"value\" for delegatecall.", span);
                    continue;
                }
                if function.kind == CallKind::BareStaticCall {
                    option_error(checker, "Cannot set option \"value\" for staticcall.", span);
                    continue;
                }
                if !function.is_payable() {
                    option_error(checker, "Cannot set option \"value\" on a non-payable function type.", span);
                    continue;
                }
                if function.value_set {
                    option_error(checker, "Option \"value\" has already been set.", span);
                    continue;
                }
                function.value_set = true;
                Type::uint256()
            }
            "gas" => {
                if matches!(function.kind, CallKind::Creation | CallKind::Message) {
                    option_error(checker, "Function call option \"gas\" cannot be used with \"new\" or messages.", span);
                    continue;
                }
                if function.gas_set {
                    option_error(checker, "Option \"gas\" has already been set.", span);
                    continue;
                }
                function.gas_set = true;
                Type::uint256()
            }
            _ => {
                checker.record_error(
                    ErrorImpl::InvalidCallOption {
                        message: format!(
                            "Unknown call option \"{}\". Valid options are \"salt\", \"value\" and \"gas\".",
                            name
                        ),
                    },
                    span,
                );
                continue;
            }
        };
        if !option_type.is_implicitly_convertible_to(&expected) {
            checker.record_error(
                ErrorImpl::TypeMismatch {
                    expected: expected.to_string(),
                    received: option_type.to_string(),
                },
                span,
            );
        }
    }

    Ok(Type::function(function))
}

fn option_error(checker: &mut TypeChecker, message: &str, span: &Span) {
    checker.record_error(
        ErrorImpl::InvalidCallOption {
            message: String::from(message),
        },
        span,
    );
}
