use crate::{
    ast::{
        ast::{StateMutability, Visibility},
        expressions::{
            AssignmentExpr, AwaitExpr, BinaryExpr, BinaryOperator, ConditionalExpr, ExprKind, Expression, Identifier,
            IndexAccessExpr, IndexRangeAccessExpr, Literal, LiteralKind, NewExpr, TupleExpr, UnaryExpr, UnaryOperator,
        },
    },
    errors::errors::{ErrorImpl, InternalError},
};

use super::{
    calls::{type_check_call_options, type_check_function_call},
    declarations::{Declaration, DeclarationKind, Resolved},
    members::type_check_member_access,
    rational::{parse_number_literal, BigInt, BigUint, Rational},
    storage::check_double_storage_assignment,
    type_checker::{elementary_type, ExpressionContext, TypeChecker},
    types::{ArrayKind, CallKind, DataLocation, FunctionType, RationalNumber, Type},
};

/// Infers, validates and annotates `expr`. Every expression is visited
/// exactly once.
pub fn type_check_expr<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    ctx: &ExpressionContext,
) -> Result<Type, InternalError> {
    let type_ = match &expr.kind {
        ExprKind::Identifier(identifier) => type_check_identifier(checker, expr, identifier, ctx)?,
        ExprKind::ElementaryTypeName(elementary) => match elementary_type(&elementary.name, elementary.payable) {
            Ok(type_) => Type::TypeType(Box::new(type_)),
            Err(error) => {
                checker.record_error(error, &expr.span);
                Type::Invalid
            }
        },
        ExprKind::Literal(literal) => type_check_literal(checker, expr, literal),
        ExprKind::Unary(unary) => type_check_unary(checker, expr, unary)?,
        ExprKind::Binary(binary) => type_check_binary(checker, expr, binary)?,
        ExprKind::Assignment(assignment) => type_check_assignment(checker, expr, assignment)?,
        ExprKind::Conditional(conditional) => type_check_conditional(checker, expr, conditional)?,
        ExprKind::Tuple(tuple) => type_check_tuple(checker, expr, tuple, ctx)?,
        ExprKind::FunctionCall(call) => type_check_function_call(checker, expr, call)?,
        ExprKind::CallOptions(options) => type_check_call_options(checker, expr, options, ctx)?,
        ExprKind::New(new_expr) => type_check_new(checker, expr, new_expr)?,
        ExprKind::Await(await_expr) => type_check_await(checker, expr, await_expr)?,
        ExprKind::MemberAccess(member) => type_check_member_access(checker, expr, member, ctx)?,
        ExprKind::IndexAccess(index) => type_check_index_access(checker, expr, index, ctx)?,
        ExprKind::IndexRangeAccess(range) => type_check_index_range_access(checker, expr, range)?,
    };
    checker.annotate(expr, type_)
}

/// Visits `expr` and requires it to be implicitly convertible to `expected`.
pub fn expect_type<'a>(checker: &mut TypeChecker<'a>, expr: &'a Expression, expected: &Type) -> Result<Type, InternalError> {
    let actual = type_check_expr(checker, expr, &ExpressionContext::default())?;
    if !actual.is_implicitly_convertible_to(expected) {
        checker.record_error(
            ErrorImpl::TypeMismatch {
                expected: expected.to_string(),
                received: actual.to_string(),
            },
            &expr.span,
        );
    }
    Ok(actual)
}

// IDENTIFIERS

fn type_check_identifier<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    identifier: &Identifier,
    ctx: &ExpressionContext,
) -> Result<Type, InternalError> {
    let Resolved::Declarations(candidates) = checker.dereference(expr)? else {
        return Ok(Type::Invalid);
    };

    // external functions of a contract are only reachable through `this`
    let (external, candidates): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(|(_, declaration)| is_external_member(declaration));
    if candidates.is_empty() {
        if !external.is_empty() {
            checker.record_error(
                ErrorImpl::ExternalOnlyReference {
                    name: identifier.name.clone(),
                },
                &expr.span,
            );
        }
        return Ok(Type::Invalid);
    }
    if candidates.len() == 1 {
        return declaration_type(checker, expr, &identifier.name, candidates[0].1);
    }

    let mut typed = Vec::with_capacity(candidates.len());
    for (_, declaration) in candidates {
        let type_ = declaration_type(checker, expr, &identifier.name, declaration)?;
        if !type_.is_invalid() {
            typed.push((declaration, type_));
        }
    }
    Ok(checker.clean_overloaded_declarations(&identifier.name, typed, ctx.arguments, &expr.span))
}

fn is_external_member(declaration: &Declaration) -> bool {
    matches!(declaration.kind, DeclarationKind::Function(function) if function.visibility == Visibility::External)
        && declaration.scope.is_some()
}

/// Type of a reference to `declaration` by plain name.
fn declaration_type(
    checker: &mut TypeChecker,
    expr: &Expression,
    name: &str,
    declaration: Declaration,
) -> Result<Type, InternalError> {
    Ok(match declaration.kind {
        DeclarationKind::Variable(variable) => checker.variable_type(variable)?,
        DeclarationKind::Function(function) => Type::function(checker.function_type(function, CallKind::Internal)?),
        DeclarationKind::Modifier(modifier) => checker.modifier_type(modifier)?,
        DeclarationKind::Event(event) => checker.event_type(event)?,
        DeclarationKind::Message(message) => checker.message_type(message)?,
        DeclarationKind::Struct(structure) => Type::TypeType(Box::new(checker.struct_type(
            structure,
            declaration.scope,
            DataLocation::Storage,
            true,
        ))),
        DeclarationKind::Contract(contract) => Type::TypeType(Box::new(checker.contract_type(contract))),
        DeclarationKind::Magic(global) => match checker.global_type(global) {
            Some(type_) => type_,
            None => {
                checker.record_error(ErrorImpl::UnresolvedReference { name: String::from(name) }, &expr.span);
                Type::Invalid
            }
        },
    })
}

// LITERALS

fn type_check_literal(checker: &mut TypeChecker, expr: &Expression, literal: &Literal) -> Type {
    let invalid = |checker: &mut TypeChecker, message: &str| {
        checker.record_error(
            ErrorImpl::InvalidLiteral {
                value: literal.value.clone(),
                message: String::from(message),
            },
            &expr.span,
        );
        Type::Invalid
    };

    match literal.kind {
        LiteralKind::Bool => Type::Bool,
        LiteralKind::String => Type::StringLiteral(literal.value.clone()),
        LiteralKind::HexString => match decode_hex(&literal.value) {
            Some(bytes) => Type::StringLiteral(String::from_utf8_lossy(&bytes).into_owned()),
            None => invalid(checker, "Expected even number of hex-nibbles."),
        },
        LiteralKind::Number => {
            let value = match parse_number_literal(&literal.value) {
                Ok(value) => value,
                Err(message) => return invalid(checker, &message),
            };
            let value = match literal.sub_denomination {
                Some(unit) => {
                    let multiplier = Rational::integer(BigInt::new(false, BigUint::from_u64(unit.multiplier())));
                    match value.mul(&multiplier) {
                        Some(value) => value,
                        None => return invalid(checker, "Number literal too large."),
                    }
                }
                None => value,
            };
            if value.exceeds_limit() {
                return invalid(checker, "Number literal too large.");
            }

            let compatible_bytes = match literal.value.strip_prefix("0x") {
                Some(digits) if literal.sub_denomination.is_none() => {
                    let digits = digits.chars().filter(|c| *c != '_').count();
                    if digits % 2 == 0 && digits <= 64 {
                        Some((digits / 2) as u8)
                    } else {
                        None
                    }
                }
                _ => None,
            };
            Type::RationalNumber(RationalNumber { value, compatible_bytes })
        }
    }
}

fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    let digits: Vec<char> = digits.chars().filter(|c| *c != '_').collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let high = pair[0].to_digit(16)?;
            let low = pair[1].to_digit(16)?;
            Some((high * 16 + low) as u8)
        })
        .collect()
}

// OPERATORS

fn type_check_unary<'a>(checker: &mut TypeChecker<'a>, expr: &'a Expression, unary: &'a UnaryExpr) -> Result<Type, InternalError> {
    let modifying = matches!(
        unary.operator,
        UnaryOperator::Delete | UnaryOperator::Increment | UnaryOperator::Decrement
    );
    let ctx = if modifying {
        ExpressionContext::lvalue(false)
    } else {
        ExpressionContext::default()
    };
    let operand = type_check_expr(checker, &unary.sub_expression, &ctx)?;
    if modifying {
        require_lvalue(checker, &unary.sub_expression, false)?;
    }
    if operand.is_invalid() {
        return Ok(Type::Invalid);
    }

    let result = match (&unary.operator, &operand) {
        (UnaryOperator::Delete, _) => Some(Type::empty_tuple()),
        (UnaryOperator::Not, Type::Bool) => Some(Type::Bool),
        (UnaryOperator::BitNot, Type::Integer { .. } | Type::FixedBytes(_)) => Some(operand.clone()),
        (UnaryOperator::BitNot, Type::RationalNumber(number)) => number.value.bit_not().map(Type::rational),
        (UnaryOperator::Negate, Type::Integer { signed: true, .. }) => Some(operand.clone()),
        (UnaryOperator::Negate, Type::RationalNumber(number)) => Some(Type::rational(number.value.neg())),
        (UnaryOperator::Increment | UnaryOperator::Decrement, Type::Integer { .. }) => Some(operand.clone()),
        _ => None,
    };
    Ok(match result {
        Some(result) => result,
        None => {
            checker.record_error(
                ErrorImpl::OperatorNotApplicable {
                    operator: unary.operator.to_string(),
                    type_: operand.to_string(),
                },
                &expr.span,
            );
            Type::Invalid
        }
    })
}

fn type_check_binary<'a>(checker: &mut TypeChecker<'a>, expr: &'a Expression, binary: &'a BinaryExpr) -> Result<Type, InternalError> {
    let left = type_check_expr(checker, &binary.left, &ExpressionContext::default())?;
    let right = type_check_expr(checker, &binary.right, &ExpressionContext::default())?;
    if left.is_invalid() || right.is_invalid() {
        return Ok(Type::Invalid);
    }

    Ok(match binary_operator_result(binary.operator, &left, &right) {
        Some(result) => result,
        None => {
            checker.record_error(
                ErrorImpl::OperatorNotCompatible {
                    operator: binary.operator.to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                },
                &expr.span,
            );
            Type::Invalid
        }
    })
}

/// Result type of `left <operator> right`, `None` if the operator does not
/// apply. Operations on two literals are folded.
pub fn binary_operator_result(operator: BinaryOperator, left: &Type, right: &Type) -> Option<Type> {
    if let (Type::RationalNumber(a), Type::RationalNumber(b)) = (left, right) {
        return fold_rationals(operator, &a.value, &b.value);
    }

    if operator.is_shift() || operator == BinaryOperator::Exp {
        let base = left.mobile_type()?;
        let valid_base = if operator == BinaryOperator::Exp {
            base.is_integer()
        } else {
            matches!(base, Type::Integer { .. } | Type::FixedBytes(_))
        };
        let valid_amount = match right {
            Type::Integer { signed, .. } => !signed,
            Type::RationalNumber(number) => number.value.is_integer() && !number.value.is_negative(),
            _ => false,
        };
        return (valid_base && valid_amount).then_some(base);
    }

    let common = Type::common_type(left, right)?;
    if operator.is_boolean() {
        return (common == Type::Bool).then_some(Type::Bool);
    }
    if operator.is_comparison() {
        let comparable = if operator.is_equality() {
            common.is_value_type() && !matches!(&common, Type::Function(function) if function.kind != CallKind::External)
        } else {
            matches!(
                common,
                Type::Integer { .. } | Type::FixedBytes(_) | Type::Address { .. } | Type::Contract(_)
            )
        };
        return comparable.then_some(Type::Bool);
    }
    if operator.is_bitwise() {
        return matches!(common, Type::Integer { .. } | Type::FixedBytes(_)).then_some(common);
    }
    // arithmetic
    common.is_integer().then_some(common)
}

fn fold_rationals(operator: BinaryOperator, a: &Rational, b: &Rational) -> Option<Type> {
    if operator.is_comparison() {
        return Some(Type::Bool);
    }
    let value = match operator {
        BinaryOperator::Add => a.add(b),
        BinaryOperator::Sub => a.sub(b),
        BinaryOperator::Mul => a.mul(b),
        BinaryOperator::Div => a.div(b),
        BinaryOperator::Mod => a.rem(b),
        BinaryOperator::Exp => a.pow(b),
        BinaryOperator::Shl => a.shl(b),
        BinaryOperator::Shr => a.shr(b),
        BinaryOperator::BitAnd => a.bit_and(b),
        BinaryOperator::BitOr => a.bit_or(b),
        BinaryOperator::BitXor => a.bit_xor(b),
        _ => None,
    }?;
    (!value.exceeds_limit()).then(|| Type::rational(value))
}

fn type_check_assignment<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    assignment: &'a AssignmentExpr,
) -> Result<Type, InternalError> {
    let ordinary = assignment.operator.is_none();
    let left = type_check_expr(checker, &assignment.left, &ExpressionContext::lvalue(ordinary))?;
    require_lvalue(checker, &assignment.left, ordinary)?;
    let right = type_check_expr(checker, &assignment.right, &ExpressionContext::default())?;
    if left.is_invalid() || right.is_invalid() {
        return Ok(left);
    }

    if let Type::Tuple(components) = &left {
        if !ordinary {
            checker.record_error(
                ErrorImpl::NotAssignable {
                    message: String::from("Compound assignment is not allowed for tuple types."),
                },
                &expr.span,
            );
            return Ok(left);
        }
        match &right {
            Type::Tuple(values) if values.len() != components.len() => {
                checker.record_error(
                    ErrorImpl::InvalidTypeOperation {
                        message: format!(
                            "Different number of components on the left hand side ({}) than on the right hand side ({}).",
                            components.len(),
                            values.len()
                        ),
                    },
                    &expr.span,
                );
                return Ok(left);
            }
            _ => {}
        }
        if !right.is_implicitly_convertible_to(&left) {
            checker.record_error(
                ErrorImpl::TypeMismatch {
                    expected: left.to_string(),
                    received: right.to_string(),
                },
                &assignment.right.span,
            );
            return Ok(left);
        }
        check_double_storage_assignment(checker, expr, &assignment.left, &right)?;
        return Ok(left);
    }

    match assignment.operator {
        None => {
            if !right.is_implicitly_convertible_to(&left) {
                checker.record_error(
                    ErrorImpl::TypeMismatch {
                        expected: left.to_string(),
                        received: right.to_string(),
                    },
                    &assignment.right.span,
                );
            }
        }
        Some(operator) => {
            let result = binary_operator_result(operator, &left, &right);
            if result.as_ref() != Some(&left) {
                checker.record_error(
                    ErrorImpl::OperatorNotCompatible {
                        operator: assignment.operator_symbol(),
                        left: left.to_string(),
                        right: right.to_string(),
                    },
                    &expr.span,
                );
            }
        }
    }
    Ok(left)
}

/// Requires an already visited expression to denote an assignable location.
/// Returns whether it does.
pub fn require_lvalue(checker: &mut TypeChecker, expr: &Expression, ordinary_assignment: bool) -> Result<bool, InternalError> {
    let not_assignable = |checker: &mut TypeChecker, message: &str| {
        checker.record_error(
            ErrorImpl::NotAssignable {
                message: String::from(message),
            },
            &expr.span,
        );
        Ok(false)
    };

    let Some(type_) = checker.annotations.try_type_of(expr).cloned() else {
        return Err(InternalError::MissingAnnotation { node: expr.id });
    };
    if type_.is_invalid() {
        return Ok(true);
    }

    match &expr.kind {
        ExprKind::Tuple(tuple) if !tuple.is_inline_array => {
            let mut assignable = true;
            for component in tuple.components.iter().flatten() {
                assignable &= require_lvalue(checker, component, ordinary_assignment)?;
            }
            return Ok(assignable);
        }
        ExprKind::Tuple(_) => return not_assignable(checker, "Inline array type cannot be declared as LValue."),
        ExprKind::Identifier(identifier) => {
            let variable = identifier
                .referenced_declaration
                .and_then(|id| checker.declarations.lookup(id))
                .and_then(|declaration| match declaration.kind {
                    DeclarationKind::Variable(variable) => Some(variable),
                    _ => None,
                });
            let Some(variable) = variable else {
                return not_assignable(checker, "Expression has to be an lvalue.");
            };
            if variable.is_constant() {
                return not_assignable(checker, "Cannot assign to a constant variable.");
            }
            if variable.is_immutable() && !checker.current_function().is_some_and(|f| f.is_constructor()) {
                return not_assignable(
                    checker,
                    "Cannot write to immutable here: Immutable variables can only be initialized inline or assigned directly in the constructor.",
                );
            }
        }
        ExprKind::MemberAccess(member) => {
            let base = checker.annotations.try_type_of(&member.expression).cloned();
            match base {
                Some(Type::Struct(structure)) => {
                    if structure.location == DataLocation::CallData {
                        return not_assignable(checker, "Calldata structs are read-only.");
                    }
                }
                Some(Type::Array(_)) if member.member_name == "length" => {
                    return not_assignable(
                        checker,
                        "Member \"length\" is read-only and cannot be used to resize arrays.",
                    );
                }
                _ => return not_assignable(checker, "Expression has to be an lvalue."),
            }
        }
        ExprKind::IndexAccess(index) => {
            let base = checker.annotations.try_type_of(&index.base).cloned();
            match base {
                Some(Type::Array(array)) => {
                    if array.location == DataLocation::CallData {
                        return not_assignable(checker, "Calldata arrays are read-only.");
                    }
                }
                Some(Type::Mapping(..)) => {}
                Some(Type::FixedBytes(_)) => {
                    return not_assignable(checker, "Single bytes in fixed bytes arrays cannot be modified.");
                }
                _ => return not_assignable(checker, "Expression has to be an lvalue."),
            }
        }
        _ => return not_assignable(checker, "Expression has to be an lvalue."),
    }

    if matches!(type_, Type::Mapping(..)) {
        let message = if ordinary_assignment {
            "Mappings cannot be assigned to."
        } else {
            "Types in storage containing (nested) mappings cannot be assigned to."
        };
        return not_assignable(checker, message);
    }
    Ok(true)
}

fn type_check_conditional<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    conditional: &'a ConditionalExpr,
) -> Result<Type, InternalError> {
    expect_type(checker, &conditional.condition, &Type::Bool)?;
    let true_type = type_check_expr(checker, &conditional.true_expression, &ExpressionContext::default())?;
    let false_type = type_check_expr(checker, &conditional.false_expression, &ExpressionContext::default())?;
    if true_type.is_invalid() || false_type.is_invalid() {
        return Ok(Type::Invalid);
    }

    Ok(match Type::common_type(&true_type, &false_type) {
        Some(common) => common,
        None => {
            checker.record_error(
                ErrorImpl::NoCommonType {
                    left: true_type.to_string(),
                    right: false_type.to_string(),
                },
                &expr.span,
            );
            Type::Invalid
        }
    })
}

fn type_check_tuple<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    tuple: &'a TupleExpr,
    ctx: &ExpressionContext,
) -> Result<Type, InternalError> {
    if tuple.is_inline_array {
        return type_check_inline_array(checker, expr, tuple);
    }

    let component_ctx = ExpressionContext {
        lvalue: ctx.lvalue,
        ordinary_assignment: ctx.ordinary_assignment,
        arguments: None,
    };
    let mut types = Vec::with_capacity(tuple.components.len());
    for component in &tuple.components {
        match component {
            Some(component) => types.push(Some(type_check_expr(checker, component, &component_ctx)?)),
            None if ctx.lvalue => types.push(None),
            None => {
                checker.record_error(
                    ErrorImpl::InvalidTypeOperation {
                        message: String::from("Tuple component cannot be empty."),
                    },
                    &expr.span,
                );
                types.push(Some(Type::Invalid));
            }
        }
    }

    // a parenthesized expression is the expression itself
    if types.len() == 1 {
        if let Some(Some(single)) = types.pop() {
            return Ok(single);
        }
        return Ok(Type::Invalid);
    }
    Ok(Type::Tuple(types))
}

fn type_check_inline_array<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    tuple: &'a TupleExpr,
) -> Result<Type, InternalError> {
    let mut common: Option<Type> = None;
    let mut valid = !tuple.components.is_empty();
    for component in &tuple.components {
        let Some(component) = component else {
            checker.record_error(
                ErrorImpl::InvalidTypeOperation {
                    message: String::from("Inline array with empty component."),
                },
                &expr.span,
            );
            return Ok(Type::Invalid);
        };
        let type_ = type_check_expr(checker, component, &ExpressionContext::default())?;
        if type_.is_invalid() {
            valid = false;
            continue;
        }
        common = match common {
            None => type_.mobile_type(),
            Some(current) => Type::common_type(&current, &type_),
        };
        if common.is_none() {
            break;
        }
    }

    match common {
        Some(base) if valid => Ok(Type::array(base, Some(tuple.components.len() as u64), DataLocation::Memory)),
        _ if !valid && !tuple.components.is_empty() => Ok(Type::Invalid),
        _ => {
            checker.record_error(
                ErrorImpl::InvalidTypeOperation {
                    message: String::from("Unable to deduce common type for array elements."),
                },
                &expr.span,
            );
            Ok(Type::Invalid)
        }
    }
}

// ACCESS

fn type_check_index_access<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    index_access: &'a IndexAccessExpr,
    ctx: &ExpressionContext,
) -> Result<Type, InternalError> {
    let base = type_check_expr(checker, &index_access.base, &ExpressionContext::default())?;
    let index = &index_access.index;

    let missing_index = |checker: &mut TypeChecker| {
        checker.record_error(
            ErrorImpl::InvalidIndexOperation {
                message: String::from("Index expression cannot be omitted."),
            },
            &expr.span,
        );
        Ok(Type::Invalid)
    };

    match base {
        Type::Invalid => {
            if let Some(index) = index {
                type_check_expr(checker, index, &ExpressionContext::default())?;
            }
            Ok(Type::Invalid)
        }
        Type::Array(array) => {
            let Some(index) = index else {
                return missing_index(checker);
            };
            let index_type = expect_type(checker, index, &Type::uint256())?;
            if array.is_string() {
                checker.record_error(
                    ErrorImpl::InvalidIndexOperation {
                        message: String::from("Index access for string is not possible."),
                    },
                    &expr.span,
                );
                return Ok(Type::Invalid);
            }
            if let (Some(length), Type::RationalNumber(number)) = (array.length, &index_type) {
                if number.value >= Rational::integer(BigInt::new(false, BigUint::from_u64(length))) {
                    checker.record_error(
                        ErrorImpl::InvalidIndexOperation {
                            message: String::from("Out of bounds array access."),
                        },
                        &expr.span,
                    );
                }
            }
            Ok(match array.kind {
                ArrayKind::Ordinary(base) => base.with_location(array.location, false),
                ArrayKind::Bytes | ArrayKind::String => Type::FixedBytes(1),
            })
        }
        Type::Mapping(key, value) => {
            let Some(index) = index else {
                return missing_index(checker);
            };
            expect_type(checker, index, &key)?;
            Ok(value.with_location(DataLocation::Storage, false))
        }
        Type::FixedBytes(size) => {
            let Some(index) = index else {
                return missing_index(checker);
            };
            let index_type = expect_type(checker, index, &Type::uint256())?;
            if let Type::RationalNumber(number) = &index_type {
                if number.value >= Rational::from_i64(size as i64) {
                    checker.record_error(
                        ErrorImpl::InvalidIndexOperation {
                            message: String::from("Out of bounds array access."),
                        },
                        &expr.span,
                    );
                }
            }
            Ok(Type::FixedBytes(1))
        }
        Type::TypeType(actual) => {
            // `T[n]` used as a type expression
            let length = match index {
                None => None,
                Some(index) => {
                    let index_type = type_check_expr(checker, index, &ExpressionContext::default())?;
                    match checker.evaluate_constant(index)? {
                        Some(value) if !value.is_zero() && value.to_u64().is_some() => value.to_u64(),
                        _ => {
                            if !index_type.is_invalid() {
                                checker.record_error(
                                    ErrorImpl::InvalidIndexOperation {
                                        message: String::from("Integer constant expected."),
                                    },
                                    &index.span,
                                );
                            }
                            return Ok(Type::Invalid);
                        }
                    }
                }
            };
            if ctx.lvalue {
                checker.record_error(
                    ErrorImpl::NotAssignable {
                        message: String::from("Expression has to be an lvalue."),
                    },
                    &expr.span,
                );
            }
            Ok(Type::TypeType(Box::new(Type::array(*actual, length, DataLocation::Memory))))
        }
        other => {
            if let Some(index) = index {
                type_check_expr(checker, index, &ExpressionContext::default())?;
            }
            checker.record_error(
                ErrorImpl::InvalidIndexOperation {
                    message: format!("Indexed expression has to be a type, mapping or array (is {}).", other),
                },
                &expr.span,
            );
            Ok(Type::Invalid)
        }
    }
}

fn type_check_index_range_access<'a>(
    checker: &mut TypeChecker<'a>,
    expr: &'a Expression,
    range: &'a IndexRangeAccessExpr,
) -> Result<Type, InternalError> {
    let base = type_check_expr(checker, &range.base, &ExpressionContext::default())?;
    if let Some(start) = &range.start {
        expect_type(checker, start, &Type::uint256())?;
    }
    if let Some(end) = &range.end {
        expect_type(checker, end, &Type::uint256())?;
    }

    match base {
        Type::Invalid => Ok(Type::Invalid),
        Type::Array(array) if array.location == DataLocation::CallData && array.length.is_none() => {
            Ok(Type::Array(array))
        }
        _ => {
            checker.record_error(
                ErrorImpl::InvalidIndexOperation {
                    message: String::from("Index range access is only supported for dynamic calldata arrays."),
                },
                &expr.span,
            );
            Ok(Type::Invalid)
        }
    }
}

// CREATION AND MESSAGES

fn type_check_new(checker: &mut TypeChecker, expr: &Expression, new_expr: &NewExpr) -> Result<Type, InternalError> {
    let invalid = |checker: &mut TypeChecker, message: &str| {
        checker.record_error(
            ErrorImpl::InvalidNewExpression {
                message: String::from(message),
            },
            &expr.span,
        );
        Ok(Type::Invalid)
    };

    let resolved = match checker.resolve_type_name(&new_expr.type_name, DataLocation::Memory, false)? {
        Ok(resolved) => resolved,
        Err(error) => {
            checker.record_error(error, &new_expr.type_name.span);
            return Ok(Type::Invalid);
        }
    };

    match resolved {
        Type::Contract(contract_type) => {
            let Some(contract) = checker.declarations.contract(contract_type.id) else {
                return Ok(Type::Invalid);
            };
            if contract.is_interface() {
                return invalid(checker, "Cannot instantiate an interface.");
            }
            if contract.is_library() {
                return invalid(checker, "Instantiating libraries is not supported yet.");
            }
            if contract.is_abstract {
                return invalid(checker, "Cannot instantiate an abstract contract.");
            }
            if let Some(current) = checker.current_contract() {
                if contract_type.bases.contains(&current.id) {
                    return invalid(
                        checker,
                        "Circular reference to contract bytecode either via \"new\" or \"type(...).creationCode\" / \"type(...).runtimeCode\".",
                    );
                }
            }
            let (mut function, mutability) = match contract.constructor() {
                Some(constructor) => (
                    checker.function_type(constructor, CallKind::External)?,
                    constructor.state_mutability,
                ),
                None => (
                    FunctionType::new(CallKind::External, vec![], vec![], StateMutability::NonPayable),
                    StateMutability::NonPayable,
                ),
            };
            function.kind = CallKind::Creation;
            function.state_mutability = mutability;
            function.return_names = vec![String::new()];
            function.return_types = vec![Type::Contract(contract_type)];
            Ok(Type::function(function))
        }
        Type::Array(array) => {
            if array.length.is_some() {
                return invalid(
                    checker,
                    "Length has to be placed in parentheses after the array type for new expression.",
                );
            }
            let array = Type::Array(array);
            let mut function = FunctionType::new(
                CallKind::ObjectCreation,
                vec![Type::uint256()],
                vec![array],
                StateMutability::Pure,
            );
            function.parameter_names = vec![String::from("length")];
            Ok(Type::function(function))
        }
        _ => invalid(checker, "Contract or array type expected."),
    }
}

fn type_check_await<'a>(checker: &mut TypeChecker<'a>, expr: &'a Expression, await_expr: &'a AwaitExpr) -> Result<Type, InternalError> {
    let handle = type_check_expr(checker, &await_expr.expression, &ExpressionContext::default())?;
    match handle {
        Type::Invalid => Ok(Type::Invalid),
        Type::MessageHandle(mut returns) => {
            if returns.len() == 1 {
                Ok(returns.remove(0))
            } else {
                Ok(Type::tuple(returns))
            }
        }
        other => {
            checker.record_error(ErrorImpl::NotAwaitable { type_: other.to_string() }, &expr.span);
            Ok(Type::Invalid)
        }
    }
}
