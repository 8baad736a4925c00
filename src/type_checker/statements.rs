use crate::{
    ast::{
        declarations::VariableDeclaration,
        expressions::{ExprKind, Expression},
        statements::{Block, ReturnStmt, Statement, StmtKind, TryCatchClause, TryStmt, VariableDeclarationStmt},
    },
    errors::errors::{ErrorImpl, InternalError},
    Span,
};

use super::{
    expressions::{expect_type, type_check_expr},
    type_checker::{ExpressionContext, TypeChecker},
    types::{CallKind, DataLocation, Type},
    variables::{declare_variable, VariableContext},
};

pub fn type_check_block<'a>(checker: &mut TypeChecker<'a>, block: &'a Block) -> Result<(), InternalError> {
    for statement in block.iter() {
        type_check_stmt(checker, statement)?;
    }
    Ok(())
}

pub fn type_check_stmt<'a>(checker: &mut TypeChecker<'a>, statement: &'a Statement) -> Result<(), InternalError> {
    match &statement.kind {
        StmtKind::Block(block) => type_check_block(checker, block)?,
        StmtKind::Placeholder => {
            if checker.current_modifier().is_none() {
                invalid_statement(checker, "\"_\" can only be used inside a modifier body.", &statement.span);
            }
        }
        StmtKind::If(if_stmt) => {
            expect_type(checker, &if_stmt.condition, &Type::Bool)?;
            type_check_stmt(checker, &if_stmt.true_body)?;
            if let Some(false_body) = &if_stmt.false_body {
                type_check_stmt(checker, false_body)?;
            }
        }
        StmtKind::While(while_stmt) => {
            expect_type(checker, &while_stmt.condition, &Type::Bool)?;
            type_check_stmt(checker, &while_stmt.body)?;
        }
        StmtKind::For(for_stmt) => {
            if let Some(initialization) = &for_stmt.initialization {
                type_check_stmt(checker, initialization)?;
            }
            if let Some(condition) = &for_stmt.condition {
                expect_type(checker, condition, &Type::Bool)?;
            }
            if let Some(loop_expression) = &for_stmt.loop_expression {
                type_check_expr(checker, loop_expression, &ExpressionContext::default())?;
            }
            type_check_stmt(checker, &for_stmt.body)?;
        }
        StmtKind::Continue | StmtKind::Break => {}
        StmtKind::Return(return_stmt) => type_check_return(checker, statement, return_stmt)?,
        StmtKind::Emit(emit) => {
            checker.inside_emit_statement = true;
            type_check_expr(checker, &emit.event_call, &ExpressionContext::default())?;
            checker.inside_emit_statement = false;
            if callee_kind(checker, &emit.event_call) != Some(CallKind::Event) {
                invalid_statement(checker, "Expression has to be an event invocation.", &emit.event_call.span);
            }
        }
        StmtKind::VariableDeclaration(declaration) => type_check_variable_declaration_stmt(checker, statement, declaration)?,
        StmtKind::Expression(expression_stmt) => {
            let expression = &expression_stmt.expression;
            type_check_expr(checker, expression, &ExpressionContext::default())?;
            let unused = match callee_kind(checker, expression) {
                Some(CallKind::BareCall | CallKind::BareDelegateCall | CallKind::BareStaticCall) => {
                    Some("Return value of low-level calls not used.")
                }
                Some(CallKind::Send) => Some("Failure condition of 'send' ignored. Consider using 'transfer' instead."),
                _ => None,
            };
            if let Some(message) = unused {
                checker.record_warning(
                    ErrorImpl::UnusedCallResult {
                        message: String::from(message),
                    },
                    &expression.span,
                );
            }
        }
        StmtKind::Try(try_stmt) => type_check_try(checker, statement, try_stmt)?,
    }
    Ok(())
}

fn invalid_statement(checker: &mut TypeChecker, message: &str, span: &Span) {
    checker.record_error(
        ErrorImpl::InvalidStatement {
            message: String::from(message),
        },
        span,
    );
}

/// Calling convention of the function called by `expression`, if it is a
/// call.
fn callee_kind(checker: &TypeChecker, expression: &Expression) -> Option<CallKind> {
    let ExprKind::FunctionCall(call) = &expression.kind else {
        return None;
    };
    let mut callee: &Expression = &call.expression;
    while let ExprKind::CallOptions(options) = &callee.kind {
        callee = &options.expression;
    }
    match checker.annotations.try_type_of(callee)? {
        Type::Function(function) => Some(function.kind),
        _ => None,
    }
}

fn type_check_return<'a>(
    checker: &mut TypeChecker<'a>,
    statement: &Statement,
    return_stmt: &'a ReturnStmt,
) -> Result<(), InternalError> {
    let Some(expression) = &return_stmt.expression else {
        return Ok(());
    };
    let Some(function) = checker.current_function() else {
        type_check_expr(checker, expression, &ExpressionContext::default())?;
        invalid_statement(checker, "Return arguments not allowed.", &statement.span);
        return Ok(());
    };
    let expected = checker.parameter_types(&function.return_parameters)?;
    let actual = type_check_expr(checker, expression, &ExpressionContext::default())?;
    if actual.is_invalid() {
        return Ok(());
    }

    let count_mismatch = "Different number of arguments in return statement than in returns declaration.";
    match (expected.as_slice(), &actual) {
        ([], _) => invalid_statement(checker, count_mismatch, &statement.span),
        ([single], _) => {
            if !actual.is_implicitly_convertible_to(single) {
                checker.record_error(
                    ErrorImpl::TypeMismatch {
                        expected: single.to_string(),
                        received: actual.to_string(),
                    },
                    &expression.span,
                );
            }
        }
        (_, Type::Tuple(components)) if components.len() != expected.len() => {
            invalid_statement(checker, count_mismatch, &statement.span);
        }
        (_, Type::Tuple(_)) => {
            let expected = Type::tuple(expected.clone());
            if !actual.is_implicitly_convertible_to(&expected) {
                checker.record_error(
                    ErrorImpl::TypeMismatch {
                        expected: expected.to_string(),
                        received: actual.to_string(),
                    },
                    &expression.span,
                );
            }
        }
        _ => invalid_statement(checker, count_mismatch, &statement.span),
    }
    Ok(())
}

fn type_check_variable_declaration_stmt<'a>(
    checker: &mut TypeChecker<'a>,
    statement: &Statement,
    declaration: &'a VariableDeclarationStmt,
) -> Result<(), InternalError> {
    let mut declared: Vec<Option<(&'a VariableDeclaration, Type)>> = vec![];
    for variable in &declaration.declarations {
        match variable {
            Some(variable) => {
                let type_ = declare_variable(checker, variable, VariableContext::Local)?;
                declared.push(Some((variable, type_)));
            }
            None => declared.push(None),
        }
    }

    let Some(initial_value) = &declaration.initial_value else {
        for (variable, type_) in declared.iter().flatten() {
            if matches!(type_, Type::Mapping(..)) {
                checker.record_error(
                    ErrorImpl::InvalidDeclaration {
                        message: String::from(
                            "Uninitialized mapping. Mappings cannot be created dynamically, you have to assign them from a state variable.",
                        ),
                    },
                    &variable.span,
                );
            } else if type_.is_storage_pointer() {
                checker.record_error(
                    ErrorImpl::InvalidDeclaration {
                        message: String::from(
                            "This variable is of storage pointer type and can be accessed without prior assignment, which would lead to undefined behaviour.",
                        ),
                    },
                    &variable.span,
                );
            }
        }
        return Ok(());
    };

    let value_type = type_check_expr(checker, initial_value, &ExpressionContext::default())?;
    if value_type.is_invalid() {
        return Ok(());
    }
    let values: Vec<Option<Type>> = match &value_type {
        Type::Tuple(components) => components.clone(),
        single => vec![Some(single.clone())],
    };
    if values.len() != declared.len() {
        checker.record_error(
            ErrorImpl::InvalidTypeOperation {
                message: format!(
                    "Different number of components on the left hand side ({}) than on the right hand side ({}).",
                    declared.len(),
                    values.len()
                ),
            },
            &statement.span,
        );
        return Ok(());
    }

    for (slot, value) in declared.iter().zip(values) {
        let (Some((variable, type_)), Some(value)) = (slot, value) else {
            continue;
        };
        if !value.is_implicitly_convertible_to(type_) {
            let span = if declared.len() == 1 { &initial_value.span } else { &variable.span };
            checker.record_error(
                ErrorImpl::TypeMismatch {
                    expected: type_.to_string(),
                    received: value.to_string(),
                },
                span,
            );
        }
    }
    Ok(())
}

fn type_check_try<'a>(checker: &mut TypeChecker<'a>, statement: &Statement, try_stmt: &'a TryStmt) -> Result<(), InternalError> {
    let call_type = type_check_expr(checker, &try_stmt.external_call, &ExpressionContext::default())?;
    let returns = match callee_kind(checker, &try_stmt.external_call) {
        Some(CallKind::External | CallKind::Creation) => match call_type {
            Type::Tuple(components) => components.into_iter().map(|c| c.unwrap_or(Type::Invalid)).collect(),
            single => vec![single],
        },
        _ => {
            invalid_statement(
                checker,
                "Try can only be used with external function calls and contract creation calls.",
                &try_stmt.external_call.span,
            );
            vec![]
        }
    };

    let mut clauses = try_stmt.clauses.iter();
    if let Some(success) = clauses.next() {
        type_check_success_clause(checker, success, &returns)?;
    }

    let mut seen: Vec<&str> = vec![];
    for clause in clauses {
        let name = clause.error_name.as_str();
        if seen.contains(&name) {
            let message = if name.is_empty() {
                String::from("This try statement already has a low-level catch clause.")
            } else {
                format!("This try statement already has an \"{}\" catch clause.", name)
            };
            checker.record_error(ErrorImpl::InvalidStatement { message }, &clause.span);
        }
        seen.push(name);
        type_check_catch_clause(checker, clause)?;
    }
    if try_stmt.clauses.len() < 2 {
        invalid_statement(checker, "Try statement needs at least one catch clause.", &statement.span);
    }
    Ok(())
}

fn declare_clause_parameters<'a>(checker: &mut TypeChecker<'a>, clause: &'a TryCatchClause) -> Result<Vec<Type>, InternalError> {
    let mut types = vec![];
    for parameter in clause.parameters.iter().flatten() {
        types.push(declare_variable(checker, parameter, VariableContext::CatchParameter)?);
    }
    Ok(types)
}

fn type_check_success_clause<'a>(
    checker: &mut TypeChecker<'a>,
    clause: &'a TryCatchClause,
    returns: &[Type],
) -> Result<(), InternalError> {
    let parameters = declare_clause_parameters(checker, clause)?;
    if clause.parameters.is_some() {
        if parameters.len() != returns.len() {
            checker.record_error(
                ErrorImpl::InvalidStatement {
                    message: format!(
                        "Function returns {} values, but returns clause has {} variables.",
                        returns.len(),
                        parameters.len()
                    ),
                },
                &clause.span,
            );
        } else {
            for (parameter, returned) in parameters.iter().zip(returns) {
                if !returned.is_implicitly_convertible_to(parameter) {
                    checker.record_error(
                        ErrorImpl::InvalidStatement {
                            message: format!("Invalid type, expected {} but got {}.", returned, parameter),
                        },
                        &clause.span,
                    );
                }
            }
        }
    }
    type_check_block(checker, &clause.block)
}

fn type_check_catch_clause<'a>(checker: &mut TypeChecker<'a>, clause: &'a TryCatchClause) -> Result<(), InternalError> {
    let parameters = declare_clause_parameters(checker, clause)?;
    let expected = match clause.error_name.as_str() {
        "" => {
            let low_level = parameters.is_empty() || parameters == [Type::bytes_memory()];
            if !low_level {
                invalid_statement(
                    checker,
                    "Expected `catch (bytes memory ...) { ... }` or `catch { ... }`.",
                    &clause.span,
                );
            }
            None
        }
        "Error" => Some((vec![Type::string(DataLocation::Memory)], "Expected `catch Error(string memory ...) { ... }`.")),
        "Panic" => Some((vec![Type::uint256()], "Expected `catch Panic(uint ...) { ... }`.")),
        _ => {
            invalid_statement(
                checker,
                "Invalid catch clause name. Expected either `catch (...)`, `catch Error(...)`, or `catch Panic(...)`.",
                &clause.span,
            );
            None
        }
    };
    if let Some((shape, message)) = expected {
        if !checker.settings.evm_version.supports_returndata() {
            checker.record_error(
                ErrorImpl::FeatureUnavailable {
                    feature: format!("catch {}(...)", clause.error_name),
                    evm_version: checker.settings.evm_version.to_string(),
                },
                &clause.span,
            );
        } else if parameters != shape {
            invalid_statement(checker, message, &clause.span);
        }
    }
    type_check_block(checker, &clause.block)
}
