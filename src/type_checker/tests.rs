//! Unit tests for the type checker.
//!
//! Every test assembles a small name-linked AST with the builder and runs the
//! complete checker over it.

use crate::{
    ast::{
        ast::{DataLocationKeyword, NodeId, SourceUnit, SourceUnitPart, Visibility},
        builder::AstBuilder,
        declarations::{ContractKind, ContractPart, FunctionKind, VariableDeclaration, VariableMutability},
        expressions::{BinaryOperator, Expression, UnaryOperator},
        statements::Statement,
    },
    config::CheckerSettings,
    errors::errors::{ErrorImpl, InternalError, Severity},
    type_checker::{
        abi::{type_supported_by_legacy_encoder, StructMembers},
        type_checker::{type_check, TypeCheckResult},
        types::{DataLocation, Type},
    },
};

fn check(source: &SourceUnit) -> TypeCheckResult {
    type_check(source, CheckerSettings::default()).expect("checker aborted")
}

fn error_names(result: &TypeCheckResult) -> Vec<&'static str> {
    result
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .map(|diagnostic| diagnostic.error.get_error_name())
        .collect()
}

fn messages(result: &TypeCheckResult) -> Vec<String> {
    result.diagnostics.iter().map(|diagnostic| diagnostic.message()).collect()
}

fn expression_type(result: &TypeCheckResult, id: NodeId) -> String {
    result
        .annotations
        .expression_type(id)
        .map(|type_| type_.to_string())
        .unwrap_or_default()
}

/// `contract C { <parts> function f(<parameters>) public { <statements> } }`
fn in_function(
    b: &mut AstBuilder,
    parts: Vec<ContractPart>,
    parameters: Vec<VariableDeclaration>,
    statements: Vec<Statement>,
) -> SourceUnit {
    let body = b.block(statements);
    let function = b.function("f", parameters, vec![], Some(body));
    let mut nodes = parts;
    nodes.push(ContractPart::Function(function));
    let contract = b.contract("C", vec![], nodes);
    b.source_unit(vec![SourceUnitPart::Contract(contract)])
}

// LITERALS AND OPERATORS

#[test]
fn test_literal_fits_declared_integer() {
    let mut b = AstBuilder::new("test.sol");
    let type_name = b.elementary("uint8");
    let x = b.variable("x", type_name);
    let x_id = x.id;
    let value = b.number("255");
    let value_id = value.id;
    let declaration = b.var_stmt(x, Some(value));
    let source = in_function(&mut b, vec![], vec![], vec![declaration]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(expression_type(&result, value_id), "int_const 255");
    assert_eq!(result.annotations.variable_type(x_id).map(|t| t.to_string()).as_deref(), Some("uint8"));
}

#[test]
fn test_literal_too_large_for_integer() {
    let mut b = AstBuilder::new("test.sol");
    let type_name = b.elementary("uint8");
    let x = b.variable("x", type_name);
    let value = b.number("256");
    let declaration = b.var_stmt(x, Some(value));
    let source = in_function(&mut b, vec![], vec![], vec![declaration]);

    let result = check(&source);
    assert!(!result.passed);
    assert_eq!(error_names(&result), vec!["TypeMismatch"]);
    assert_eq!(
        messages(&result),
        vec!["Type int_const 256 is not implicitly convertible to expected type uint8."]
    );
}

#[test]
fn test_bool_is_not_an_integer() {
    let mut b = AstBuilder::new("test.sol");
    let type_name = b.elementary("uint256");
    let x = b.variable("x", type_name);
    let value = b.boolean(true);
    let declaration = b.var_stmt(x, Some(value));
    let source = in_function(&mut b, vec![], vec![], vec![declaration]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["TypeMismatch"]);
    assert_eq!(
        result.diagnostics[0].error,
        ErrorImpl::TypeMismatch {
            expected: "uint256".to_string(),
            received: "bool".to_string(),
        }
    );
}

#[test]
fn test_binary_operator_common_type() {
    let mut b = AstBuilder::new("test.sol");
    let uint8 = b.elementary("uint8");
    let a = b.variable("a", uint8);
    let uint8 = b.elementary("uint8");
    let c = b.variable("c", uint8);
    let left = b.ident("a", a.id);
    let right = b.ident("c", c.id);
    let sum = b.binary(BinaryOperator::Add, left, right);
    let sum_id = sum.id;
    let statement = b.expr_stmt(sum);
    let source = in_function(&mut b, vec![], vec![a, c], vec![statement]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(expression_type(&result, sum_id), "uint8");
}

#[test]
fn test_binary_operator_incompatible_types() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let a = b.variable("a", uint256);
    let left = b.ident("a", a.id);
    let right = b.boolean(false);
    let sum = b.binary(BinaryOperator::Add, left, right);
    let statement = b.expr_stmt(sum);
    let source = in_function(&mut b, vec![], vec![a], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["OperatorNotCompatible"]);
    assert_eq!(messages(&result), vec!["Operator + not compatible with types uint256 and bool."]);
}

#[test]
fn test_literal_operations_are_folded() {
    let mut b = AstBuilder::new("test.sol");
    let one = b.number("1");
    let two = b.number("2");
    let sum = b.binary(BinaryOperator::Add, one, two);
    let sum_id = sum.id;
    let statement = b.expr_stmt(sum);
    let source = in_function(&mut b, vec![], vec![], vec![statement]);

    let result = check(&source);
    assert!(result.passed);
    assert_eq!(expression_type(&result, sum_id), "int_const 3");
}

// REFERENCES AND INVARIANTS

#[test]
fn test_unresolved_reference() {
    let mut b = AstBuilder::new("test.sol");
    let missing = b.unlinked_ident("y");
    let missing_id = missing.id;
    let statement = b.expr_stmt(missing);
    let source = in_function(&mut b, vec![], vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["UnresolvedReference"]);
    assert_eq!(messages(&result), vec!["Undeclared identifier \"y\"."]);
    assert_eq!(expression_type(&result, missing_id), "<invalid>");
}

#[test]
fn test_dangling_reference_aborts() {
    let mut b = AstBuilder::new("test.sol");
    let ghost = b.ident("ghost", NodeId(9999));
    let ghost_id = ghost.id;
    let statement = b.expr_stmt(ghost);
    let source = in_function(&mut b, vec![], vec![], vec![statement]);

    let error = type_check(&source, CheckerSettings::default()).unwrap_err();
    assert_eq!(
        error,
        InternalError::DanglingReference {
            node: ghost_id,
            declaration: NodeId(9999),
        }
    );
}

#[test]
fn test_expression_annotated_once() {
    let mut b = AstBuilder::new("test.sol");
    let one = b.number("1");
    let one_id = one.id;
    let first = b.expr_stmt(one.clone());
    let second = b.expr_stmt(one);
    let source = in_function(&mut b, vec![], vec![], vec![first, second]);

    let error = type_check(&source, CheckerSettings::default()).unwrap_err();
    assert_eq!(error, InternalError::AnnotationRewritten { node: one_id });
}

#[test]
fn test_inheritance_cycle_reported_once() {
    let mut b = AstBuilder::new("test.sol");
    let a_id = b.reserve();
    let b_id = b.reserve();
    let a_base = b.inheritance("B", b_id, None);
    let b_base = b.inheritance("A", a_id, None);
    let c_base = b.inheritance("A", a_id, None);
    let a = b.contract_with_id(a_id, "A", ContractKind::Contract, vec![a_base], vec![]);
    let b_contract = b.contract_with_id(b_id, "B", ContractKind::Contract, vec![b_base], vec![]);
    let c = b.contract("C", vec![c_base], vec![]);
    let source = b.source_unit(vec![
        SourceUnitPart::Contract(a),
        SourceUnitPart::Contract(b_contract),
        SourceUnitPart::Contract(c),
    ]);

    let result = check(&source);
    assert!(!result.passed);
    assert_eq!(error_names(&result), vec!["InheritanceCycle"]);
    assert_eq!(
        messages(&result),
        vec!["Definition of base has to precede definition of derived contract: A inherits from itself."]
    );
}

#[test]
fn test_unimplemented_function_needs_abstract_contract() {
    let mut b = AstBuilder::new("test.sol");
    let mut function = b.function("g", vec![], vec![], None);
    function.is_virtual = true;
    let contract = b.contract("C", vec![], vec![ContractPart::Function(function)]);
    let source = b.source_unit(vec![SourceUnitPart::Contract(contract)]);

    let result = check(&source);
    assert_eq!(messages(&result), vec!["Contract \"C\" should be marked as abstract."]);
}

#[test]
fn test_free_function_visibility() {
    let mut b = AstBuilder::new("test.sol");
    let body = b.block(vec![]);
    let mut function = b.function("g", vec![], vec![], Some(body));
    function.visibility = Visibility::Default;
    let body = b.block(vec![]);
    let public = b.function("h", vec![], vec![], Some(body));
    let source = b.source_unit(vec![SourceUnitPart::Function(function), SourceUnitPart::Function(public)]);

    let result = check(&source);
    assert_eq!(messages(&result), vec!["Free functions cannot have visibility."]);
}

// ABI

#[test]
fn test_abi_decode_tuple_of_types() {
    let mut b = AstBuilder::new("test.sol");
    let bytes = b.elementary("bytes");
    let data = b.variable_at("data", bytes, DataLocationKeyword::Memory);
    let abi = b.global("abi");
    let decode = b.member(abi, "decode");
    let argument = b.ident("data", data.id);
    let uint256 = b.type_expr("uint256");
    let boolean = b.type_expr("bool");
    let types = b.tuple(vec![Some(uint256), Some(boolean)]);
    let call = b.call(decode, vec![argument, types]);
    let call_id = call.id;
    let statement = b.expr_stmt(call);
    let source = in_function(&mut b, vec![], vec![data], vec![statement]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(expression_type(&result, call_id), "tuple(uint256,bool)");
}

#[test]
fn test_abi_decode_requires_types() {
    let mut b = AstBuilder::new("test.sol");
    let bytes = b.elementary("bytes");
    let data = b.variable_at("data", bytes, DataLocationKeyword::Memory);
    let uint256 = b.elementary("uint256");
    let x = b.variable("x", uint256);
    let abi = b.global("abi");
    let decode = b.member(abi, "decode");
    let argument = b.ident("data", data.id);
    let not_a_type = b.ident("x", x.id);
    let call = b.call(decode, vec![argument, not_a_type]);
    let statement = b.expr_stmt(call);
    let source = in_function(&mut b, vec![], vec![data, x], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InvalidAbiDecodeUsage"]);
    assert_eq!(
        messages(&result),
        vec!["The second argument to \"abi.decode\" has to be a tuple of types."]
    );
}

#[test]
fn test_external_reference_parameter_needs_location() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let array = b.array(uint256, None);
    let values = b.variable("values", array);
    let source = in_function(&mut b, vec![], vec![values], vec![]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InvalidDataLocation"]);
    assert_eq!(
        messages(&result),
        vec!["Data location must be \"memory\" or \"calldata\" for parameter in function, but none was given."]
    );
}

#[test]
fn test_value_type_cannot_have_location() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let x = b.variable_at("x", uint256, DataLocationKeyword::Memory);
    let value = b.number("1");
    let declaration = b.var_stmt(x, Some(value));
    let source = in_function(&mut b, vec![], vec![], vec![declaration]);

    let result = check(&source);
    assert_eq!(
        messages(&result),
        vec!["Data location can only be specified for array, struct or mapping types, but \"memory\" was given."]
    );
}

#[test]
fn test_uninitialized_local_mapping() {
    let mut b = AstBuilder::new("test.sol");
    let key = b.elementary("uint256");
    let value = b.elementary("uint256");
    let mapping = b.mapping(key, value);
    let m = b.variable_at("m", mapping, DataLocationKeyword::Storage);
    let declaration = b.var_stmt(m, None);
    let source = in_function(&mut b, vec![], vec![], vec![declaration]);

    let result = check(&source);
    assert_eq!(
        messages(&result),
        vec!["Uninitialized mapping. Mappings cannot be created dynamically, you have to assign them from a state variable."]
    );
}

// STORAGE

#[test]
fn test_double_storage_assignment_warning() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let member = b.variable("a", uint256);
    let structure = b.struct_def("S", vec![member]);
    let struct_id = structure.id;
    let s_type = b.user_type("S", struct_id);
    let s = b.state_variable("s", s_type, None);
    let t_type = b.user_type("S", struct_id);
    let t = b.state_variable("t", t_type, None);

    let s_ref = b.ident("s", s.id);
    let s_a = b.member(s_ref, "a");
    let s_whole = b.ident("s", s.id);
    let left = b.tuple(vec![Some(s_a), Some(s_whole)]);
    let one = b.number("1");
    let t_ref = b.ident("t", t.id);
    let right = b.tuple(vec![Some(one), Some(t_ref)]);
    let assignment = b.assign(left, right);
    let statement = b.expr_stmt(assignment);
    let parts = vec![
        ContractPart::Struct(structure),
        ContractPart::StateVariable(s),
        ContractPart::StateVariable(t),
    ];
    let source = in_function(&mut b, parts, vec![], vec![statement]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    let warnings: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].error, ErrorImpl::DoubleStorageAssignment);
}

#[test]
fn test_storage_array_push() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let array = b.array(uint256, None);
    let xs = b.state_variable("xs", array, None);
    let target = b.ident("xs", xs.id);
    let push = b.member(target, "push");
    let one = b.number("1");
    let call = b.call(push, vec![one]);
    let push_statement = b.expr_stmt(call);
    let target = b.ident("xs", xs.id);
    let length = b.member(target, "length");
    let length_id = length.id;
    let length_statement = b.expr_stmt(length);
    let source = in_function(
        &mut b,
        vec![ContractPart::StateVariable(xs)],
        vec![],
        vec![push_statement, length_statement],
    );

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(expression_type(&result, length_id), "uint256");
}

#[test]
fn test_memory_array_cannot_push() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let array = b.array(uint256, None);
    let ys = b.variable_at("ys", array, DataLocationKeyword::Memory);
    let target = b.ident("ys", ys.id);
    let push = b.member(target, "push");
    let one = b.number("1");
    let call = b.call(push, vec![one]);
    let statement = b.expr_stmt(call);
    let source = in_function(&mut b, vec![], vec![ys], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["MemberNotFound"]);
}

// MEMBERS

#[test]
fn test_message_sender() {
    let mut b = AstBuilder::new("test.sol");
    let address = b.elementary("address");
    let sender = b.variable("sender", address);
    let msg = b.global("msg");
    let access = b.member(msg, "sender");
    let access_id = access.id;
    let declaration = b.var_stmt(sender, Some(access));
    let source = in_function(&mut b, vec![], vec![], vec![declaration]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(expression_type(&result, access_id), "address");
}

#[test]
fn test_unknown_member() {
    let mut b = AstBuilder::new("test.sol");
    let msg = b.global("msg");
    let access = b.member(msg, "owner");
    let statement = b.expr_stmt(access);
    let source = in_function(&mut b, vec![], vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["MemberNotFound"]);
}

#[test]
fn test_require_overloads() {
    let mut b = AstBuilder::new("test.sol");
    let require = b.global("require");
    let condition = b.boolean(true);
    let plain = b.call(require, vec![condition]);
    let plain = b.expr_stmt(plain);
    let require = b.global("require");
    let condition = b.boolean(true);
    let reason = b.string("out of range");
    let with_reason = b.call(require, vec![condition, reason]);
    let with_reason = b.expr_stmt(with_reason);
    let source = in_function(&mut b, vec![], vec![], vec![plain, with_reason]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
}

// EVENTS AND MESSAGES

#[test]
fn test_event_requires_emit() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let parameter = b.variable("value", uint256);
    let event = b.event("Stored", vec![parameter]);
    let event_id = event.id;

    let callee = b.ident("Stored", event_id);
    let one = b.number("1");
    let call = b.call(callee, vec![one]);
    let emitted = b.emit(call);
    let callee = b.ident("Stored", event_id);
    let one = b.number("1");
    let call = b.call(callee, vec![one]);
    let bare = b.expr_stmt(call);
    let source = in_function(&mut b, vec![ContractPart::Event(event)], vec![], vec![emitted, bare]);

    let result = check(&source);
    assert_eq!(messages(&result), vec!["Event invocations have to be prefixed by \"emit\"."]);
}

#[test]
fn test_await_message_handle() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let parameter = b.variable("x", uint256);
    let boolean = b.elementary("bool");
    let returned = b.variable("ok", boolean);
    let message = b.message("Ping", vec![parameter], vec![returned]);
    let message_id = message.id;

    let boolean = b.elementary("bool");
    let r = b.variable("r", boolean);
    let callee = b.ident("Ping", message_id);
    let one = b.number("1");
    let call = b.call(callee, vec![one]);
    let call_id = call.id;
    let awaited = b.await_expr(call);
    let awaited_id = awaited.id;
    let declaration = b.var_stmt(r, Some(awaited));
    let source = in_function(&mut b, vec![ContractPart::Message(message)], vec![], vec![declaration]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(expression_type(&result, call_id), "message_handle(bool)");
    assert_eq!(expression_type(&result, awaited_id), "bool");
}

#[test]
fn test_await_requires_message_handle() {
    let mut b = AstBuilder::new("test.sol");
    let one = b.number("1");
    let awaited = b.await_expr(one);
    let statement = b.expr_stmt(awaited);
    let source = in_function(&mut b, vec![], vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(
        result.diagnostics[0].error,
        ErrorImpl::NotAwaitable {
            type_: "int_const 1".to_string()
        }
    );
}

// STATEMENTS

#[test]
fn test_placeholder_outside_modifier() {
    let mut b = AstBuilder::new("test.sol");
    let placeholder = b.placeholder();
    let source = in_function(&mut b, vec![], vec![], vec![placeholder]);

    let result = check(&source);
    assert_eq!(messages(&result), vec!["\"_\" can only be used inside a modifier body."]);
}

#[test]
fn test_placeholder_inside_modifier() {
    let mut b = AstBuilder::new("test.sol");
    let placeholder = b.placeholder();
    let body = b.block(vec![placeholder]);
    let modifier = b.modifier("guarded", vec![], body);
    let contract = b.contract("C", vec![], vec![ContractPart::Modifier(modifier)]);
    let source = b.source_unit(vec![SourceUnitPart::Contract(contract)]);

    assert!(check(&source).passed);
}

#[test]
fn test_return_count_mismatch() {
    let mut b = AstBuilder::new("test.sol");
    let one = b.number("1");
    let two = b.number("2");
    let values = b.tuple(vec![Some(one), Some(two)]);
    let ret = b.ret(Some(values));
    let body = b.block(vec![ret]);
    let uint256 = b.elementary("uint256");
    let returned = b.variable("", uint256);
    let function = b.function("g", vec![], vec![returned], Some(body));
    let contract = b.contract("C", vec![], vec![ContractPart::Function(function)]);
    let source = b.source_unit(vec![SourceUnitPart::Contract(contract)]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["TypeMismatch"]);
}

/// `contract D { function g() external returns (uint256 r) {} }` plus a
/// state variable `D d` for the calling contract.
fn callee_contract(b: &mut AstBuilder) -> (SourceUnitPart, VariableDeclaration) {
    let body = b.block(vec![]);
    let uint256 = b.elementary("uint256");
    let returned = b.variable("r", uint256);
    let mut g = b.function("g", vec![], vec![returned], Some(body));
    g.visibility = Visibility::External;
    let d_contract = b.contract("D", vec![], vec![ContractPart::Function(g)]);
    let d_type = b.user_type("D", d_contract.id);
    let d = b.state_variable("d", d_type, None);
    (SourceUnitPart::Contract(d_contract), d)
}

fn with_callee(b: &mut AstBuilder, callee: SourceUnitPart, d: VariableDeclaration, statements: Vec<Statement>) -> SourceUnit {
    let body = b.block(statements);
    let function = b.function("f", vec![], vec![], Some(body));
    let contract = b.contract(
        "C",
        vec![],
        vec![ContractPart::StateVariable(d), ContractPart::Function(function)],
    );
    b.source_unit(vec![callee, SourceUnitPart::Contract(contract)])
}

#[test]
fn test_try_catch_external_call() {
    let mut b = AstBuilder::new("test.sol");
    let (callee, d) = callee_contract(&mut b);
    let target = b.ident("d", d.id);
    let g = b.member(target, "g");
    let call = b.call(g, vec![]);
    let uint256 = b.elementary("uint256");
    let v = b.variable("v", uint256);
    let success_block = b.block(vec![]);
    let success = b.catch_clause("", Some(vec![v]), success_block);
    let catch_block = b.block(vec![]);
    let catch_all = b.catch_clause("", None, catch_block);
    let try_statement = b.try_stmt(call, vec![success, catch_all]);
    let source = with_callee(&mut b, callee, d, vec![try_statement]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
}

#[test]
fn test_try_requires_external_call() {
    let mut b = AstBuilder::new("test.sol");
    let one = b.number("1");
    let success_block = b.block(vec![]);
    let success = b.catch_clause("", None, success_block);
    let catch_block = b.block(vec![]);
    let catch_all = b.catch_clause("", None, catch_block);
    let try_statement = b.try_stmt(one, vec![success, catch_all]);
    let source = in_function(&mut b, vec![], vec![], vec![try_statement]);

    let result = check(&source);
    assert_eq!(
        messages(&result),
        vec!["Try can only be used with external function calls and contract creation calls."]
    );
}

#[test]
fn test_call_options_on_external_call() {
    let mut b = AstBuilder::new("test.sol");
    let (callee, d) = callee_contract(&mut b);
    let target = b.ident("d", d.id);
    let g = b.member(target, "g");
    let gas = b.number("5000");
    let with_gas = b.call_options(g, vec!["gas"], vec![gas]);
    let call = b.call(with_gas, vec![]);
    let gas_statement = b.expr_stmt(call);

    let target = b.ident("d", d.id);
    let g = b.member(target, "g");
    let value = b.number("1");
    let with_value = b.call_options(g, vec!["value"], vec![value]);
    let call = b.call(with_value, vec![]);
    let value_statement = b.expr_stmt(call);
    let source = with_callee(&mut b, callee, d, vec![gas_statement, value_statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InvalidCallOption"]);
    assert_eq!(messages(&result), vec!["Cannot set option \"value\" on a non-payable function type."]);
}

#[test]
fn test_cannot_instantiate_interface() {
    let mut b = AstBuilder::new("test.sol");
    let interface_id = b.reserve();
    let interface = b.contract_with_id(interface_id, "I", ContractKind::Interface, vec![], vec![]);
    let type_name = b.user_type("I", interface_id);
    let creation = b.new_expr(type_name);
    let call = b.call(creation, vec![]);
    let statement = b.expr_stmt(call);
    let body = b.block(vec![statement]);
    let function = b.function("f", vec![], vec![], Some(body));
    let contract = b.contract("C", vec![], vec![ContractPart::Function(function)]);
    let source = b.source_unit(vec![SourceUnitPart::Contract(interface), SourceUnitPart::Contract(contract)]);

    let result = check(&source);
    assert_eq!(messages(&result), vec!["Cannot instantiate an interface."]);
}

// CONVERSIONS AND OPERATORS

#[test]
fn test_explicit_conversion_changing_sign_and_width() {
    let mut b = AstBuilder::new("test.sol");
    let int256 = b.elementary("int256");
    let x = b.variable("x", int256);

    let target = b.type_expr("uint256");
    let argument = b.ident("x", x.id);
    let same_width = b.call(target, vec![argument]);
    let same_width_id = same_width.id;
    let same_width = b.expr_stmt(same_width);

    let target = b.type_expr("uint8");
    let argument = b.ident("x", x.id);
    let both = b.call(target, vec![argument]);
    let both = b.expr_stmt(both);
    let source = in_function(&mut b, vec![], vec![x], vec![same_width, both]);

    let result = check(&source);
    assert_eq!(expression_type(&result, same_width_id), "uint256");
    assert_eq!(error_names(&result), vec!["ExplicitConversionNotAllowed"]);
    assert_eq!(
        messages(&result),
        vec!["Explicit type conversion not allowed from \"int256\" to \"uint8\"."]
    );
}

#[test]
fn test_conditional_without_common_type() {
    let mut b = AstBuilder::new("test.sol");
    let condition = b.boolean(true);
    let number = b.number("1");
    let flag = b.boolean(false);
    let conditional = b.conditional(condition, number, flag);
    let conditional_id = conditional.id;
    let statement = b.expr_stmt(conditional);
    let source = in_function(&mut b, vec![], vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["NoCommonType"]);
    assert_eq!(
        messages(&result),
        vec!["True expression's type int_const 1 does not match false expression's type bool."]
    );
    assert_eq!(expression_type(&result, conditional_id), "<invalid>");
}

#[test]
fn test_compound_assignment_to_mapping() {
    let mut b = AstBuilder::new("test.sol");
    let key = b.elementary("uint256");
    let value = b.elementary("uint256");
    let mapping = b.mapping(key, value);
    let m = b.state_variable("m", mapping, None);
    let target = b.ident("m", m.id);
    let one = b.number("1");
    let update = b.compound_assign(BinaryOperator::Add, target, one);
    let statement = b.expr_stmt(update);
    let source = in_function(&mut b, vec![ContractPart::StateVariable(m)], vec![], vec![statement]);

    let result = check(&source);
    assert!(!result.passed);
    assert_eq!(
        result.diagnostics[0].error,
        ErrorImpl::NotAssignable {
            message: "Types in storage containing (nested) mappings cannot be assigned to.".to_string()
        }
    );
}

#[test]
fn test_compound_assignment_to_constant() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let one = b.number("1");
    let mut limit = b.state_variable("LIMIT", uint256, Some(one));
    limit.mutability = VariableMutability::Constant;
    let target = b.ident("LIMIT", limit.id);
    let one = b.number("1");
    let update = b.compound_assign(BinaryOperator::Add, target, one);
    let statement = b.expr_stmt(update);
    let source = in_function(&mut b, vec![ContractPart::StateVariable(limit)], vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["NotAssignable"]);
    assert_eq!(messages(&result), vec!["Cannot assign to a constant variable."]);
}

#[test]
fn test_negation_requires_signed_integer() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let x = b.variable("x", uint256);
    let int256 = b.elementary("int256");
    let y = b.variable("y", int256);

    let operand = b.ident("x", x.id);
    let unsigned = b.unary(UnaryOperator::Negate, operand);
    let unsigned = b.expr_stmt(unsigned);
    let operand = b.ident("y", y.id);
    let signed = b.unary(UnaryOperator::Negate, operand);
    let signed_id = signed.id;
    let signed = b.expr_stmt(signed);
    let source = in_function(&mut b, vec![], vec![x, y], vec![unsigned, signed]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["OperatorNotApplicable"]);
    assert_eq!(messages(&result), vec!["Unary operator - cannot be applied to type uint256."]);
    assert_eq!(expression_type(&result, signed_id), "int256");
}

#[test]
fn test_range_access_needs_calldata() {
    let mut b = AstBuilder::new("test.sol");
    let bytes = b.elementary("bytes");
    let data = b.variable_at("data", bytes, DataLocationKeyword::Memory);
    let base = b.ident("data", data.id);
    let start = b.number("1");
    let end = b.number("2");
    let range = b.range(base, Some(start), Some(end));
    let statement = b.expr_stmt(range);
    let source = in_function(&mut b, vec![], vec![data], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InvalidIndexOperation"]);
    assert_eq!(
        messages(&result),
        vec!["Index range access is only supported for dynamic calldata arrays."]
    );

    let mut b = AstBuilder::new("test.sol");
    let bytes = b.elementary("bytes");
    let data = b.variable_at("data", bytes, DataLocationKeyword::Calldata);
    let base = b.ident("data", data.id);
    let start = b.number("1");
    let range = b.range(base, Some(start), None);
    let statement = b.expr_stmt(range);
    let source = in_function(&mut b, vec![], vec![data], vec![statement]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
}

// CALL ARGUMENTS

/// `struct S { uint256 a; bool flag; }`
fn struct_s(b: &mut AstBuilder) -> ContractPart {
    let uint256 = b.elementary("uint256");
    let a = b.variable("a", uint256);
    let boolean = b.elementary("bool");
    let flag = b.variable("flag", boolean);
    ContractPart::Struct(b.struct_def("S", vec![a, flag]))
}

#[test]
fn test_struct_constructor_arguments() {
    let mut b = AstBuilder::new("test.sol");
    let structure = struct_s(&mut b);
    let ContractPart::Struct(definition) = &structure else {
        unreachable!()
    };
    let struct_id = definition.id;

    let callee = b.ident("S", struct_id);
    let one = b.number("1");
    let flag = b.boolean(true);
    let valid = b.call(callee, vec![one, flag]);
    let valid_id = valid.id;
    let valid = b.expr_stmt(valid);

    let callee = b.ident("S", struct_id);
    let one = b.number("1");
    let too_few = b.call(callee, vec![one]);
    let too_few = b.expr_stmt(too_few);

    let callee = b.ident("S", struct_id);
    let first = b.boolean(true);
    let second = b.boolean(true);
    let wrong_type = b.call(callee, vec![first, second]);
    let wrong_type = b.expr_stmt(wrong_type);
    let source = in_function(&mut b, vec![structure], vec![], vec![valid, too_few, wrong_type]);

    let result = check(&source);
    assert_eq!(expression_type(&result, valid_id), "struct C.S memory");
    assert_eq!(error_names(&result), vec!["ArgumentCount", "ArgumentType"]);
    assert_eq!(
        messages(&result),
        vec![
            "Wrong argument count for struct constructor: 1 arguments given but expected 2.",
            "Invalid type for argument in struct constructor. Invalid implicit conversion from bool to uint256 requested.",
        ]
    );
}

/// `function g(uint256 a, uint256 c) public {}`
fn two_parameter_function(b: &mut AstBuilder) -> ContractPart {
    let uint256 = b.elementary("uint256");
    let a = b.variable("a", uint256);
    let uint256 = b.elementary("uint256");
    let c = b.variable("c", uint256);
    let body = b.block(vec![]);
    ContractPart::Function(b.function("g", vec![a, c], vec![], Some(body)))
}

#[test]
fn test_named_arguments() {
    let mut b = AstBuilder::new("test.sol");
    let g = two_parameter_function(&mut b);
    let ContractPart::Function(definition) = &g else {
        unreachable!()
    };
    let g_id = definition.id;

    let callee = b.ident("g", g_id);
    let one = b.number("1");
    let two = b.number("2");
    let reordered = b.named_call(callee, vec!["c", "a"], vec![one, two]);
    let reordered = b.expr_stmt(reordered);

    let callee = b.ident("g", g_id);
    let one = b.number("1");
    let two = b.number("2");
    let unknown = b.named_call(callee, vec!["a", "b"], vec![one, two]);
    let unknown = b.expr_stmt(unknown);

    let callee = b.ident("g", g_id);
    let one = b.number("1");
    let two = b.number("2");
    let duplicate = b.named_call(callee, vec!["a", "a"], vec![one, two]);
    let duplicate = b.expr_stmt(duplicate);
    let source = in_function(&mut b, vec![g], vec![], vec![reordered, unknown, duplicate]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["UnknownNamedArgument", "DuplicateNamedArgument"]);
    assert_eq!(
        messages(&result),
        vec![
            "Named argument \"b\" does not match function declaration.",
            "Duplicate named argument \"a\".",
        ]
    );
}

#[test]
fn test_more_names_than_arguments_aborts() {
    let mut b = AstBuilder::new("test.sol");
    let g = two_parameter_function(&mut b);
    let ContractPart::Function(definition) = &g else {
        unreachable!()
    };
    let callee = b.ident("g", definition.id);
    let one = b.number("1");
    let call = b.named_call(callee, vec!["b", "a"], vec![one]);
    let call_id = call.id;
    let statement = b.expr_stmt(call);
    let source = in_function(&mut b, vec![g], vec![], vec![statement]);

    let error = type_check(&source, CheckerSettings::default()).unwrap_err();
    assert_eq!(
        error,
        InternalError::ArgumentNamesMismatch {
            node: call_id,
            names: 2,
            values: 1,
        }
    );
}

#[test]
fn test_call_option_without_name_aborts() {
    let mut b = AstBuilder::new("test.sol");
    let (callee, d) = callee_contract(&mut b);
    let target = b.ident("d", d.id);
    let g = b.member(target, "g");
    let gas = b.number("5000");
    let value = b.number("1");
    let with_options = b.call_options(g, vec!["gas"], vec![gas, value]);
    let options_id = with_options.id;
    let call = b.call(with_options, vec![]);
    let statement = b.expr_stmt(call);
    let source = with_callee(&mut b, callee, d, vec![statement]);

    let error = type_check(&source, CheckerSettings::default()).unwrap_err();
    assert_eq!(
        error,
        InternalError::ArgumentNamesMismatch {
            node: options_id,
            names: 1,
            values: 2,
        }
    );
}

#[test]
fn test_salt_requires_contract_creation() {
    let mut b = AstBuilder::new("test.sol");
    let (callee, d) = callee_contract(&mut b);
    let target = b.ident("d", d.id);
    let g = b.member(target, "g");
    let salt = b.number("1");
    let with_salt = b.call_options(g, vec!["salt"], vec![salt]);
    let call = b.call(with_salt, vec![]);
    let statement = b.expr_stmt(call);
    let source = with_callee(&mut b, callee, d, vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InvalidCallOption"]);
    assert_eq!(
        messages(&result),
        vec!["Function call option \"salt\" can only be used with \"new\"."]
    );
}

// OVERLOADS

/// `function g(uint256 x) public {}` and `function g(uint8 x) public {}`
fn overloaded_g(b: &mut AstBuilder) -> (Vec<ContractPart>, Vec<NodeId>) {
    let mut parts = vec![];
    let mut ids = vec![];
    for type_name in ["uint256", "uint8"] {
        let parameter_type = b.elementary(type_name);
        let x = b.variable("x", parameter_type);
        let body = b.block(vec![]);
        let function = b.function("g", vec![x], vec![], Some(body));
        ids.push(function.id);
        parts.push(ContractPart::Function(function));
    }
    (parts, ids)
}

#[test]
fn test_ambiguous_overload() {
    let mut b = AstBuilder::new("test.sol");
    let (parts, ids) = overloaded_g(&mut b);
    let callee = b.overloaded_ident("g", ids);
    let one = b.number("1");
    let call = b.call(callee, vec![one]);
    let statement = b.expr_stmt(call);
    let source = in_function(&mut b, parts, vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["AmbiguousReference"]);
    assert_eq!(
        messages(&result),
        vec!["No unique declaration found after argument-dependent lookup of \"g\"."]
    );
}

#[test]
fn test_overload_resolution() {
    let mut b = AstBuilder::new("test.sol");
    let (parts, ids) = overloaded_g(&mut b);
    let uint256 = b.elementary("uint256");
    let wide = b.variable("wide", uint256);

    let callee = b.overloaded_ident("g", ids.clone());
    let callee_id = callee.id;
    let argument = b.ident("wide", wide.id);
    let call = b.call(callee, vec![argument]);
    let resolved = b.expr_stmt(call);

    let callee = b.overloaded_ident("g", ids);
    let flag = b.boolean(true);
    let call = b.call(callee, vec![flag]);
    let unmatched = b.expr_stmt(call);
    let source = in_function(&mut b, parts, vec![wide], vec![resolved, unmatched]);

    let result = check(&source);
    assert_eq!(expression_type(&result, callee_id), "function (uint256)");
    assert_eq!(error_names(&result), vec!["NoMatchingOverload"]);
    assert_eq!(
        messages(&result),
        vec!["No matching declaration found after argument-dependent lookup of \"g\"."]
    );
}

#[test]
fn test_external_function_by_bare_name() {
    let mut b = AstBuilder::new("test.sol");
    let (mut parts, ids) = overloaded_g(&mut b);
    for part in &mut parts {
        if let ContractPart::Function(function) = part {
            function.visibility = Visibility::External;
        }
    }
    let callee = b.overloaded_ident("g", ids);
    let one = b.number("1");
    let call = b.call(callee, vec![one]);
    let statement = b.expr_stmt(call);
    let source = in_function(&mut b, parts, vec![], vec![statement]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["ExternalOnlyReference"]);
    assert_eq!(
        messages(&result),
        vec!["\"g\" is an external function and only reachable via \"this.g\"."]
    );
}

// CONTRACTS

#[test]
fn test_special_function_signatures() {
    let mut b = AstBuilder::new("test.sol");
    let body = b.block(vec![]);
    let mut fallback = b.special_function(FunctionKind::Fallback, body);
    let uint256 = b.elementary("uint256");
    fallback.parameters = vec![b.variable("x", uint256)];
    let body = b.block(vec![]);
    let mut receive = b.special_function(FunctionKind::Receive, body);
    let uint256 = b.elementary("uint256");
    receive.return_parameters = vec![b.variable("", uint256)];
    let contract = b.contract(
        "C",
        vec![],
        vec![ContractPart::Function(fallback), ContractPart::Function(receive)],
    );
    let source = b.source_unit(vec![SourceUnitPart::Contract(contract)]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["FunctionSignature", "FunctionSignature"]);
    assert_eq!(
        messages(&result),
        vec![
            "Fallback function cannot take parameters.",
            "Receive ether function cannot return values.",
        ]
    );
}

/// `contract A { constructor(uint256 x) {} }`
fn base_with_constructor(b: &mut AstBuilder) -> (SourceUnitPart, NodeId) {
    let body = b.block(vec![]);
    let mut constructor = b.special_function(FunctionKind::Constructor, body);
    let uint256 = b.elementary("uint256");
    constructor.parameters = vec![b.variable("x", uint256)];
    let a = b.contract("A", vec![], vec![ContractPart::Function(constructor)]);
    let a_id = a.id;
    (SourceUnitPart::Contract(a), a_id)
}

#[test]
fn test_base_constructor_arguments_in_modifier_list() {
    let mut b = AstBuilder::new("test.sol");
    let (a, a_id) = base_with_constructor(&mut b);
    let flag = b.boolean(true);
    let invocation = b.modifier_invocation("A", a_id, Some(vec![flag]));
    let body = b.block(vec![]);
    let mut constructor = b.special_function(FunctionKind::Constructor, body);
    constructor.modifiers = vec![invocation];
    let base = b.inheritance("A", a_id, None);
    let derived = b.contract("B", vec![base], vec![ContractPart::Function(constructor)]);
    let source = b.source_unit(vec![a, SourceUnitPart::Contract(derived)]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["ArgumentType"]);
    assert_eq!(
        messages(&result),
        vec!["Invalid type for argument in constructor call. Invalid implicit conversion from bool to uint256 requested."]
    );
}

#[test]
fn test_modifier_list_names_unrelated_contract() {
    let mut b = AstBuilder::new("test.sol");
    let (a, a_id) = base_with_constructor(&mut b);
    let one = b.number("1");
    let invocation = b.modifier_invocation("A", a_id, Some(vec![one]));
    let body = b.block(vec![]);
    let mut constructor = b.special_function(FunctionKind::Constructor, body);
    constructor.modifiers = vec![invocation];
    let unrelated = b.contract("B", vec![], vec![ContractPart::Function(constructor)]);
    let source = b.source_unit(vec![a, SourceUnitPart::Contract(unrelated)]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["NotModifierOrBase"]);
    assert_eq!(
        messages(&result),
        vec!["Referenced declaration \"A\" is neither modifier nor base class."]
    );
}

#[test]
fn test_contract_inherits_from_itself() {
    let mut b = AstBuilder::new("test.sol");
    let c_id = b.reserve();
    let base = b.inheritance("C", c_id, None);
    let contract = b.contract_with_id(c_id, "C", ContractKind::Contract, vec![base], vec![]);
    let source = b.source_unit(vec![SourceUnitPart::Contract(contract)]);

    let result = check(&source);
    assert_eq!(
        messages(&result),
        vec!["Definition of base has to precede definition of derived contract: C inherits from itself."]
    );
}

#[test]
fn test_inheritance_cycle_reported_at_cycle_member() {
    let mut b = AstBuilder::new("test.sol");
    let a_id = b.reserve();
    let b_id = b.reserve();
    let derived_base = b.inheritance("A", a_id, None);
    let derived = b.contract("Derived", vec![derived_base], vec![]);
    let a_base = b.inheritance("B", b_id, None);
    let b_base = b.inheritance("A", a_id, None);
    let a = b.contract_with_id(a_id, "A", ContractKind::Contract, vec![a_base], vec![]);
    let a_span = a.span.clone();
    let b_contract = b.contract_with_id(b_id, "B", ContractKind::Contract, vec![b_base], vec![]);
    let source = b.source_unit(vec![
        SourceUnitPart::Contract(derived),
        SourceUnitPart::Contract(a),
        SourceUnitPart::Contract(b_contract),
    ]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InheritanceCycle"]);
    assert_eq!(result.diagnostics[0].span, a_span);
    assert_eq!(
        result.diagnostics[0].error,
        ErrorImpl::InheritanceCycle {
            contract: "A".to_string()
        }
    );
}

// CONSTANTS

/// `name + name + ...` with `leaves` terms.
fn repeated_sum(b: &mut AstBuilder, name: &str, declaration: NodeId, leaves: usize) -> Expression {
    let mut sum = b.ident(name, declaration);
    for _ in 1..leaves {
        let term = b.ident(name, declaration);
        sum = b.binary(BinaryOperator::Add, sum, term);
    }
    sum
}

#[test]
fn test_constant_array_length() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let two = b.number("2");
    let three = b.number("3");
    let product = b.binary(BinaryOperator::Mul, two, three);
    let mut size = b.state_variable("SIZE", uint256, Some(product));
    size.mutability = VariableMutability::Constant;
    let length = b.ident("SIZE", size.id);
    let uint256 = b.elementary("uint256");
    let array = b.array(uint256, Some(length));
    let values = b.state_variable("values", array, None);
    let values_id = values.id;
    let parts = vec![ContractPart::StateVariable(size), ContractPart::StateVariable(values)];
    let source = in_function(&mut b, parts, vec![], vec![]);

    let result = check(&source);
    assert!(result.passed, "{:?}", messages(&result));
    assert_eq!(
        result.annotations.variable_type(values_id).map(|t| t.to_string()).as_deref(),
        Some("uint256[6] storage ref")
    );
}

#[test]
fn test_cyclic_constants_in_array_length() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let mut first = b.state_variable("A", uint256, None);
    first.mutability = VariableMutability::Constant;
    let uint256 = b.elementary("uint256");
    let mut second = b.state_variable("B", uint256, None);
    second.mutability = VariableMutability::Constant;
    // each constant is a long sum of the other
    first.value = Some(repeated_sum(&mut b, "B", second.id, 256));
    second.value = Some(repeated_sum(&mut b, "A", first.id, 256));

    let length = b.ident("A", first.id);
    let uint256 = b.elementary("uint256");
    let array = b.array(uint256, Some(length));
    let values = b.state_variable("values", array, None);
    let parts = vec![
        ContractPart::StateVariable(first),
        ContractPart::StateVariable(second),
        ContractPart::StateVariable(values),
    ];
    let source = in_function(&mut b, parts, vec![], vec![]);

    let result = check(&source);
    assert_eq!(error_names(&result), vec!["InvalidTypeName"]);
    assert_eq!(
        messages(&result),
        vec!["Invalid array length, expected integer literal or constant expression."]
    );
}

// LEGACY ENCODER

struct NoStructs;

impl StructMembers for NoStructs {
    fn member_types(&self, _id: NodeId) -> Vec<Type> {
        vec![]
    }
}

#[test]
fn test_legacy_encoder_accepts_storage_for_libraries() {
    let inner = Type::array(Type::uint256(), None, DataLocation::Storage);
    let nested = Type::array(inner, None, DataLocation::Storage);
    assert!(type_supported_by_legacy_encoder(&nested, true, &NoStructs));
    assert!(!type_supported_by_legacy_encoder(&nested, false, &NoStructs));

    let in_memory = nested.with_location(DataLocation::Memory, false);
    assert!(!type_supported_by_legacy_encoder(&in_memory, true, &NoStructs));
    assert!(type_supported_by_legacy_encoder(&Type::uint256(), false, &NoStructs));
}
