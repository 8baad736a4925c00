//! Integration tests for complete type checking runs.
//!
//! These tests drive the public entry point the way an embedder or the
//! command line driver does: a name-linked AST goes in, either built in
//! process or read back from its JSON form, and diagnostics plus type
//! annotations come out.

use std::{io::Write, rc::Rc};

use solpp_typecheck::{
    ast::{
        ast::{DataLocationKeyword, SourceUnit, SourceUnitPart},
        builder::AstBuilder,
        declarations::{ContractPart, VariableDeclaration},
        expressions::BinaryOperator,
        statements::Statement,
    },
    config::{AbiCoderVersion, CheckerSettings, EvmVersion},
    display_error,
    errors::errors::{Diagnostic, ErrorImpl, Severity},
    type_checker::type_checker::{type_check, TypeCheckResult},
    Position, Span,
};

fn run(source: &SourceUnit, settings: CheckerSettings) -> TypeCheckResult {
    type_check(source, settings).expect("checker aborted")
}

fn error_names(result: &TypeCheckResult) -> Vec<&'static str> {
    result
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .map(|diagnostic| diagnostic.error.get_error_name())
        .collect()
}

fn contract_with(b: &mut AstBuilder, parameters: Vec<VariableDeclaration>, statements: Vec<Statement>) -> SourceUnit {
    let body = b.block(statements);
    let function = b.function("f", parameters, vec![], Some(body));
    let contract = b.contract("C", vec![], vec![ContractPart::Function(function)]);
    b.source_unit(vec![SourceUnitPart::Contract(contract)])
}

/// A token contract with a balance mapping, a transfer function and an event.
fn token() -> SourceUnit {
    let mut b = AstBuilder::new("token.sol");

    let key = b.elementary("address");
    let value = b.elementary("uint256");
    let mapping = b.mapping(key, value);
    let balances = b.state_variable("balances", mapping, None);
    let balances_id = balances.id;

    let address = b.elementary("address");
    let from = b.variable("from", address);
    let address = b.elementary("address");
    let to = b.variable("to", address);
    let uint256 = b.elementary("uint256");
    let amount = b.variable("amount", uint256);
    let event = b.event("Transfer", vec![from, to, amount]);
    let event_id = event.id;

    let address = b.elementary("address");
    let to = b.variable("to", address);
    let uint256 = b.elementary("uint256");
    let amount = b.variable("amount", uint256);
    let (to_id, amount_id) = (to.id, amount.id);

    // require(balances[msg.sender] >= amount);
    let require = b.global("require");
    let mapping_ref = b.ident("balances", balances_id);
    let msg = b.global("msg");
    let sender = b.member(msg, "sender");
    let balance = b.index(mapping_ref, Some(sender));
    let amount_ref = b.ident("amount", amount_id);
    let enough = b.binary(BinaryOperator::GreaterEqual, balance, amount_ref);
    let check = b.call(require, vec![enough]);
    let check = b.expr_stmt(check);

    // balances[msg.sender] -= amount;
    let mapping_ref = b.ident("balances", balances_id);
    let msg = b.global("msg");
    let sender = b.member(msg, "sender");
    let balance = b.index(mapping_ref, Some(sender));
    let amount_ref = b.ident("amount", amount_id);
    let debit = b.compound_assign(BinaryOperator::Sub, balance, amount_ref);
    let debit = b.expr_stmt(debit);

    // balances[to] += amount;
    let mapping_ref = b.ident("balances", balances_id);
    let to_ref = b.ident("to", to_id);
    let balance = b.index(mapping_ref, Some(to_ref));
    let amount_ref = b.ident("amount", amount_id);
    let credit = b.compound_assign(BinaryOperator::Add, balance, amount_ref);
    let credit = b.expr_stmt(credit);

    // emit Transfer(msg.sender, to, amount);
    let transfer = b.ident("Transfer", event_id);
    let msg = b.global("msg");
    let sender = b.member(msg, "sender");
    let to_ref = b.ident("to", to_id);
    let amount_ref = b.ident("amount", amount_id);
    let emitted = b.call(transfer, vec![sender, to_ref, amount_ref]);
    let emitted = b.emit(emitted);

    let body = b.block(vec![check, debit, credit, emitted]);
    let function = b.function("transfer", vec![to, amount], vec![], Some(body));
    let contract = b.contract(
        "Token",
        vec![],
        vec![
            ContractPart::StateVariable(balances),
            ContractPart::Event(event),
            ContractPart::Function(function),
        ],
    );
    b.source_unit(vec![SourceUnitPart::Contract(contract)])
}

#[test]
fn test_check_valid_contract() {
    let source = token();
    let result = run(&source, CheckerSettings::default());

    assert!(result.passed, "{:?}", result.diagnostics);
    assert!(result.diagnostics.is_empty());
    assert!(!result.annotations.is_empty());
    assert_eq!(result.annotations.variables().count(), 6);
}

#[test]
fn test_check_is_deterministic() {
    let source = token();
    let first = run(&source, CheckerSettings::default());
    let second = run(&source, CheckerSettings::default());

    assert_eq!(first.passed, second.passed);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.annotations, second.annotations);
}

#[test]
fn test_check_ast_read_from_json_file() {
    let source = token();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string_pretty(&source).unwrap().as_bytes())
        .unwrap();

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let parsed: SourceUnit = serde_json::from_str(&contents).unwrap();
    let from_file = run(&parsed, CheckerSettings::default());
    let in_memory = run(&source, CheckerSettings::default());

    assert!(from_file.passed);
    assert_eq!(from_file.annotations, in_memory.annotations);
}

#[test]
fn test_errors_do_not_stop_the_run() {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let x = b.variable("x", uint256);
    let value = b.boolean(true);
    let first = b.var_stmt(x, Some(value));
    let missing = b.unlinked_ident("nowhere");
    let second = b.expr_stmt(missing);
    let one = b.number("1");
    let one_id = one.id;
    let third = b.expr_stmt(one);
    let source = contract_with(&mut b, vec![], vec![first, second, third]);

    let result = run(&source, CheckerSettings::default());
    assert!(!result.passed);
    assert_eq!(error_names(&result), vec!["TypeMismatch", "UnresolvedReference"]);
    assert!(result.annotations.expression_type(one_id).is_some());
}

#[test]
fn test_warnings_do_not_fail_the_run() {
    let mut b = AstBuilder::new("test.sol");
    let address = b.elementary("address");
    let target = b.variable("target", address);
    let target_ref = b.ident("target", target.id);
    let call = b.member(target_ref, "call");
    let payload = b.string("");
    let call = b.call(call, vec![payload]);
    let statement = b.expr_stmt(call);
    let source = contract_with(&mut b, vec![target], vec![statement]);

    let result = run(&source, CheckerSettings::default());
    assert!(result.passed);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        result.diagnostics[0].error,
        ErrorImpl::UnusedCallResult {
            message: "Return value of low-level calls not used.".to_string()
        }
    );
}

/// `function f(uint256[][] memory values) public {}`
fn nested_array_parameter() -> SourceUnit {
    let mut b = AstBuilder::new("test.sol");
    let uint256 = b.elementary("uint256");
    let inner = b.array(uint256, None);
    let outer = b.array(inner, None);
    let values = b.variable_at("values", outer, DataLocationKeyword::Memory);
    contract_with(&mut b, vec![values], vec![])
}

#[test]
fn test_abi_coder_v1_rejects_nested_arrays() {
    let source = nested_array_parameter();

    let v2 = run(&source, CheckerSettings::default());
    assert!(v2.passed, "{:?}", v2.diagnostics);

    let v1 = run(&source, CheckerSettings::default().with_abi_coder(AbiCoderVersion::V1));
    assert_eq!(error_names(&v1), vec!["NotAbiEncodable"]);
    assert_eq!(
        v1.diagnostics[0].message(),
        "This type is only supported in ABI coder v2. Use \"pragma abicoder v2;\" to enable the feature."
    );
}

#[test]
fn test_abi_coder_pragma_overrides_settings() {
    let mut source = nested_array_parameter();
    source.abi_coder = Some(AbiCoderVersion::V2);

    let result = run(&source, CheckerSettings::default().with_abi_coder(AbiCoderVersion::V1));
    assert!(result.passed);
}

#[test]
fn test_evm_version_gates_members() {
    let mut b = AstBuilder::new("test.sol");
    let block = b.global("block");
    let base_fee = b.member(block, "basefee");
    let statement = b.expr_stmt(base_fee);
    let source = contract_with(&mut b, vec![], vec![statement]);

    assert!(run(&source, CheckerSettings::new(EvmVersion::London)).passed);

    let berlin = run(&source, CheckerSettings::new(EvmVersion::Berlin));
    assert_eq!(
        berlin.diagnostics[0].error,
        ErrorImpl::FeatureUnavailable {
            feature: "basefee".to_string(),
            evm_version: "berlin".to_string(),
        }
    );
}

#[test]
fn test_settings_from_json() {
    let settings: CheckerSettings = serde_json::from_str(r#"{"evmVersion": "byzantium", "abiCoder": "v1"}"#).unwrap();
    assert_eq!(settings.evm_version, EvmVersion::Byzantium);
    assert_eq!(settings.abi_coder, AbiCoderVersion::V1);
}

#[test]
fn test_diagnostic_json() {
    let file = Rc::new("token.sol".to_string());
    let diagnostic = Diagnostic {
        error: ErrorImpl::TypeMismatch {
            expected: "uint8".to_string(),
            received: "int_const 256".to_string(),
        },
        span: Span {
            start: Position(10, Rc::clone(&file)),
            end: Position(13, file),
        },
        severity: Severity::Error,
    };

    let value = serde_json::to_value(&diagnostic).unwrap();
    assert_eq!(value["error"]["kind"], "TypeMismatch");
    assert_eq!(value["error"]["expected"], "uint8");
    assert_eq!(value["severity"], "error");
}

#[test]
fn test_display_error_with_source() {
    let file = Rc::new("token.sol".to_string());
    let diagnostic = Diagnostic {
        error: ErrorImpl::TypeMismatch {
            expected: "uint8".to_string(),
            received: "int_const 256".to_string(),
        },
        span: Span {
            start: Position(10, Rc::clone(&file)),
            end: Position(13, file),
        },
        severity: Severity::Error,
    };

    let rendered = display_error(&diagnostic, "token.sol", Some("uint8 x = 256;\n"));
    assert!(rendered.starts_with("Error: TypeMismatch (Convert the value to `uint8` explicitly if this is intended)\n"));
    assert!(rendered.contains("-> token.sol\n"));
    assert!(rendered.contains("1 | uint8 x = 256;"));

    let without_source = display_error(&diagnostic, "token.sol", None);
    assert_eq!(
        without_source,
        "Error: TypeMismatch (Convert the value to `uint8` explicitly if this is intended)\n-> token.sol\n"
    );
}
