//! Unit tests for the AST: builder ids, globals and the JSON form.

use crate::ast::{
    ast::{NodeId, SourceUnit, SourceUnitPart},
    builder::AstBuilder,
    declarations::ContractPart,
    expressions::{BinaryOperator, ExprKind},
    globals::{global_declaration, global_ids, GlobalKind},
    statements::StmtKind,
};

fn sample_source() -> SourceUnit {
    let mut b = AstBuilder::new("sample.sol");
    let uint256 = b.elementary("uint256");
    let total = b.state_variable("total", uint256, None);
    let total_id = total.id;

    let uint256 = b.elementary("uint256");
    let amount = b.variable("amount", uint256);
    let target = b.ident("total", total_id);
    let value = b.ident("amount", amount.id);
    let update = b.compound_assign(BinaryOperator::Add, target, value);
    let update = b.expr_stmt(update);
    let nested = b.block_stmt(vec![update]);
    let body = b.block(vec![nested]);
    let function = b.function("add", vec![amount], vec![], Some(body));

    let contract = b.contract(
        "Counter",
        vec![],
        vec![ContractPart::StateVariable(total), ContractPart::Function(function)],
    );
    b.source_unit(vec![SourceUnitPart::Contract(contract)])
}

#[test]
fn test_builder_ids_are_unique() {
    let mut b = AstBuilder::new("test.sol");
    let first = b.number("1");
    let second = b.number("2");
    let reserved = b.reserve();

    assert_ne!(first.id, second.id);
    assert!(second.id < reserved);
    assert!(!first.id.is_magic());
    assert_eq!(first.span.start.0, first.id.0 as u32);
    assert_eq!(*first.span.start.1, "test.sol");
}

#[test]
fn test_global_ids() {
    assert_eq!(global_ids("msg"), vec![NodeId(-15)]);
    assert_eq!(global_ids("require").len(), 2);
    assert!(global_ids("nothing").is_empty());

    let declaration = global_declaration(NodeId(-28)).unwrap();
    assert_eq!(declaration.name, "this");
    assert_eq!(declaration.kind, GlobalKind::This);
    assert!(NodeId(-28).is_magic());
}

#[test]
fn test_builder_global_reference() {
    let mut b = AstBuilder::new("test.sol");
    let msg = b.global("msg");
    let require = b.global("require");

    match msg.kind {
        ExprKind::Identifier(identifier) => {
            assert_eq!(identifier.referenced_declaration, Some(NodeId(-15)));
            assert!(identifier.overloaded_declarations.is_empty());
        }
        other => panic!("expected an identifier, got {:?}", other),
    }
    match require.kind {
        ExprKind::Identifier(identifier) => {
            assert_eq!(identifier.referenced_declaration, None);
            assert_eq!(identifier.overloaded_declarations.len(), 2);
        }
        other => panic!("expected an identifier, got {:?}", other),
    }
}

#[test]
fn test_contract_accessors() {
    let source = sample_source();
    let contract = source.contracts().next().unwrap();

    assert_eq!(contract.name, "Counter");
    assert_eq!(contract.state_variables().count(), 1);
    assert_eq!(contract.functions().count(), 1);
    assert!(contract.constructor().is_none());
}

#[test]
fn test_json_round_trip() {
    let source = sample_source();
    let json = serde_json::to_string(&source).unwrap();
    let parsed: SourceUnit = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.id, source.id);
    assert_eq!(parsed.path, "sample.sol");
    assert_eq!(serde_json::to_string(&parsed).unwrap(), json);

    let contract = parsed.contracts().next().unwrap();
    let function = contract.functions().next().unwrap();
    let body = function.body.as_ref().unwrap();
    match &body.statements[0].kind {
        StmtKind::Block(block) => assert_eq!(block.statements.len(), 1),
        other => panic!("expected a block, got {:?}", other),
    }
}

#[test]
fn test_json_node_types() {
    let source = sample_source();
    let value = serde_json::to_value(&source).unwrap();

    let contract = &value["nodes"][0];
    assert_eq!(contract["nodeType"], "Contract");
    assert_eq!(contract["name"], "Counter");
    let statement = &contract["nodes"][1]["body"]["statements"][0];
    assert_eq!(statement["nodeType"], "Block");
    assert!(statement.get("blockId").is_some());
}
