//! Programmatic AST construction.
//!
//! Upstream frontends normally hand the checker a JSON document; the builder
//! is the in-process equivalent, used by embedders and the test-suite. Every
//! node receives a fresh id and a span derived from it.

use std::rc::Rc;

use crate::{Position, Span, MK_EXPR, MK_STMT, MK_TYPE_NAME};

use super::{
    ast::{DataLocationKeyword, IdentifierPath, NodeId, SourceUnit, SourceUnitPart, StateMutability, Visibility},
    declarations::{
        ContractDefinition, ContractKind, ContractPart, EventDefinition, FunctionDefinition, FunctionKind,
        InheritanceSpecifier, MessageDefinition, ModifierDefinition, ModifierInvocation, StructDefinition,
        UsingForDirective, VariableDeclaration, VariableMutability,
    },
    expressions::*,
    globals::global_ids,
    statements::*,
    types::*,
};

pub struct AstBuilder {
    next_id: i64,
    file: Rc<String>,
}

impl AstBuilder {
    pub fn new(file: &str) -> Self {
        AstBuilder {
            next_id: 1,
            file: Rc::new(String::from(file)),
        }
    }

    /// Hands out the next node id together with a span unique to it.
    pub fn allocate(&mut self) -> (NodeId, Span) {
        let id = self.next_id;
        self.next_id += 1;
        let span = Span {
            start: Position(id as u32, Rc::clone(&self.file)),
            end: Position(id as u32 + 1, Rc::clone(&self.file)),
        };
        (NodeId(id), span)
    }

    pub fn path(&mut self, name: &str, declaration: NodeId) -> IdentifierPath {
        let (id, span) = self.allocate();
        IdentifierPath {
            id,
            path: name.split('.').map(String::from).collect(),
            referenced_declaration: Some(declaration),
            span,
        }
    }

    // TYPE NAMES

    pub fn elementary(&mut self, name: &str) -> TypeName {
        MK_TYPE_NAME!(self, TypeNameKind::Elementary(ElementaryTypeName { name: String::from(name), payable: false }))
    }

    pub fn address_payable(&mut self) -> TypeName {
        MK_TYPE_NAME!(self, TypeNameKind::Elementary(ElementaryTypeName { name: String::from("address"), payable: true }))
    }

    pub fn user_type(&mut self, name: &str, declaration: NodeId) -> TypeName {
        let path = self.path(name, declaration);
        MK_TYPE_NAME!(self, TypeNameKind::UserDefined(UserDefinedTypeName { path }))
    }

    pub fn mapping(&mut self, key: TypeName, value: TypeName) -> TypeName {
        MK_TYPE_NAME!(
            self,
            TypeNameKind::Mapping(MappingTypeName { key_type: Box::new(key), value_type: Box::new(value) })
        )
    }

    pub fn array(&mut self, base: TypeName, length: Option<Expression>) -> TypeName {
        MK_TYPE_NAME!(
            self,
            TypeNameKind::Array(ArrayTypeName { base_type: Box::new(base), length: length.map(Box::new) })
        )
    }

    pub fn function_type(
        &mut self,
        parameter_types: Vec<VariableDeclaration>,
        return_parameter_types: Vec<VariableDeclaration>,
        visibility: Visibility,
    ) -> TypeName {
        MK_TYPE_NAME!(
            self,
            TypeNameKind::Function(FunctionTypeName {
                parameter_types,
                return_parameter_types,
                visibility,
                state_mutability: StateMutability::NonPayable,
            })
        )
    }

    // EXPRESSIONS

    pub fn ident(&mut self, name: &str, declaration: NodeId) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Identifier(Identifier {
                name: String::from(name),
                referenced_declaration: Some(declaration),
                overloaded_declarations: vec![],
            })
        )
    }

    /// An identifier the name resolver could not link.
    pub fn unlinked_ident(&mut self, name: &str) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Identifier(Identifier {
                name: String::from(name),
                referenced_declaration: None,
                overloaded_declarations: vec![],
            })
        )
    }

    pub fn overloaded_ident(&mut self, name: &str, candidates: Vec<NodeId>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Identifier(Identifier {
                name: String::from(name),
                referenced_declaration: None,
                overloaded_declarations: candidates,
            })
        )
    }

    /// Reference to a global such as `msg`, `abi` or `require`.
    pub fn global(&mut self, name: &str) -> Expression {
        let ids = global_ids(name);
        if ids.len() == 1 {
            self.ident(name, ids[0])
        } else {
            self.overloaded_ident(name, ids)
        }
    }

    pub fn type_expr(&mut self, name: &str) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::ElementaryTypeName(ElementaryTypeNameExpr { name: String::from(name), payable: false })
        )
    }

    pub fn payable_expr(&mut self) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::ElementaryTypeName(ElementaryTypeNameExpr { name: String::from("address"), payable: true })
        )
    }

    fn literal(&mut self, kind: LiteralKind, value: &str, sub_denomination: Option<SubDenomination>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Literal(Literal { kind, value: String::from(value), sub_denomination })
        )
    }

    pub fn number(&mut self, value: &str) -> Expression {
        self.literal(LiteralKind::Number, value, None)
    }

    pub fn number_with_unit(&mut self, value: &str, unit: SubDenomination) -> Expression {
        self.literal(LiteralKind::Number, value, Some(unit))
    }

    pub fn boolean(&mut self, value: bool) -> Expression {
        self.literal(LiteralKind::Bool, if value { "true" } else { "false" }, None)
    }

    pub fn string(&mut self, value: &str) -> Expression {
        self.literal(LiteralKind::String, value, None)
    }

    pub fn hex_string(&mut self, value: &str) -> Expression {
        self.literal(LiteralKind::HexString, value, None)
    }

    pub fn unary(&mut self, operator: UnaryOperator, sub_expression: Expression) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Unary(UnaryExpr { operator, prefix: true, sub_expression: Box::new(sub_expression) })
        )
    }

    pub fn binary(&mut self, operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Binary(BinaryExpr { operator, left: Box::new(left), right: Box::new(right) })
        )
    }

    pub fn assign(&mut self, left: Expression, right: Expression) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Assignment(AssignmentExpr { operator: None, left: Box::new(left), right: Box::new(right) })
        )
    }

    pub fn compound_assign(&mut self, operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Assignment(AssignmentExpr {
                operator: Some(operator),
                left: Box::new(left),
                right: Box::new(right),
            })
        )
    }

    pub fn conditional(&mut self, condition: Expression, true_expression: Expression, false_expression: Expression) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Conditional(ConditionalExpr {
                condition: Box::new(condition),
                true_expression: Box::new(true_expression),
                false_expression: Box::new(false_expression),
            })
        )
    }

    pub fn tuple(&mut self, components: Vec<Option<Expression>>) -> Expression {
        MK_EXPR!(self, ExprKind::Tuple(TupleExpr { components, is_inline_array: false }))
    }

    pub fn inline_array(&mut self, components: Vec<Expression>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::Tuple(TupleExpr {
                components: components.into_iter().map(Some).collect(),
                is_inline_array: true,
            })
        )
    }

    pub fn call(&mut self, callee: Expression, arguments: Vec<Expression>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::FunctionCall(FunctionCallExpr { expression: Box::new(callee), arguments, names: vec![] })
        )
    }

    pub fn named_call(&mut self, callee: Expression, names: Vec<&str>, arguments: Vec<Expression>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::FunctionCall(FunctionCallExpr {
                expression: Box::new(callee),
                arguments,
                names: names.into_iter().map(String::from).collect(),
            })
        )
    }

    pub fn call_options(&mut self, callee: Expression, names: Vec<&str>, options: Vec<Expression>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::CallOptions(CallOptionsExpr {
                expression: Box::new(callee),
                names: names.into_iter().map(String::from).collect(),
                options,
            })
        )
    }

    pub fn new_expr(&mut self, type_name: TypeName) -> Expression {
        MK_EXPR!(self, ExprKind::New(NewExpr { type_name }))
    }

    pub fn await_expr(&mut self, expression: Expression) -> Expression {
        MK_EXPR!(self, ExprKind::Await(AwaitExpr { expression: Box::new(expression) }))
    }

    pub fn member(&mut self, expression: Expression, member_name: &str) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::MemberAccess(MemberAccessExpr {
                expression: Box::new(expression),
                member_name: String::from(member_name),
            })
        )
    }

    pub fn index(&mut self, base: Expression, index: Option<Expression>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::IndexAccess(IndexAccessExpr { base: Box::new(base), index: index.map(Box::new) })
        )
    }

    pub fn range(&mut self, base: Expression, start: Option<Expression>, end: Option<Expression>) -> Expression {
        MK_EXPR!(
            self,
            ExprKind::IndexRangeAccess(IndexRangeAccessExpr {
                base: Box::new(base),
                start: start.map(Box::new),
                end: end.map(Box::new),
            })
        )
    }

    // STATEMENTS

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        let (id, span) = self.allocate();
        Block { id, statements, unchecked: false, span }
    }

    pub fn block_stmt(&mut self, statements: Vec<Statement>) -> Statement {
        let block = self.block(statements);
        MK_STMT!(self, StmtKind::Block(block))
    }

    pub fn expr_stmt(&mut self, expression: Expression) -> Statement {
        MK_STMT!(self, StmtKind::Expression(ExpressionStmt { expression }))
    }

    pub fn ret(&mut self, expression: Option<Expression>) -> Statement {
        MK_STMT!(self, StmtKind::Return(ReturnStmt { expression }))
    }

    pub fn emit(&mut self, event_call: Expression) -> Statement {
        MK_STMT!(self, StmtKind::Emit(EmitStmt { event_call }))
    }

    pub fn var_stmt(&mut self, declaration: VariableDeclaration, initial_value: Option<Expression>) -> Statement {
        MK_STMT!(
            self,
            StmtKind::VariableDeclaration(VariableDeclarationStmt { declarations: vec![Some(declaration)], initial_value })
        )
    }

    pub fn tuple_var_stmt(&mut self, declarations: Vec<Option<VariableDeclaration>>, initial_value: Expression) -> Statement {
        MK_STMT!(
            self,
            StmtKind::VariableDeclaration(VariableDeclarationStmt { declarations, initial_value: Some(initial_value) })
        )
    }

    pub fn if_stmt(&mut self, condition: Expression, true_body: Statement, false_body: Option<Statement>) -> Statement {
        MK_STMT!(
            self,
            StmtKind::If(IfStmt { condition, true_body: Box::new(true_body), false_body: false_body.map(Box::new) })
        )
    }

    pub fn while_stmt(&mut self, condition: Expression, body: Statement) -> Statement {
        MK_STMT!(self, StmtKind::While(WhileStmt { condition, body: Box::new(body), is_do_while: false }))
    }

    pub fn for_stmt(
        &mut self,
        initialization: Option<Statement>,
        condition: Option<Expression>,
        loop_expression: Option<Expression>,
        body: Statement,
    ) -> Statement {
        MK_STMT!(
            self,
            StmtKind::For(ForStmt {
                initialization: initialization.map(Box::new),
                condition,
                loop_expression,
                body: Box::new(body),
            })
        )
    }

    pub fn placeholder(&mut self) -> Statement {
        MK_STMT!(self, StmtKind::Placeholder)
    }

    pub fn try_stmt(&mut self, external_call: Expression, clauses: Vec<TryCatchClause>) -> Statement {
        MK_STMT!(self, StmtKind::Try(TryStmt { external_call, clauses }))
    }

    pub fn catch_clause(&mut self, error_name: &str, parameters: Option<Vec<VariableDeclaration>>, block: Block) -> TryCatchClause {
        let (id, span) = self.allocate();
        TryCatchClause { id, error_name: String::from(error_name), parameters, block, span }
    }

    // DECLARATIONS

    /// Local variable or parameter without an explicit data location.
    pub fn variable(&mut self, name: &str, type_name: TypeName) -> VariableDeclaration {
        self.variable_at(name, type_name, DataLocationKeyword::Default)
    }

    pub fn variable_at(&mut self, name: &str, type_name: TypeName, location: DataLocationKeyword) -> VariableDeclaration {
        let (id, span) = self.allocate();
        VariableDeclaration {
            id,
            name: String::from(name),
            type_name: Some(type_name),
            value: None,
            visibility: Visibility::Internal,
            mutability: VariableMutability::Mutable,
            location,
            is_state_variable: false,
            indexed: false,
            span,
        }
    }

    pub fn state_variable(&mut self, name: &str, type_name: TypeName, value: Option<Expression>) -> VariableDeclaration {
        let mut variable = self.variable(name, type_name);
        variable.is_state_variable = true;
        variable.value = value;
        variable
    }

    pub fn function(
        &mut self,
        name: &str,
        parameters: Vec<VariableDeclaration>,
        return_parameters: Vec<VariableDeclaration>,
        body: Option<Block>,
    ) -> FunctionDefinition {
        let (id, span) = self.allocate();
        FunctionDefinition {
            id,
            name: String::from(name),
            kind: FunctionKind::Function,
            visibility: Visibility::Public,
            state_mutability: StateMutability::NonPayable,
            is_virtual: false,
            parameters,
            return_parameters,
            modifiers: vec![],
            body,
            span,
        }
    }

    pub fn special_function(&mut self, kind: FunctionKind, body: Block) -> FunctionDefinition {
        let mut function = self.function("", vec![], vec![], Some(body));
        function.kind = kind;
        function.visibility = match kind {
            FunctionKind::Fallback | FunctionKind::Receive => Visibility::External,
            _ => Visibility::Public,
        };
        if kind == FunctionKind::Receive {
            function.state_mutability = StateMutability::Payable;
        }
        function
    }

    pub fn modifier(&mut self, name: &str, parameters: Vec<VariableDeclaration>, body: Block) -> ModifierDefinition {
        let (id, span) = self.allocate();
        ModifierDefinition { id, name: String::from(name), parameters, body: Some(body), span }
    }

    pub fn modifier_invocation(&mut self, name: &str, declaration: NodeId, arguments: Option<Vec<Expression>>) -> ModifierInvocation {
        let modifier_name = self.path(name, declaration);
        let (id, span) = self.allocate();
        ModifierInvocation { id, modifier_name, arguments, span }
    }

    pub fn event(&mut self, name: &str, parameters: Vec<VariableDeclaration>) -> EventDefinition {
        let (id, span) = self.allocate();
        EventDefinition { id, name: String::from(name), parameters, anonymous: false, span }
    }

    pub fn message(
        &mut self,
        name: &str,
        parameters: Vec<VariableDeclaration>,
        return_parameters: Vec<VariableDeclaration>,
    ) -> MessageDefinition {
        let (id, span) = self.allocate();
        MessageDefinition { id, name: String::from(name), parameters, return_parameters, span }
    }

    pub fn struct_def(&mut self, name: &str, members: Vec<VariableDeclaration>) -> StructDefinition {
        let (id, span) = self.allocate();
        StructDefinition { id, name: String::from(name), members, span }
    }

    pub fn using_for(&mut self, library: &str, library_id: NodeId, type_name: Option<TypeName>) -> UsingForDirective {
        let library_name = self.path(library, library_id);
        let (id, span) = self.allocate();
        UsingForDirective { id, library_name, type_name, span }
    }

    pub fn inheritance(&mut self, base: &str, base_id: NodeId, arguments: Option<Vec<Expression>>) -> InheritanceSpecifier {
        let base_name = self.path(base, base_id);
        let (id, span) = self.allocate();
        InheritanceSpecifier { id, base_name, arguments, span }
    }

    /// Reserves an id for a contract that is assembled later with `contract_with_id`,
    /// so that members can refer to it (e.g. `new C`).
    pub fn reserve(&mut self) -> NodeId {
        self.allocate().0
    }

    pub fn contract(&mut self, name: &str, base_contracts: Vec<InheritanceSpecifier>, nodes: Vec<ContractPart>) -> ContractDefinition {
        let id = self.reserve();
        self.contract_with_id(id, name, ContractKind::Contract, base_contracts, nodes)
    }

    pub fn contract_with_id(
        &mut self,
        id: NodeId,
        name: &str,
        kind: ContractKind,
        base_contracts: Vec<InheritanceSpecifier>,
        nodes: Vec<ContractPart>,
    ) -> ContractDefinition {
        let span = Span {
            start: Position(id.0 as u32, Rc::clone(&self.file)),
            end: Position(id.0 as u32 + 1, Rc::clone(&self.file)),
        };
        ContractDefinition {
            id,
            name: String::from(name),
            kind,
            is_abstract: false,
            base_contracts,
            linearized_base_contracts: vec![],
            nodes,
            span,
        }
    }

    pub fn source_unit(&mut self, nodes: Vec<SourceUnitPart>) -> SourceUnit {
        let (id, span) = self.allocate();
        SourceUnit {
            id,
            path: (*self.file).clone(),
            abi_coder: None,
            nodes,
            span,
        }
    }
}
