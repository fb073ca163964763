//! AST → IR lowering
//!
//! The whole program becomes one `i32 main()` function. Variables are not
//! given stack slots: the lowering environment maps each visible name to the
//! SSA value it currently holds, and control-flow joins merge diverging
//! values with phis.
//!
//! Symbols and values are kept in two parallel scope stacks that are always
//! pushed and popped together through [`ScopeGuard`].

pub mod assigned;
pub mod error;

pub use assigned::AssignedNames;
pub use error::LowerError;

use mc_ast::{BinaryOp, CompareOp, Expr, ExprVisitor, Program, Stmt, StmtVisitor};
use mc_ir::{ArithOp, BlockId, FunctionBuilder, IcmpPred, Module, Type, Value};
use mc_resolve::{
    ExternFunction, ScopeError, ScopeGuard, ScopeOwner, ScopeStack, SymbolKind, SymbolTable,
};

/// Name of the function holding the program's statements
pub const ENTRY_FUNCTION: &str = "main";

/// Lower `program` into a module named after the anonymous source
///
/// # Errors
///
/// See [`lower_named`].
pub fn lower_program(program: &Program, externs: &[ExternFunction]) -> Result<Module, LowerError> {
    lower_named("<input>", program, externs)
}

/// Lower `program` into a module called `name`
///
/// `externs` are the functions calls may target. Only those actually called
/// are declared in the module.
///
/// # Errors
///
/// Returns a [`LowerError`] when the program refers to a name with no
/// binding or calls something that is not a declared function. Programs
/// that passed [`mc_resolve::resolve_program`] with the same externs do not
/// fail.
pub fn lower_named(
    name: &str,
    program: &Program,
    externs: &[ExternFunction],
) -> Result<Module, LowerError> {
    let mut lowerer = Lowerer::new(name);
    for func in externs {
        lowerer.symbols.declare(
            &func.name,
            SymbolKind::Function {
                arity: func.arity,
            },
        )?;
    }
    lowerer.lower(program)?;
    lowerer.finish()
}

/// Tree-walking lowering engine
#[derive(Debug)]
pub struct Lowerer {
    builder: FunctionBuilder,
    module: Module,
    symbols: SymbolTable,
    /// Current SSA value of every visible variable
    env: ScopeStack<Value>,
}

/// Environment as it leaves one predecessor of a join block
type Edge = (BlockId, ScopeStack<Value>);

impl Lowerer {
    /// Create a lowerer positioned at the entry of an empty `main`
    #[must_use]
    pub fn new(module_name: &str) -> Self {
        Self {
            builder: FunctionBuilder::new(ENTRY_FUNCTION, Type::Int),
            module: Module::new(module_name),
            symbols: SymbolTable::new(),
            env: ScopeStack::new(),
        }
    }

    /// Lower the program's statements inside their own scope
    ///
    /// # Errors
    ///
    /// Propagates the first [`LowerError`].
    pub fn lower(&mut self, program: &Program) -> Result<(), LowerError> {
        ScopeGuard::new(self).lower_stmts(&program.statements)
    }

    /// Close `main` with `ret i32 0` if needed and return the module
    ///
    /// # Errors
    ///
    /// Fails if the builder holds an unterminated block.
    pub fn finish(mut self) -> Result<Module, LowerError> {
        if !self.builder.is_terminated() {
            self.builder.build_ret(Value::Const(0))?;
        }
        let function = self.builder.finish()?;
        log::debug!(
            "lowered {}: {} blocks, {} instructions",
            function.name,
            function.layout.len(),
            function.insts.len()
        );
        self.module.functions.push(function);
        Ok(self.module)
    }

    /// Lower a statement list, dropping whatever follows a terminator
    fn lower_stmts(&mut self, stmts: &[Stmt]) -> Result<(), LowerError> {
        for (idx, stmt) in stmts.iter().enumerate() {
            if self.builder.is_terminated() {
                log::debug!(
                    "skipping {} unreachable statement(s) in {}",
                    stmts.len() - idx,
                    self.builder.label(self.builder.current_block())
                );
                break;
            }
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    /// Branch and loop bodies are scopes of their own
    fn lower_nested(&mut self, stmt: &Stmt) -> Result<(), LowerError> {
        ScopeGuard::new(self).visit_stmt(stmt)
    }

    /// Lower `expr` as an `i32`, widening comparison results
    fn lower_int(&mut self, expr: &Expr) -> Result<Value, LowerError> {
        let value = self.visit_expr(expr)?;
        if self.builder.value_type(value) == Type::Bool {
            return Ok(self.builder.build_zext(value)?);
        }
        Ok(value)
    }

    /// Lower `expr` as an `i1`; integers are true when non-zero
    fn lower_condition(&mut self, expr: &Expr) -> Result<Value, LowerError> {
        let value = self.visit_expr(expr)?;
        if self.builder.value_type(value) == Type::Int {
            return Ok(self
                .builder
                .build_icmp(IcmpPred::Ne, value, Value::Const(0))?);
        }
        Ok(value)
    }

    /// Environment to continue with at a join block
    ///
    /// Bindings that agree on every edge keep their value; the rest get a phi
    /// in the current block.
    fn merge(&mut self, before: ScopeStack<Value>, edges: &[Edge]) -> Result<(), LowerError> {
        let slots: Vec<(usize, String)> = before
            .bindings()
            .map(|(depth, name, _)| (depth, name.to_owned()))
            .collect();
        self.env = before;

        for (depth, name) in slots {
            let incoming: Vec<(Value, BlockId)> = edges
                .iter()
                .filter_map(|(block, env)| env.get_at(depth, &name).map(|value| (*value, *block)))
                .collect();
            let Some(&(first_value, _)) = incoming.first() else {
                continue;
            };
            if incoming.iter().all(|(value, _)| *value == first_value) {
                self.env.set_at(depth, &name, first_value);
                continue;
            }

            let phi = self.builder.build_phi(Type::Int)?;
            for (value, block) in incoming {
                self.builder.add_incoming(phi, value, block)?;
            }
            log::trace!("phi for {name} at depth {depth}");
            self.env.set_at(depth, &name, Value::Inst(phi));
        }
        Ok(())
    }

    /// Record the current block as a predecessor of `target` and jump there
    fn exit_to(&mut self, target: BlockId, edges: &mut Vec<Edge>) -> Result<(), LowerError> {
        if self.builder.is_terminated() {
            return Ok(());
        }
        edges.push((self.builder.current_block(), self.env.clone()));
        self.builder.build_br(target)?;
        Ok(())
    }
}

impl ScopeOwner for Lowerer {
    fn push_scope(&mut self) {
        self.symbols.push_scope();
        self.env.push_scope();
    }

    fn pop_scope(&mut self) -> Result<(), ScopeError> {
        let symbols = self.symbols.pop_scope();
        self.env.pop_scope()?;
        symbols
    }
}

impl ExprVisitor for Lowerer {
    type Output = Result<Value, LowerError>;

    fn visit_integer_literal(&mut self, value: i32) -> Result<Value, LowerError> {
        Ok(Value::Const(value))
    }

    fn visit_variable(&mut self, name: &str) -> Result<Value, LowerError> {
        self.env
            .lookup(name)
            .copied()
            .ok_or_else(|| LowerError::UnboundName {
                name: name.to_owned(),
            })
    }

    fn visit_binary_op(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, LowerError> {
        let lhs = self.lower_int(left)?;
        let rhs = self.lower_int(right)?;
        let op = match op {
            BinaryOp::Add => ArithOp::Add,
            BinaryOp::Sub => ArithOp::Sub,
            BinaryOp::Mul => ArithOp::Mul,
            BinaryOp::Div => ArithOp::SDiv,
        };
        Ok(self.builder.build_binary(op, lhs, rhs)?)
    }

    fn visit_comparison(
        &mut self,
        op: CompareOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, LowerError> {
        let lhs = self.lower_int(left)?;
        let rhs = self.lower_int(right)?;
        let pred = match op {
            CompareOp::Lt => IcmpPred::Slt,
            CompareOp::Gt => IcmpPred::Sgt,
            CompareOp::Le => IcmpPred::Sle,
            CompareOp::Ge => IcmpPred::Sge,
            CompareOp::Eq => IcmpPred::Eq,
            CompareOp::Ne => IcmpPred::Ne,
        };
        Ok(self.builder.build_icmp(pred, lhs, rhs)?)
    }

    fn visit_call(&mut self, name: &str, args: &[Expr]) -> Result<Value, LowerError> {
        let arity = match self.symbols.lookup(name).map(|symbol| symbol.kind) {
            Some(SymbolKind::Function { arity }) => arity,
            _ => {
                return Err(LowerError::NotCallable {
                    name: name.to_owned(),
                });
            }
        };
        if arity != args.len() {
            return Err(LowerError::ArityMismatch {
                name: name.to_owned(),
                expected: arity,
                found: args.len(),
            });
        }

        let values = args
            .iter()
            .map(|arg| self.lower_int(arg))
            .collect::<Result<Vec<_>, _>>()?;
        self.module.declare_extern(name, arity);
        Ok(self.builder.build_call(name, values)?)
    }
}

impl StmtVisitor for Lowerer {
    type Output = Result<(), LowerError>;

    fn visit_return(&mut self, value: &Expr) -> Result<(), LowerError> {
        let value = self.lower_int(value)?;
        self.builder.build_ret(value)?;
        Ok(())
    }

    fn visit_var_decl(&mut self, name: &str, initializer: Option<&Expr>) -> Result<(), LowerError> {
        let value = match initializer {
            Some(init) => self.lower_int(init)?,
            None => Value::Const(0),
        };
        self.symbols.declare(name, SymbolKind::Variable)?;
        self.env.declare(name, value)?;
        Ok(())
    }

    fn visit_assignment(&mut self, name: &str, value: &Expr) -> Result<(), LowerError> {
        let value = self.lower_int(value)?;
        if self.env.assign(name, value) {
            Ok(())
        } else {
            Err(LowerError::UnboundName {
                name: name.to_owned(),
            })
        }
    }

    fn visit_block(&mut self, body: &[Stmt]) -> Result<(), LowerError> {
        ScopeGuard::new(self).lower_stmts(body)
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), LowerError> {
        let cond = self.lower_condition(condition)?;
        let origin = self.builder.current_block();
        let then_block = self.builder.new_block("if.then");
        let else_block = else_branch.map(|_| self.builder.new_block("if.else"));
        let end_block = self.builder.new_block("if.end");
        self.builder
            .build_cond_br(cond, then_block, else_block.unwrap_or(end_block))?;

        let before = self.env.clone();
        let mut edges = Vec::new();

        self.builder.position_at_end(then_block);
        self.lower_nested(then_branch)?;
        self.exit_to(end_block, &mut edges)?;

        match (else_branch, else_block) {
            (Some(else_stmt), Some(else_block)) => {
                self.env = before.clone();
                self.builder.position_at_end(else_block);
                self.lower_nested(else_stmt)?;
                self.exit_to(end_block, &mut edges)?;
            }
            _ => edges.push((origin, before.clone())),
        }

        self.builder.position_at_end(end_block);
        match edges.len() {
            // Both branches returned; what follows is unreachable
            0 => self.env = before,
            1 => {
                if let Some((_, env)) = edges.pop() {
                    self.env = env;
                }
            }
            _ => self.merge(before, &edges)?,
        }
        Ok(())
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), LowerError> {
        let preheader = self.builder.current_block();
        let header = self.builder.new_block("while.cond");
        let body_block = self.builder.new_block("while.body");
        let exit = self.builder.new_block("while.end");
        self.builder.build_br(header)?;
        self.builder.position_at_end(header);

        // Loop-carried variables get their phi before the condition reads them
        let mut carried = Vec::new();
        for name in AssignedNames::collect(body) {
            let Some((depth, &initial)) = self.env.lookup_with_depth(&name) else {
                continue;
            };
            let phi = self.builder.build_phi(Type::Int)?;
            self.builder.add_incoming(phi, initial, preheader)?;
            self.env.set_at(depth, &name, Value::Inst(phi));
            carried.push((depth, name, phi));
        }

        let cond = self.lower_condition(condition)?;
        self.builder.build_cond_br(cond, body_block, exit)?;

        self.builder.position_at_end(body_block);
        self.lower_nested(body)?;
        if !self.builder.is_terminated() {
            let latch = self.builder.current_block();
            for (depth, name, phi) in &carried {
                let value = self
                    .env
                    .get_at(*depth, name)
                    .copied()
                    .ok_or_else(|| LowerError::UnboundName { name: name.clone() })?;
                self.builder.add_incoming(*phi, value, latch)?;
            }
            self.builder.build_br(header)?;
        }

        // The header dominates the exit, so its phis are the values after the loop
        for (depth, name, phi) in carried {
            self.env.set_at(depth, &name, Value::Inst(phi));
        }
        self.builder.position_at_end(exit);
        Ok(())
    }

    fn visit_expr_stmt(&mut self, value: &Expr) -> Result<(), LowerError> {
        self.visit_expr(value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use mc_ir::Terminator;

    fn externs() -> Vec<ExternFunction> {
        vec![ExternFunction::new("print", 1)]
    }

    fn lower(source: &str) -> Module {
        let program = mc_parser::parse_program(source).unwrap();
        lower_program(&program, &externs()).unwrap()
    }

    fn lower_err(source: &str) -> LowerError {
        let program = mc_parser::parse_program(source).unwrap();
        lower_program(&program, &externs()).unwrap_err()
    }

    fn main_of(module: &Module) -> &mc_ir::Function {
        module.function(ENTRY_FUNCTION).unwrap()
    }

    #[test]
    fn test_arithmetic_return() {
        let module = lower("return 2 + 3;");
        assert_eq!(main_of(&module).layout.len(), 1);
        expect![[r#"
            define i32 @main() {
            entry:
              %0 = add i32 2, 3
              ret i32 %0
            }
        "#]]
        .assert_eq(&module.to_string());
    }

    #[test]
    fn test_implicit_return_zero() {
        expect![[r#"
            declare i32 @print(i32)

            define i32 @main() {
            entry:
              %0 = call i32 @print(i32 7)
              ret i32 0
            }
        "#]]
        .assert_eq(&lower("print(7);").to_string());
    }

    #[test]
    fn test_variables_are_ssa_values() {
        let module = lower("int x; x = 1; return x;");
        let main = main_of(&module);
        let entry = &main.blocks[main.entry];
        assert!(entry.insts.is_empty());
        assert_eq!(
            entry.terminator,
            Some(Terminator::Ret {
                value: Value::Const(1)
            })
        );
    }

    #[test]
    fn test_uninitialized_declaration_is_zero() {
        let module = lower("int x; return x;");
        let main = main_of(&module);
        assert_eq!(
            main.blocks[main.entry].terminator,
            Some(Terminator::Ret {
                value: Value::Const(0)
            })
        );
    }

    #[test]
    fn test_unbound_variable_emits_nothing() {
        let mut lowerer = Lowerer::new("test");
        let expr = Expr::binary(BinaryOp::Add, Expr::var("x"), Expr::int(1));
        assert_eq!(
            lowerer.visit_expr(&expr),
            Err(LowerError::UnboundName {
                name: "x".to_string()
            })
        );
        assert_eq!(lowerer.builder.function().insts.len(), 0);

        assert!(matches!(
            lower_err("y = 1;"),
            LowerError::UnboundName { name } if name == "y"
        ));
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            lower_err("int f; f(1);"),
            LowerError::NotCallable {
                name: "f".to_string()
            }
        );
        assert_eq!(
            lower_err("print(1, 2);"),
            LowerError::ArityMismatch {
                name: "print".to_string(),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn test_comparison_widened_in_integer_context() {
        expect![[r#"
            define i32 @main() {
            entry:
              %0 = icmp slt i32 1, 2
              %1 = zext i1 %0 to i32
              ret i32 %1
            }
        "#]]
        .assert_eq(&lower("return 1 < 2;").to_string());
    }

    #[test]
    fn test_block_shadowing() {
        expect![[r#"
            declare i32 @print(i32)

            define i32 @main() {
            entry:
              %0 = call i32 @print(i32 2)
              ret i32 1
            }
        "#]]
        .assert_eq(&lower("int x = 1; { int x = 2; print(x); } return x;").to_string());
    }

    #[test]
    fn test_if_else_merges_with_phi() {
        let source = "
            int x = 1;
            if (x > 0) x = 2; else x = 3;
            return x;
        ";
        expect![[r#"
            define i32 @main() {
            entry:
              %0 = icmp sgt i32 1, 0
              br i1 %0, label %if.then.1, label %if.else.2

            if.then.1:
              br label %if.end.3

            if.else.2:
              br label %if.end.3

            if.end.3:
              %1 = phi i32 [ 2, %if.then.1 ], [ 3, %if.else.2 ]
              ret i32 %1
            }
        "#]]
        .assert_eq(&lower(source).to_string());
    }

    #[test]
    fn test_if_without_changes_needs_no_phi() {
        expect![[r#"
            declare i32 @print(i32)

            define i32 @main() {
            entry:
              %0 = icmp ne i32 5, 0
              br i1 %0, label %if.then.1, label %if.end.2

            if.then.1:
              %1 = call i32 @print(i32 5)
              br label %if.end.2

            if.end.2:
              ret i32 5
            }
        "#]]
        .assert_eq(&lower("int x = 5; if (x) print(x); return x;").to_string());
    }

    #[test]
    fn test_while_loop_carries_values() {
        let source = "
            int i = 0;
            int sum = 0;
            while (i < 3) {
                sum = sum + i;
                i = i + 1;
            }
            return sum;
        ";
        expect![[r#"
            define i32 @main() {
            entry:
              br label %while.cond.1

            while.cond.1:
              %0 = phi i32 [ 0, %entry ], [ %3, %while.body.2 ]
              %1 = phi i32 [ 0, %entry ], [ %4, %while.body.2 ]
              %2 = icmp slt i32 %1, 3
              br i1 %2, label %while.body.2, label %while.end.3

            while.body.2:
              %3 = add i32 %0, %1
              %4 = add i32 %1, 1
              br label %while.cond.1

            while.end.3:
              ret i32 %0
            }
        "#]]
        .assert_eq(&lower(source).to_string());
    }

    #[test]
    fn test_shadowed_loop_variable_needs_no_phi() {
        let module = lower("int x = 0; while (x < 1) { int x = 5; x = 6; } return x;");
        assert_eq!(main_of(&module).phi_count(), 0);
    }

    #[test]
    fn test_statements_after_return_are_skipped() {
        let module = lower("return 1; print(2);");
        assert!(module.externs.is_empty());
        let main = main_of(&module);
        assert_eq!(main.insts.len(), 0);
        assert_eq!(main.layout.len(), 1);
    }

    #[test]
    fn test_returning_branches_leave_unreachable_join() {
        let module = lower("if (1) return 1; else return 2; return 3;");
        let main = main_of(&module);
        assert_eq!(main.layout.len(), 4);
        let join = main.block_by_label("if.end.3").unwrap();
        assert_eq!(
            join.terminator,
            Some(Terminator::Ret {
                value: Value::Const(3)
            })
        );
        assert_eq!(main.phi_count(), 0);
    }

    #[test]
    fn test_scopes_balanced_after_lowering() {
        let program =
            mc_parser::parse_program("int a = 1; while (a < 4) { if (a == 2) { int b; } a = a + 1; }")
                .unwrap();
        let mut lowerer = Lowerer::new("test");
        lowerer.lower(&program).unwrap();
        assert_eq!(lowerer.env.depth(), 1);
        assert_eq!(lowerer.symbols.depth(), 1);
        lowerer.finish().unwrap();
    }

    #[test]
    fn test_scopes_balanced_after_failed_lowering() {
        let program = mc_parser::parse_program("{ { y = 1; } }").unwrap();
        let mut lowerer = Lowerer::new("test");
        assert_eq!(
            lowerer.lower(&program),
            Err(LowerError::UnboundName {
                name: "y".to_string()
            })
        );
        assert_eq!(lowerer.env.depth(), 1);
        assert_eq!(lowerer.symbols.depth(), 1);

        let program = mc_parser::parse_program("int x = 0; while (x < 2) { if (x) { print(x, x); } }")
            .unwrap();
        let mut lowerer = Lowerer::new("test");
        assert!(matches!(
            lowerer.lower(&program),
            Err(LowerError::NotCallable { .. })
        ));
        assert_eq!(lowerer.env.depth(), 1);
        assert_eq!(lowerer.symbols.depth(), 1);
    }
}
