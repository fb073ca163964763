//! Pretty-printer producing source text the parser accepts
//!
//! Parentheses are emitted only where operator precedence requires them, so
//! printing and re-parsing yields a structurally equal tree.
//!
//! One shape has no brace-free spelling: an `if` with an `else` whose
//! then-branch ends in an `if` without one. Written plainly, the parser would
//! give the `else` to the inner `if`, so that then-branch is printed inside
//! `{ }` and re-parses as a single-statement block.

use crate::visitor::{ExprVisitor, StmtVisitor};
use crate::{BinaryOp, CompareOp, Expr, Program, Stmt};
use std::fmt;
use std::slice;

const INDENT: &str = "    ";

/// Binding strength of an expression, loosest first
const PREC_TOP: u8 = 0;
const PREC_COMPARISON: u8 = 1;
const PREC_ADDITIVE: u8 = 2;
const PREC_MULTIPLICATIVE: u8 = 3;

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => PREC_ADDITIVE,
        BinaryOp::Mul | BinaryOp::Div => PREC_MULTIPLICATIVE,
    }
}

/// Whether `stmt`, printed without braces, ends in an `if` with no `else`
fn ends_in_open_if(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::If {
            else_branch: None, ..
        } => true,
        Stmt::If {
            else_branch: Some(else_stmt),
            ..
        } => ends_in_open_if(else_stmt),
        Stmt::While { body, .. } => ends_in_open_if(body),
        _ => false,
    }
}

/// AST pretty-printer
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    indent: usize,
    /// Loosest precedence the expression being printed may have without parentheses
    min_prec: u8,
}

impl Printer {
    /// Creates an empty printer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a whole program
    #[must_use]
    pub fn print_program(mut self, program: &Program) -> String {
        for stmt in &program.statements {
            self.visit_stmt(stmt);
        }
        self.out
    }

    /// Renders a single statement, newline-terminated
    #[must_use]
    pub fn print_stmt(mut self, stmt: &Stmt) -> String {
        self.visit_stmt(stmt);
        self.out
    }

    /// Renders a single expression
    #[must_use]
    pub fn print_expr(mut self, expr: &Expr) -> String {
        self.visit_expr(expr);
        self.out
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn write_nested(&mut self, expr: &Expr, min_prec: u8) {
        let outer = self.min_prec;
        self.min_prec = min_prec;
        self.visit_expr(expr);
        self.min_prec = outer;
    }

    fn write_infix(&mut self, prec: u8, left: (&Expr, u8), symbol: &str, right: (&Expr, u8)) {
        let parenthesize = prec < self.min_prec;
        if parenthesize {
            self.out.push('(');
        }
        self.write_nested(left.0, left.1);
        self.out.push(' ');
        self.out.push_str(symbol);
        self.out.push(' ');
        self.write_nested(right.0, right.1);
        if parenthesize {
            self.out.push(')');
        }
    }

    fn write_body(&mut self, body: &[Stmt]) {
        self.indent += 1;
        for stmt in body {
            self.visit_stmt(stmt);
        }
        self.indent -= 1;
    }

    fn write_braced(&mut self, body: &[Stmt]) {
        self.out.push_str(" {\n");
        self.write_body(body);
        self.write_indent();
        self.out.push_str("}\n");
    }

    /// Writes a branch or loop body that starts on the current line
    fn write_attached(&mut self, stmt: &Stmt) {
        if let Stmt::Block { body } = stmt {
            self.write_braced(body);
        } else {
            self.out.push('\n');
            self.indent += 1;
            self.visit_stmt(stmt);
            self.indent -= 1;
        }
    }

    fn write_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.out.push_str("if (");
        self.write_nested(condition, PREC_TOP);
        self.out.push(')');

        let braced = else_branch.is_some() && ends_in_open_if(then_branch);
        if braced {
            self.write_braced(slice::from_ref(then_branch));
        } else {
            self.write_attached(then_branch);
        }

        let Some(else_stmt) = else_branch else {
            return;
        };

        if braced || matches!(then_branch, Stmt::Block { .. }) {
            // `} else` on one line
            self.out.pop();
            self.out.push_str(" else");
        } else {
            self.write_indent();
            self.out.push_str("else");
        }

        if let Stmt::If {
            condition,
            then_branch,
            else_branch,
        } = else_stmt
        {
            self.out.push(' ');
            self.write_if(condition, then_branch, else_branch.as_deref());
        } else {
            self.write_attached(else_stmt);
        }
    }
}

impl ExprVisitor for Printer {
    type Output = ();

    fn visit_integer_literal(&mut self, value: i32) {
        self.out.push_str(&value.to_string());
    }

    fn visit_variable(&mut self, name: &str) {
        self.out.push_str(name);
    }

    fn visit_binary_op(&mut self, op: BinaryOp, left: &Expr, right: &Expr) {
        let prec = binary_precedence(op);
        // Left-associative: a right operand of equal precedence needs parentheses
        self.write_infix(prec, (left, prec), &op.to_string(), (right, prec + 1));
    }

    fn visit_comparison(&mut self, op: CompareOp, left: &Expr, right: &Expr) {
        // Non-associative: comparison operands never nest without parentheses
        self.write_infix(
            PREC_COMPARISON,
            (left, PREC_ADDITIVE),
            &op.to_string(),
            (right, PREC_ADDITIVE),
        );
    }

    fn visit_call(&mut self, name: &str, args: &[Expr]) {
        self.out.push_str(name);
        self.out.push('(');
        for (idx, arg) in args.iter().enumerate() {
            if idx > 0 {
                self.out.push_str(", ");
            }
            self.write_nested(arg, PREC_TOP);
        }
        self.out.push(')');
    }
}

impl StmtVisitor for Printer {
    type Output = ();

    fn visit_return(&mut self, value: &Expr) {
        self.write_indent();
        self.out.push_str("return ");
        self.write_nested(value, PREC_TOP);
        self.out.push_str(";\n");
    }

    fn visit_var_decl(&mut self, name: &str, initializer: Option<&Expr>) {
        self.write_indent();
        self.out.push_str("int ");
        self.out.push_str(name);
        if let Some(init) = initializer {
            self.out.push_str(" = ");
            self.write_nested(init, PREC_TOP);
        }
        self.out.push_str(";\n");
    }

    fn visit_assignment(&mut self, name: &str, value: &Expr) {
        self.write_indent();
        self.out.push_str(name);
        self.out.push_str(" = ");
        self.write_nested(value, PREC_TOP);
        self.out.push_str(";\n");
    }

    fn visit_block(&mut self, body: &[Stmt]) {
        self.write_indent();
        self.out.push_str("{\n");
        self.write_body(body);
        self.write_indent();
        self.out.push_str("}\n");
    }

    fn visit_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.write_indent();
        self.write_if(condition, then_branch, else_branch);
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) {
        self.write_indent();
        self.out.push_str("while (");
        self.write_nested(condition, PREC_TOP);
        self.out.push(')');
        self.write_attached(body);
    }

    fn visit_expr_stmt(&mut self, value: &Expr) {
        self.write_indent();
        self.write_nested(value, PREC_TOP);
        self.out.push_str(";\n");
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&Printer::new().print_expr(self))
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&Printer::new().print_stmt(self))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&Printer::new().print_program(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    fn add(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, left, right)
    }

    fn sub(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, left, right)
    }

    #[test]
    fn test_minimal_parentheses() {
        let expr = Expr::binary(BinaryOp::Mul, add(Expr::var("a"), Expr::int(1)), Expr::var("b"));
        assert_eq!(expr.to_string(), "(a + 1) * b");

        let expr = add(Expr::var("a"), Expr::binary(BinaryOp::Mul, Expr::int(1), Expr::var("b")));
        assert_eq!(expr.to_string(), "a + 1 * b");
    }

    #[test]
    fn test_left_associativity_is_preserved() {
        let left_nested = sub(sub(Expr::var("a"), Expr::var("b")), Expr::var("c"));
        assert_eq!(left_nested.to_string(), "a - b - c");

        let right_nested = sub(Expr::var("a"), sub(Expr::var("b"), Expr::var("c")));
        assert_eq!(right_nested.to_string(), "a - (b - c)");
    }

    #[test]
    fn test_comparison_operands() {
        let nested = Expr::compare(
            CompareOp::Eq,
            Expr::compare(CompareOp::Lt, Expr::var("a"), Expr::var("b")),
            Expr::int(-1),
        );
        assert_eq!(nested.to_string(), "(a < b) == -1");

        let call = Expr::call("f", vec![nested, Expr::int(2)]);
        assert_eq!(call.to_string(), "f((a < b) == -1, 2)");
    }

    #[test]
    fn test_print_program() {
        let program = Program::new(vec![
            Stmt::decl("x", Some(Expr::int(0))),
            Stmt::decl("y", None),
            Stmt::while_loop(
                Expr::compare(CompareOp::Lt, Expr::var("x"), Expr::int(10)),
                Stmt::block(vec![
                    Stmt::if_else(
                        Expr::compare(CompareOp::Eq, Expr::var("x"), Expr::int(5)),
                        Stmt::block(vec![Stmt::expr(Expr::call("print", vec![Expr::var("x")]))]),
                        Some(Stmt::if_else(
                            Expr::compare(CompareOp::Gt, Expr::var("x"), Expr::int(7)),
                            Stmt::assign("y", Expr::var("x")),
                            None,
                        )),
                    ),
                    Stmt::assign("x", add(Expr::var("x"), Expr::int(1))),
                ]),
            ),
            Stmt::if_else(
                Expr::var("y"),
                Stmt::ret(Expr::var("y")),
                Some(Stmt::block(vec![])),
            ),
            Stmt::ret(Expr::int(0)),
        ]);

        expect![[r#"
            int x = 0;
            int y;
            while (x < 10) {
                if (x == 5) {
                    print(x);
                } else if (x > 7)
                    y = x;
                x = x + 1;
            }
            if (y)
                return y;
            else {
            }
            return 0;
        "#]]
        .assert_eq(&program.to_string());
    }

    #[test]
    fn test_dangling_else_gets_braces() {
        let inner = Stmt::if_else(Expr::var("b"), Stmt::assign("x", Expr::int(1)), None);
        let outer = Stmt::if_else(
            Expr::var("a"),
            inner.clone(),
            Some(Stmt::assign("x", Expr::int(2))),
        );
        expect![[r#"
            if (a) {
                if (b)
                    x = 1;
            } else
                x = 2;
        "#]]
        .assert_eq(&outer.to_string());

        let looped = Stmt::if_else(
            Expr::var("a"),
            Stmt::while_loop(Expr::var("c"), inner),
            Some(Stmt::block(vec![])),
        );
        expect![[r#"
            if (a) {
                while (c)
                    if (b)
                        x = 1;
            } else {
            }
        "#]]
        .assert_eq(&looped.to_string());
    }

    #[test]
    fn test_closed_inner_if_needs_no_braces() {
        let closed = Stmt::if_else(
            Expr::var("a"),
            Stmt::if_else(
                Expr::var("b"),
                Stmt::assign("x", Expr::int(1)),
                Some(Stmt::assign("x", Expr::int(3))),
            ),
            Some(Stmt::assign("x", Expr::int(2))),
        );
        expect![[r#"
            if (a)
                if (b)
                    x = 1;
                else
                    x = 3;
            else
                x = 2;
        "#]]
        .assert_eq(&closed.to_string());

        // Without an outer `else` nothing can be misattached
        let open = Stmt::if_else(
            Expr::var("a"),
            Stmt::if_else(Expr::var("b"), Stmt::assign("x", Expr::int(1)), None),
            None,
        );
        assert_eq!(open.to_string(), "if (a)\n    if (b)\n        x = 1;\n");
    }
}
