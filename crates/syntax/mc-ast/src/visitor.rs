//! Visitor infrastructure for traversing the AST
//!
//! Each trait provides the dispatching `visit_*` entry point and one required
//! method per variant. There are no default bodies for the variant methods:
//! a pass that forgets a variant does not build.

use crate::{BinaryOp, CompareOp, Expr, Stmt};

/// Visitor trait for expressions
pub trait ExprVisitor {
    /// Output type produced by visiting an expression
    type Output;

    /// Dispatch on the expression variant
    fn visit_expr(&mut self, expr: &Expr) -> Self::Output {
        match expr {
            Expr::IntegerLiteral { value } => self.visit_integer_literal(*value),
            Expr::Variable { name } => self.visit_variable(name),
            Expr::BinaryOp { op, left, right } => self.visit_binary_op(*op, left, right),
            Expr::Comparison { op, left, right } => self.visit_comparison(*op, left, right),
            Expr::Call { name, args } => self.visit_call(name, args),
        }
    }

    /// Visit integer literal
    fn visit_integer_literal(&mut self, value: i32) -> Self::Output;

    /// Visit variable reference
    fn visit_variable(&mut self, name: &str) -> Self::Output;

    /// Visit arithmetic operation
    fn visit_binary_op(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Self::Output;

    /// Visit comparison
    fn visit_comparison(&mut self, op: CompareOp, left: &Expr, right: &Expr) -> Self::Output;

    /// Visit function call
    fn visit_call(&mut self, name: &str, args: &[Expr]) -> Self::Output;
}

/// Visitor trait for statements
pub trait StmtVisitor {
    /// Output type produced by visiting a statement
    type Output;

    /// Dispatch on the statement variant
    fn visit_stmt(&mut self, stmt: &Stmt) -> Self::Output {
        match stmt {
            Stmt::Return { value } => self.visit_return(value),
            Stmt::VarDecl { name, initializer } => {
                self.visit_var_decl(name, initializer.as_ref())
            }
            Stmt::Assignment { name, value } => self.visit_assignment(name, value),
            Stmt::Block { body } => self.visit_block(body),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.visit_if(condition, then_branch, else_branch.as_deref()),
            Stmt::While { condition, body } => self.visit_while(condition, body),
            Stmt::Expr { value } => self.visit_expr_stmt(value),
        }
    }

    /// Visit return statement
    fn visit_return(&mut self, value: &Expr) -> Self::Output;

    /// Visit variable declaration
    fn visit_var_decl(&mut self, name: &str, initializer: Option<&Expr>) -> Self::Output;

    /// Visit assignment
    fn visit_assignment(&mut self, name: &str, value: &Expr) -> Self::Output;

    /// Visit block
    fn visit_block(&mut self, body: &[Stmt]) -> Self::Output;

    /// Visit if statement
    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Self::Output;

    /// Visit while loop
    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> Self::Output;

    /// Visit expression statement
    fn visit_expr_stmt(&mut self, value: &Expr) -> Self::Output;
}
