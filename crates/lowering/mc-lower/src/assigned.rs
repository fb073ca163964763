//! Names a loop body may reassign
//!
//! Only assignments to names declared outside the body count: a body that
//! declares its own `x` and assigns to it leaves the outer `x` alone.

use indexmap::IndexSet;
use mc_ast::{Expr, Stmt, StmtVisitor};
use mc_resolve::{ScopeError, ScopeGuard, ScopeOwner, ScopeStack};
use rustc_hash::FxBuildHasher;

/// Collects assignment targets that escape the visited statement
#[derive(Debug, Default)]
pub struct AssignedNames {
    /// Names declared inside the statement, by scope
    local: ScopeStack<()>,
    names: IndexSet<String, FxBuildHasher>,
}

impl AssignedNames {
    /// Outer names assigned anywhere in `stmt`, in first-assignment order
    pub fn collect(stmt: &Stmt) -> IndexSet<String, FxBuildHasher> {
        let mut collector = Self::default();
        collector.visit_stmt(stmt);
        collector.names
    }

    fn visit_nested(&mut self, stmt: &Stmt) {
        ScopeGuard::new(self).visit_stmt(stmt);
    }
}

impl ScopeOwner for AssignedNames {
    fn push_scope(&mut self) {
        self.local.push_scope();
    }

    fn pop_scope(&mut self) -> Result<(), ScopeError> {
        self.local.pop_scope()
    }
}

impl StmtVisitor for AssignedNames {
    type Output = ();

    // Expressions contain no assignments
    fn visit_return(&mut self, _value: &Expr) {}

    fn visit_var_decl(&mut self, name: &str, _initializer: Option<&Expr>) {
        // A second declaration in one scope is a resolution error, not ours
        if self.local.declare(name, ()).is_err() {
            log::trace!("duplicate declaration of {name} in loop body");
        }
    }

    fn visit_assignment(&mut self, name: &str, _value: &Expr) {
        if !self.local.contains(name) {
            self.names.insert(name.to_owned());
        }
    }

    fn visit_block(&mut self, body: &[Stmt]) {
        let mut scope = ScopeGuard::new(self);
        for stmt in body {
            scope.visit_stmt(stmt);
        }
    }

    fn visit_if(&mut self, _condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.visit_nested(then_branch);
        if let Some(else_stmt) = else_branch {
            self.visit_nested(else_stmt);
        }
    }

    fn visit_while(&mut self, _condition: &Expr, body: &Stmt) {
        self.visit_nested(body);
    }

    fn visit_expr_stmt(&mut self, _value: &Expr) {}
}
