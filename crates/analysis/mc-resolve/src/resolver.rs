//! Name resolution pass
//!
//! Walks the program with a [`SymbolTable`], checking every variable use,
//! assignment and call against the declarations visible at that point. All
//! errors are collected; resolution does not stop at the first one.

use crate::error::{ResolutionError, ResolutionFailure};
use crate::guard::{ScopeGuard, ScopeOwner};
use crate::symbol::{ExternFunction, SymbolKind, SymbolTable};
use crate::ScopeError;
use mc_ast::{BinaryOp, CompareOp, Expr, ExprVisitor, Program, Stmt, StmtVisitor};

/// Check that every name in `program` is declared before use
///
/// Externs are declared in the global scope; the program body gets its own
/// scope nested inside, so it may shadow them.
///
/// # Errors
///
/// Returns every [`ResolutionError`] found, in source order.
pub fn resolve_program(
    program: &Program,
    externs: &[ExternFunction],
) -> Result<(), ResolutionFailure> {
    let mut resolver = Resolver::new();
    for func in externs {
        resolver.declare(
            &func.name,
            SymbolKind::Function {
                arity: func.arity,
            },
        );
    }
    resolver.resolve(program);

    if resolver.errors.is_empty() {
        log::debug!("resolved {} statements", program.statements.len());
        Ok(())
    } else {
        log::debug!("resolution failed with {} errors", resolver.errors.len());
        Err(ResolutionFailure {
            errors: resolver.errors,
        })
    }
}

/// Name resolver
#[derive(Debug, Default)]
pub struct Resolver {
    symbols: SymbolTable,
    errors: Vec<ResolutionError>,
}

impl Resolver {
    /// Create a resolver with an empty global scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `program` inside a fresh scope
    pub fn resolve(&mut self, program: &Program) {
        let mut scope = ScopeGuard::new(self);
        for stmt in &program.statements {
            scope.visit_stmt(stmt);
        }
    }

    /// Errors collected so far
    pub fn errors(&self) -> &[ResolutionError] {
        &self.errors
    }

    /// Consume the resolver, yielding its errors
    pub fn into_errors(self) -> Vec<ResolutionError> {
        self.errors
    }

    fn declare(&mut self, name: &str, kind: SymbolKind) {
        if let Err(ScopeError::Redeclaration { name }) = self.symbols.declare(name, kind) {
            self.errors.push(ResolutionError::Redeclaration { name });
        }
    }

    /// Expect `name` to be a visible variable
    fn check_variable(&mut self, name: &str) {
        match self.symbols.lookup(name).map(|symbol| symbol.kind) {
            Some(SymbolKind::Variable) => {}
            Some(SymbolKind::Function { .. }) => self.errors.push(ResolutionError::NotAVariable {
                name: name.to_owned(),
            }),
            None => self.unbound(name),
        }
    }

    fn unbound(&mut self, name: &str) {
        let err = ResolutionError::unbound(name, self.symbols.visible_names());
        self.errors.push(err);
    }

    /// Branch and loop bodies are scopes of their own
    fn visit_nested(&mut self, stmt: &Stmt) {
        ScopeGuard::new(self).visit_stmt(stmt);
    }
}

impl ScopeOwner for Resolver {
    fn push_scope(&mut self) {
        self.symbols.push_scope();
    }

    fn pop_scope(&mut self) -> Result<(), ScopeError> {
        self.symbols.pop_scope()
    }
}

impl ExprVisitor for Resolver {
    type Output = ();

    fn visit_integer_literal(&mut self, _value: i32) {}

    fn visit_variable(&mut self, name: &str) {
        self.check_variable(name);
    }

    fn visit_binary_op(&mut self, _op: BinaryOp, left: &Expr, right: &Expr) {
        self.visit_expr(left);
        self.visit_expr(right);
    }

    fn visit_comparison(&mut self, _op: CompareOp, left: &Expr, right: &Expr) {
        self.visit_expr(left);
        self.visit_expr(right);
    }

    fn visit_call(&mut self, name: &str, args: &[Expr]) {
        match self.symbols.lookup(name).map(|symbol| symbol.kind) {
            Some(SymbolKind::Function { arity }) if arity != args.len() => {
                self.errors.push(ResolutionError::ArityMismatch {
                    name: name.to_owned(),
                    expected: arity,
                    found: args.len(),
                });
            }
            Some(SymbolKind::Function { .. }) => {}
            Some(SymbolKind::Variable) => self.errors.push(ResolutionError::NotAFunction {
                name: name.to_owned(),
            }),
            None => self.unbound(name),
        }
        for arg in args {
            self.visit_expr(arg);
        }
    }
}

impl StmtVisitor for Resolver {
    type Output = ();

    fn visit_return(&mut self, value: &Expr) {
        self.visit_expr(value);
    }

    fn visit_var_decl(&mut self, name: &str, initializer: Option<&Expr>) {
        // `int x = x;` sees the outer `x`
        if let Some(init) = initializer {
            self.visit_expr(init);
        }
        self.declare(name, SymbolKind::Variable);
    }

    fn visit_assignment(&mut self, name: &str, value: &Expr) {
        self.visit_expr(value);
        self.check_variable(name);
    }

    fn visit_block(&mut self, body: &[Stmt]) {
        let mut scope = ScopeGuard::new(self);
        for stmt in body {
            scope.visit_stmt(stmt);
        }
    }

    fn visit_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.visit_expr(condition);
        self.visit_nested(then_branch);
        if let Some(else_stmt) = else_branch {
            self.visit_nested(else_stmt);
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) {
        self.visit_expr(condition);
        self.visit_nested(body);
    }

    fn visit_expr_stmt(&mut self, value: &Expr) {
        self.visit_expr(value);
    }
}
