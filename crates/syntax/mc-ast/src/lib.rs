//! Abstract syntax tree for minic
//!
//! The tree is a closed set of enums. Nodes carry data only: printing,
//! resolution and lowering are written as visitors (see [`visitor`]) so that
//! adding a variant breaks every traversal at compile time instead of at
//! runtime.
//!
//! Every parent owns its children exclusively (`Box`/`Vec`), so dropping the
//! [`Program`] drops the whole tree.

pub mod printer;
pub mod visitor;

pub use printer::Printer;
pub use visitor::{ExprVisitor, StmtVisitor};

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    #[display("+")]
    Add,
    /// Subtraction (-)
    #[display("-")]
    Sub,
    /// Multiplication (*)
    #[display("*")]
    Mul,
    /// Signed division (/)
    #[display("/")]
    Div,
}

/// Comparison operators, producing a boolean rather than an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum CompareOp {
    /// Less than (<)
    #[display("<")]
    Lt,
    /// Greater than (>)
    #[display(">")]
    Gt,
    /// Less than or equal (<=)
    #[display("<=")]
    Le,
    /// Greater than or equal (>=)
    #[display(">=")]
    Ge,
    /// Equality (==)
    #[display("==")]
    Eq,
    /// Inequality (!=)
    #[display("!=")]
    Ne,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    IntegerLiteral {
        /// Literal value
        value: i32,
    },
    /// Variable reference
    Variable {
        /// Referenced name
        name: String,
    },
    /// Arithmetic on two integers
    BinaryOp {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Comparison of two integers
    Comparison {
        /// Operator
        op: CompareOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Call to a named function
    Call {
        /// Callee name
        name: String,
        /// Arguments, in evaluation order
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Integer literal
    #[must_use]
    pub fn int(value: i32) -> Self {
        Self::IntegerLiteral { value }
    }

    /// Variable reference
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    /// Arithmetic expression
    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Comparison expression
    #[must_use]
    pub fn compare(op: CompareOp, left: Self, right: Self) -> Self {
        Self::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Function call
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// `return value;`
    Return {
        /// Returned value
        value: Expr,
    },
    /// `int name = initializer;`
    VarDecl {
        /// Declared name
        name: String,
        /// Optional initializer
        initializer: Option<Expr>,
    },
    /// `name = value;`
    Assignment {
        /// Assigned name
        name: String,
        /// New value
        value: Expr,
    },
    /// `{ ... }`, a new lexical scope
    Block {
        /// Statements in order
        body: Vec<Stmt>,
    },
    /// `if (condition) then_branch else else_branch`
    If {
        /// Condition
        condition: Expr,
        /// Taken when the condition holds
        then_branch: Box<Stmt>,
        /// Taken otherwise
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (condition) body`
    While {
        /// Loop condition, checked before every iteration
        condition: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// Expression evaluated for its side effects
    Expr {
        /// Evaluated expression
        value: Expr,
    },
}

impl Stmt {
    /// `return value;`
    #[must_use]
    pub fn ret(value: Expr) -> Self {
        Self::Return { value }
    }

    /// `int name = initializer;`
    #[must_use]
    pub fn decl(name: impl Into<String>, initializer: Option<Expr>) -> Self {
        Self::VarDecl {
            name: name.into(),
            initializer,
        }
    }

    /// `name = value;`
    #[must_use]
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Self::Assignment {
            name: name.into(),
            value,
        }
    }

    /// `{ body }`
    #[must_use]
    pub fn block(body: Vec<Self>) -> Self {
        Self::Block { body }
    }

    /// `if (condition) then_branch [else else_branch]`
    #[must_use]
    pub fn if_else(condition: Expr, then_branch: Self, else_branch: Option<Self>) -> Self {
        Self::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    /// `while (condition) body`
    #[must_use]
    pub fn while_loop(condition: Expr, body: Self) -> Self {
        Self::While {
            condition,
            body: Box::new(body),
        }
    }

    /// `value;`
    #[must_use]
    pub fn expr(value: Expr) -> Self {
        Self::Expr { value }
    }
}

/// Root of the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in order
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Creates a program from its top-level statements
    #[must_use]
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}
