//! Symbol table: what each visible name refers to

use crate::error::ScopeError;
use crate::guard::ScopeOwner;
use crate::scope::ScopeStack;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of entity a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// An `int` variable
    Variable,
    /// A function taking `arity` integer arguments
    Function {
        /// Number of parameters
        arity: usize,
    },
}

/// A declared name's meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    /// What the name refers to
    pub kind: SymbolKind,
}

/// Nested scopes mapping names to [`Symbol`]s
///
/// Starts with the global scope already entered.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    scopes: ScopeStack<Symbol>,
}

impl SymbolTable {
    /// Create a table holding only the global scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a nested scope
    pub fn enter_scope(&mut self) {
        self.scopes.enter();
    }

    /// Leave the innermost scope, discarding its symbols
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::Underflow` when only the global scope is left.
    pub fn exit_scope(&mut self) -> Result<(), ScopeError> {
        self.scopes.exit().map(drop)
    }

    /// Declare `name` in the innermost scope
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::Redeclaration` when the innermost scope already
    /// declares `name`.
    pub fn declare(&mut self, name: &str, kind: SymbolKind) -> Result<(), ScopeError> {
        log::trace!("declare {name} ({kind:?}) at depth {}", self.depth());
        self.scopes.declare(name, Symbol { kind })
    }

    /// Whether `name` is visible from the innermost scope
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.contains(name)
    }

    /// Nearest declaration of `name`
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.lookup(name)
    }

    /// Number of open scopes, counting the global one
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Every visible name; shadowed names repeat
    pub fn visible_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.visible_names()
    }
}

impl ScopeOwner for SymbolTable {
    fn push_scope(&mut self) {
        self.enter_scope();
    }

    fn pop_scope(&mut self) -> Result<(), ScopeError> {
        self.exit_scope()
    }
}

/// A function provided by the runtime, declared in the global scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternFunction {
    /// Function name
    pub name: String,
    /// Number of integer parameters
    pub arity: usize,
}

impl ExternFunction {
    /// Create an extern declaration
    #[must_use]
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for ExternFunction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.name, self.arity)
    }
}

/// Malformed `NAME:ARITY` extern declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternParseError {
    /// No `:` separator
    #[error("expected NAME:ARITY, found `{0}`")]
    MissingArity(String),
    /// Name is not an identifier
    #[error("`{0}` is not a valid function name")]
    InvalidName(String),
    /// Arity is not a non-negative integer
    #[error("`{0}` is not a valid arity")]
    InvalidArity(String),
}

impl FromStr for ExternFunction {
    type Err = ExternParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (name, arity) = text
            .split_once(':')
            .ok_or_else(|| ExternParseError::MissingArity(text.to_owned()))?;

        let mut chars = name.chars();
        let valid_name = chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
            && chars.all(|rest| rest.is_ascii_alphanumeric() || rest == '_');
        if !valid_name {
            return Err(ExternParseError::InvalidName(name.to_owned()));
        }

        let arity = arity
            .parse()
            .map_err(|_| ExternParseError::InvalidArity(arity.to_owned()))?;
        Ok(Self::new(name, arity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_scoping() {
        let mut table = SymbolTable::new();
        table.declare("x", SymbolKind::Variable).unwrap();
        table.enter_scope();
        table
            .declare("x", SymbolKind::Function { arity: 2 })
            .unwrap();
        assert_eq!(
            table.lookup("x").map(|symbol| symbol.kind),
            Some(SymbolKind::Function { arity: 2 })
        );
        assert_eq!(table.depth(), 2);

        table.exit_scope().unwrap();
        assert_eq!(
            table.lookup("x").map(|symbol| symbol.kind),
            Some(SymbolKind::Variable)
        );
        assert_eq!(table.exit_scope(), Err(ScopeError::Underflow));
    }

    #[test]
    fn test_declare_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.declare("y", SymbolKind::Variable).unwrap();
        assert!(table.declare("y", SymbolKind::Variable).is_err());
        assert!(table.is_declared("y"));
        table.exit_scope().unwrap();
        assert!(!table.is_declared("y"));
    }

    #[test]
    fn test_parse_extern() {
        assert_eq!(
            "print:1".parse::<ExternFunction>(),
            Ok(ExternFunction::new("print", 1))
        );
        assert_eq!(ExternFunction::new("max3", 3).to_string(), "max3:3");
        assert_eq!(
            "print".parse::<ExternFunction>(),
            Err(ExternParseError::MissingArity("print".to_string()))
        );
        assert_eq!(
            "3d:1".parse::<ExternFunction>(),
            Err(ExternParseError::InvalidName("3d".to_string()))
        );
        assert_eq!(
            "f:-1".parse::<ExternFunction>(),
            Err(ExternParseError::InvalidArity("-1".to_string()))
        );
    }
}
