//! Scoping and name resolution for minic
//!
//! - [`ScopeStack`]: generic nested-scope storage, reused by lowering
//! - [`SymbolTable`]: names to [`Symbol`]s
//! - [`ScopeGuard`]: RAII scope acquisition over any [`ScopeOwner`]
//! - [`resolve_program`]: the resolution pass

pub mod error;
pub mod guard;
pub mod resolver;
pub mod scope;
pub mod symbol;

pub use error::{ResolutionError, ResolutionFailure, ScopeError};
pub use guard::{ScopeGuard, ScopeOwner};
pub use resolver::{Resolver, resolve_program};
pub use scope::{Frame, ScopeStack};
pub use symbol::{ExternFunction, ExternParseError, Symbol, SymbolKind, SymbolTable};
