//! Lowering errors
//!
//! Programs that passed resolution never produce the name errors here; they
//! guard against lowering an unchecked tree.

#![allow(
    unused_assignments,
    reason = "fields are read through the miette derive expansion"
)]

use mc_ir::BuildError;
use mc_resolve::ScopeError;
use miette::Diagnostic;
use thiserror::Error;

/// Failure while lowering a program to IR
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LowerError {
    /// Variable with no value in the lowering environment
    #[error("no value bound to `{name}`")]
    #[diagnostic(code(lower::unbound_name))]
    UnboundName {
        /// The name
        name: String,
    },

    /// Call to something that is not a declared function
    #[error("`{name}` is not a callable function")]
    #[diagnostic(code(lower::not_callable))]
    NotCallable {
        /// The called name
        name: String,
    },

    /// Call with the wrong number of arguments
    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    #[diagnostic(code(lower::arity_mismatch))]
    ArityMismatch {
        /// The called function
        name: String,
        /// Declared arity
        expected: usize,
        /// Arguments at the call site
        found: usize,
    },

    /// Scope stack misuse
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scope(#[from] ScopeError),

    /// IR builder misuse
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),
}
