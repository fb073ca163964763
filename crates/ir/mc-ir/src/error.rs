//! IR construction errors

#![allow(
    unused_assignments,
    reason = "fields are read through the miette derive expansion"
)]

use crate::Type;
use miette::Diagnostic;
use thiserror::Error;

/// Misuse of a [`FunctionBuilder`](crate::FunctionBuilder)
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BuildError {
    /// Appending to a block that already ends in a terminator
    #[error("block `{block}` is already terminated")]
    #[diagnostic(code(ir::misplaced_terminator))]
    MisplacedTerminator {
        /// Label of the terminated block
        block: String,
    },

    /// Operand of the wrong type
    #[error("expected a `{expected}` operand, found `{found}`")]
    #[diagnostic(code(ir::type_mismatch))]
    TypeMismatch {
        /// Type the instruction requires
        expected: Type,
        /// Type supplied
        found: Type,
    },

    /// Incoming edge added to something other than a phi
    #[error("`%{inst}` is not a phi")]
    #[diagnostic(code(ir::not_a_phi))]
    NotAPhi {
        /// Number of the instruction
        inst: u32,
    },

    /// Finished function contains a block without a terminator
    #[error("block `{block}` has no terminator")]
    #[diagnostic(code(ir::unterminated_block))]
    UnterminatedBlock {
        /// Label of the open block
        block: String,
    },
}
