//! Rich error reporting for the parser

#![allow(
    unused_assignments,
    reason = "fields are read through the miette derive expansion"
)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Parse error with rich diagnostic information
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum ParseError {
    /// A token that cannot appear here
    #[error("unexpected `{found}`, expected {expected}")]
    #[diagnostic(code(parser::unexpected_token))]
    UnexpectedToken {
        /// Source text of the offending token
        found: String,
        /// What the parser was looking for
        expected: String,
        /// Source location
        #[label("expected {expected}")]
        span: SourceSpan,
        /// Source code for context
        #[source_code]
        src: NamedSource<String>,
    },

    /// Input ended in the middle of a construct
    #[error("unexpected end of input, expected {expected}")]
    #[diagnostic(code(parser::unexpected_eof))]
    UnexpectedEof {
        /// What the parser was looking for
        expected: String,
        /// End of the source
        #[label("input ends here")]
        span: SourceSpan,
        /// Source code for context
        #[source_code]
        src: NamedSource<String>,
    },

    /// A character that starts no token
    #[error("invalid character `{character}`")]
    #[diagnostic(code(parser::invalid_character))]
    InvalidCharacter {
        /// The character
        character: char,
        /// Source location
        #[label("not valid in minic source")]
        span: SourceSpan,
        /// Source code for context
        #[source_code]
        src: NamedSource<String>,
    },

    /// Integer literal outside the 32-bit signed range
    #[error("integer literal `{literal}` is out of range")]
    #[diagnostic(
        code(parser::integer_overflow),
        help("`int` holds values from -2147483648 to 2147483647")
    )]
    IntegerOverflow {
        /// Literal as written, including a leading `-`
        literal: String,
        /// Source location
        #[label("does not fit in `int`")]
        span: SourceSpan,
        /// Source code for context
        #[source_code]
        src: NamedSource<String>,
    },

    /// `a < b < c`
    #[error("comparison operators cannot be chained")]
    #[diagnostic(
        code(parser::chained_comparison),
        help("parenthesize one of the comparisons")
    )]
    ChainedComparison {
        /// The second comparison operator
        #[label("second comparison here")]
        span: SourceSpan,
        /// Source code for context
        #[source_code]
        src: NamedSource<String>,
    },

    /// Statements or expressions nested past the parser's limit
    #[error("nesting exceeds the limit of {limit} levels")]
    #[diagnostic(
        code(parser::nesting_too_deep),
        help("split the expression or statement into smaller parts")
    )]
    NestingTooDeep {
        /// Maximum depth
        limit: usize,
        /// Where the limit was crossed
        #[label("too deeply nested")]
        span: SourceSpan,
        /// Source code for context
        #[source_code]
        src: NamedSource<String>,
    },

    /// Source text too long for byte offsets to be tracked
    #[error("`{name}` is too large to compile ({len} bytes)")]
    #[diagnostic(code(parser::source_too_large))]
    SourceTooLarge {
        /// Source name
        name: String,
        /// Length in bytes
        len: usize,
    },
}

impl ParseError {
    /// Primary location of the error
    ///
    /// A source too large to address has no location; its span is empty at
    /// offset 0.
    pub fn span(&self) -> SourceSpan {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEof { span, .. }
            | Self::InvalidCharacter { span, .. }
            | Self::IntegerOverflow { span, .. }
            | Self::ChainedComparison { span, .. }
            | Self::NestingTooDeep { span, .. } => *span,
            Self::SourceTooLarge { .. } => (0, 0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_metadata() {
        let err = ParseError::IntegerOverflow {
            literal: "9999999999".to_string(),
            span: (4, 10).into(),
            src: NamedSource::new("test.mc", "x = 9999999999;".to_string()),
        };

        assert_eq!(err.to_string(), "integer literal `9999999999` is out of range");
        assert_eq!(
            err.code().map(|code| code.to_string()).as_deref(),
            Some("parser::integer_overflow")
        );
        assert!(err.help().is_some());
        assert_eq!(err.span().offset(), 4);
        assert_eq!(err.labels().into_iter().flatten().count(), 1);
    }
}
