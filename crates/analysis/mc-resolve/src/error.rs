//! Error types for scoping and name resolution

#![allow(
    unused_assignments,
    reason = "fields are read through the miette derive expansion"
)]

use miette::Diagnostic;
use thiserror::Error;

/// Misuse of a scope stack
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ScopeError {
    /// `exit` with only the global frame left
    #[error("cannot exit the global scope")]
    #[diagnostic(code(scope::underflow))]
    Underflow,

    /// Name already bound in the innermost frame
    #[error("`{name}` is already declared in this scope")]
    #[diagnostic(code(scope::redeclaration))]
    Redeclaration {
        /// The conflicting name
        name: String,
    },
}

/// Errors found while resolving a program
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolutionError {
    /// Name not declared in any visible scope
    #[error("cannot find `{name}` in this scope")]
    #[diagnostic(code(resolve::unbound_name))]
    UnboundName {
        /// The name that was not found
        name: String,
        /// "did you mean" hint
        #[help]
        suggestion: Option<String>,
    },

    /// Name declared twice in the same scope
    #[error("`{name}` is already declared in this scope")]
    #[diagnostic(
        code(resolve::redeclaration),
        help("shadowing is only allowed in a nested block")
    )]
    Redeclaration {
        /// The redeclared name
        name: String,
    },

    /// Call through a variable
    #[error("`{name}` is a variable, not a function")]
    #[diagnostic(code(resolve::not_a_function))]
    NotAFunction {
        /// The called name
        name: String,
    },

    /// Function used as a value or assigned to
    #[error("`{name}` is a function, not a variable")]
    #[diagnostic(code(resolve::not_a_variable))]
    NotAVariable {
        /// The misused name
        name: String,
    },

    /// Call with the wrong number of arguments
    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    #[diagnostic(code(resolve::arity_mismatch))]
    ArityMismatch {
        /// The called function
        name: String,
        /// Declared arity
        expected: usize,
        /// Arguments at the call site
        found: usize,
    },
}

/// Every error found in one resolution pass
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("name resolution failed with {} error(s)", .errors.len())]
#[diagnostic(code(resolve::failed))]
pub struct ResolutionFailure {
    /// Errors in source order
    #[related]
    pub errors: Vec<ResolutionError>,
}

impl ResolutionError {
    /// Unbound-name error with a hint drawn from the names in scope
    pub fn unbound<'names>(name: &str, visible: impl IntoIterator<Item = &'names str>) -> Self {
        Self::UnboundName {
            name: name.to_owned(),
            suggestion: closest_name(name, visible).map(|close| format!("did you mean `{close}`?")),
        }
    }
}

/// Most similar visible name, if any is within a small edit distance
fn closest_name<'names>(
    name: &str,
    candidates: impl IntoIterator<Item = &'names str>,
) -> Option<&'names str> {
    let limit = (name.chars().count() / 3).max(1);
    candidates
        .into_iter()
        .filter(|candidate| *candidate != name)
        .map(|candidate| (edit_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= limit)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Levenshtein distance over chars, one row at a time
fn edit_distance(source: &str, target: &str) -> usize {
    let target: Vec<char> = target.chars().collect();
    let mut row: Vec<usize> = (0..=target.len()).collect();

    for (src_idx, src_char) in source.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = src_idx + 1;
        for (tgt_idx, tgt_char) in target.iter().enumerate() {
            let substitution = diagonal + usize::from(src_char != *tgt_char);
            diagonal = row[tgt_idx + 1];
            row[tgt_idx + 1] = substitution.min(row[tgt_idx] + 1).min(diagonal + 1);
        }
    }

    row[target.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn test_unbound_suggestion() {
        let err = ResolutionError::unbound("countr", ["x", "counter", "print"]);
        assert_eq!(
            err,
            ResolutionError::UnboundName {
                name: "countr".to_string(),
                suggestion: Some("did you mean `counter`?".to_string()),
            }
        );

        let err = ResolutionError::unbound("y", ["print"]);
        assert!(matches!(
            err,
            ResolutionError::UnboundName {
                suggestion: None,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_message_counts_errors() {
        let failure = ResolutionFailure {
            errors: vec![
                ResolutionError::NotAFunction {
                    name: "x".to_string(),
                },
                ResolutionError::Redeclaration {
                    name: "y".to_string(),
                },
            ],
        };
        assert_eq!(failure.to_string(), "name resolution failed with 2 error(s)");
        assert_eq!(failure.related().into_iter().flatten().count(), 2);
    }
}
