//! Compilation driver
//!
//! Runs the pipeline parse → resolve → lower. Each stage only runs when the
//! previous one succeeded, so a program with resolution errors never reaches
//! the IR builder.

#![allow(
    unused_assignments,
    reason = "fields are read through the miette derive expansion"
)]

use mc_ast::Program;
use mc_ir::Module;
use mc_lower::LowerError;
use mc_parser::ParseError;
use mc_resolve::{ExternFunction, ResolutionFailure};
use miette::Diagnostic;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use mc_parser::ANONYMOUS_SOURCE;

/// Settings shared by every compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Runtime functions programs may call
    pub externs: Vec<ExternFunction>,
}

impl Default for CompileOptions {
    /// Declares `print`, taking one argument
    fn default() -> Self {
        Self {
            externs: vec![ExternFunction::new("print", 1)],
        }
    }
}

impl CompileOptions {
    /// Options declaring no externs at all
    #[must_use]
    pub fn without_externs() -> Self {
        Self {
            externs: Vec::new(),
        }
    }

    /// Add an extern declaration, replacing any with the same name
    #[must_use]
    pub fn with_extern(mut self, func: ExternFunction) -> Self {
        if let Some(known) = self.externs.iter_mut().find(|known| known.name == func.name) {
            log::debug!("extern {known} redeclared as {func}");
            *known = func;
        } else {
            self.externs.push(func);
        }
        self
    }
}

/// Output of a successful compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Parsed program
    pub program: Program,
    /// Lowered IR
    pub module: Module,
}

/// Failure of any pipeline stage
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    /// Source file could not be read
    #[error("failed to read `{}`", path.display())]
    #[diagnostic(code(driver::io))]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Syntax error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// One or more name resolution errors
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolutionFailure),

    /// Lowering failure
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lower(#[from] LowerError),
}

/// Compile anonymous source text
///
/// # Errors
///
/// Returns the first stage's failure.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Compilation, CompileError> {
    compile_named(ANONYMOUS_SOURCE, source, options)
}

/// Compile source text, attributing diagnostics to `name`
///
/// # Errors
///
/// Returns the first stage's failure.
pub fn compile_named(
    name: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<Compilation, CompileError> {
    let program = mc_parser::parse_named(name, source)?;
    log::debug!("{name}: parsed");

    mc_resolve::resolve_program(&program, &options.externs)?;
    log::debug!("{name}: resolved");

    let module = mc_lower::lower_named(name, &program, &options.externs)?;
    log::debug!("{name}: lowered");

    Ok(Compilation { program, module })
}

/// Read and compile a source file
///
/// # Errors
///
/// Returns [`CompileError::Io`] if the file cannot be read, otherwise the
/// first stage's failure.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<Compilation, CompileError> {
    let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    compile_named(&path.display().to_string(), &source, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_compile_success() {
        let compilation = compile("int x = 4; print(x * 2);", &CompileOptions::default()).unwrap();
        assert_eq!(compilation.program.statements.len(), 2);
        assert!(compilation.module.externs.contains_key("print"));
        assert!(compilation.module.function("main").is_some());
    }

    #[test]
    fn test_each_stage_reports_its_error() {
        let options = CompileOptions::default();
        assert!(matches!(
            compile("int = 3;", &options),
            Err(CompileError::Parse(_))
        ));
        assert!(matches!(
            compile("return y;", &options),
            Err(CompileError::Resolve(_))
        ));
        assert!(matches!(
            compile("print(1);", &CompileOptions::without_externs()),
            Err(CompileError::Resolve(_))
        ));
    }

    #[test]
    fn test_resolution_errors_are_all_reported() {
        let err = compile("a = 1; b = 2; return c;", &CompileOptions::default()).unwrap_err();
        let CompileError::Resolve(failure) = err else {
            panic!("expected a resolution failure");
        };
        assert_eq!(failure.errors.len(), 3);
    }

    #[test]
    fn test_extra_externs() {
        let options = CompileOptions::default().with_extern(ExternFunction::new("max", 2));
        let compilation = compile("return max(1, 2);", &options).unwrap();
        assert_eq!(compilation.module.externs.get("max"), Some(&2));
        assert!(!compilation.module.externs.contains_key("print"));
    }

    #[test]
    fn test_redeclared_extern_replaces_default() {
        let options = CompileOptions::default()
            .with_extern(ExternFunction::new("print", 2))
            .with_extern(ExternFunction::new("max", 2));
        assert_eq!(
            options.externs,
            vec![ExternFunction::new("print", 2), ExternFunction::new("max", 2)]
        );

        let compilation = compile("print(1, max(2, 3));", &options).unwrap();
        assert_eq!(compilation.module.externs.get("print"), Some(&2));

        let err = compile("print(1);", &options).unwrap_err();
        assert!(matches!(err, CompileError::Resolve(_)));
    }

    #[test]
    fn test_compile_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "return 42;").unwrap();
        let compilation = compile_file(file.path(), &CompileOptions::default()).unwrap();
        assert_eq!(compilation.module.name, file.path().display().to_string());

        let missing = file.path().with_extension("missing");
        let err = compile_file(&missing, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
        assert!(err.to_string().starts_with("failed to read"));
    }
}
