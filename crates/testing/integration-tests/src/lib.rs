//! Integration test utilities for the minic compiler
//!
//! Fixture programs live under `test-programs/`, split into `valid/` and
//! `invalid/` by whether they compile with the default externs.

use anyhow::{Context as _, Result};
use mc_driver::{Compilation, CompileError, CompileOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// A `.mc` program loaded from disk
#[derive(Debug, Clone)]
pub struct Fixture {
    /// File stem, e.g. `countdown`
    pub name: String,
    /// Full path, used to name diagnostics
    pub path: PathBuf,
    /// Program text
    pub source: String,
}

impl Fixture {
    /// Loads every `.mc` file in `dir`, sorted by name
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or one of its files cannot be read
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<Self>> {
        let dir = dir.as_ref();
        let mut fixtures = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "mc") {
                continue;
            }
            let source = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            fixtures.push(Self { name, path, source });
        }
        fixtures.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(fixtures)
    }

    /// Loads the named fixture from `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let path = dir.as_ref().join(format!("{name}.mc"));
        let source =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self {
            name: name.to_owned(),
            path,
            source,
        })
    }

    /// Compiles the fixture with the default externs
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error
    pub fn compile(&self) -> Result<Compilation, CompileError> {
        mc_driver::compile_named(&self.name, &self.source, &CompileOptions::default())
    }
}

/// Root of the fixture tree
#[must_use]
pub fn programs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-programs")
}

/// Programs expected to compile
#[must_use]
pub fn valid_dir() -> PathBuf {
    programs_dir().join("valid")
}

/// Programs expected to fail name resolution
#[must_use]
pub fn invalid_dir() -> PathBuf {
    programs_dir().join("invalid")
}
