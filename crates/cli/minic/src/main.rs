//! minic compiler CLI
//!
//! Compiles a single source file and prints the IR, the pretty-printed
//! program or its JSON tree.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mc_driver::{CompileError, CompileOptions};
use mc_resolve::ExternFunction;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "minic")]
#[command(about = "Compile minic programs to SSA IR", long_about = None)]
#[command(version)]
struct Cli {
    /// Source file to compile
    file: PathBuf,

    /// Artifact to print
    #[arg(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    /// Declare a runtime function, e.g. `--extern max:2`
    #[arg(long = "extern", value_name = "NAME:ARITY")]
    externs: Vec<ExternFunction>,

    /// Do not declare `print:1`
    #[arg(long)]
    no_default_externs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Textual SSA IR
    Ir,
    /// Pretty-printed source
    Ast,
    /// Syntax tree as JSON
    AstJson,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        let base = if self.no_default_externs {
            CompileOptions::without_externs()
        } else {
            CompileOptions::default()
        };
        self.externs.iter().cloned().fold(base, CompileOptions::with_extern)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            if let Err(io_err) = err.print() {
                log::error!("failed to print usage: {io_err}");
            }
            return code;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(io_err) = report(err) {
                log::error!("failed to write diagnostic: {io_err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let compilation = mc_driver::compile_file(&cli.file, &cli.options())?;

    let mut out = io::stdout().lock();
    match cli.emit {
        Emit::Ir => write!(out, "{}", compilation.module)?,
        Emit::Ast => write!(out, "{}", compilation.program)?,
        Emit::AstJson => {
            serde_json::to_writer_pretty(&mut out, &compilation.program)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `err` to stderr, rendering compiler errors with their source
fn report(err: anyhow::Error) -> io::Result<()> {
    let mut stderr = io::stderr().lock();
    match err.downcast::<CompileError>() {
        Ok(compile_err) => writeln!(stderr, "{:?}", miette::Report::new(compile_err)),
        Err(other) => writeln!(stderr, "error: {other:#}"),
    }
}
