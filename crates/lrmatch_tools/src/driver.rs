//! Compilation driver: file loading, pipeline, and output.

use std::path::{Path, PathBuf};

use lrmatch::error::ConfigError;
use lrmatch::grammar::{Grammar, RawTables};
use lrmatch::pattern;
use lrmatch::{Ctx, Error};

use crate::cli::Cli;

/// Outcome of a driver run, mapped to an exit code by `main`.
pub enum Outcome {
    /// Exit 0.
    Done,
    /// Exit 1.
    BadUsage(String),
    /// Exit per [`Error::exit_code`].
    Failed(Error),
}

/// Run the whole pipeline for the parsed command line.
#[must_use]
pub fn run(cli: &Cli) -> Outcome {
    match try_run(cli) {
        Ok(()) => Outcome::Done,
        Err(DriverError::MissingArgument(what)) => {
            Outcome::BadUsage(format!("missing {what}"))
        }
        Err(DriverError::Compiler(error)) => Outcome::Failed(error),
    }
}

enum DriverError {
    MissingArgument(&'static str),
    Compiler(Error),
}

impl From<Error> for DriverError {
    fn from(error: Error) -> Self {
        Self::Compiler(error)
    }
}

impl From<ConfigError> for DriverError {
    fn from(error: ConfigError) -> Self {
        Self::Compiler(Error::Config(error))
    }
}

fn try_run(cli: &Cli) -> Result<(), DriverError> {
    let spec_path: &PathBuf = cli
        .spec
        .as_ref()
        .ok_or(DriverError::MissingArgument("specification file"))?;

    let source = read(spec_path)?;
    let spec = pattern::parse_source(&source, spec_path)?;

    if cli.dump {
        print!("{}", pattern::dump(&spec));
    }
    if cli.parse_only {
        return Ok(());
    }

    let grammar_path = cli
        .grammar
        .as_ref()
        .ok_or(DriverError::MissingArgument("grammar table file (-g)"))?;
    let output_path = cli
        .output
        .as_ref()
        .ok_or(DriverError::MissingArgument("output file (-o)"))?;

    let tables = RawTables::load(grammar_path)?;
    let ctx = Ctx::new(Grammar::new(&tables));
    let recognizer = lrmatch::compile(&ctx, &spec)?;
    let rendered = recognizer.render();

    std::fs::write(output_path, rendered).map_err(|source| ConfigError::Unwritable {
        path: output_path.clone(),
        source,
    })?;

    if !cli.quiet {
        println!(
            "{}: {} clauses, {} recognizer states -> {}",
            spec_path.display(),
            recognizer.clauses.len(),
            recognizer.dfa.state_count(),
            output_path.display()
        );
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}
