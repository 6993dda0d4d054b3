//! lrmatch CLI
//!
//! Compiles an error-matching specification against a compiled LR(1)
//! grammar into a recognizer source file.
//!
//! Exit codes: 0 on success, 1 for missing/invalid arguments or resolution
//! errors, 3 for lexical or parse errors in the specification.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use lrmatch_tools::cli::Cli;
use lrmatch_tools::driver::{run, Outcome};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    if cli.vnum {
        println!(env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Outcome::Done => ExitCode::SUCCESS,
        Outcome::BadUsage(message) => {
            eprintln!("lrmatch: {message}");
            ExitCode::from(1)
        }
        Outcome::Failed(error) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}
