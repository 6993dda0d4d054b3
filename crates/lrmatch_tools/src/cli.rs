//! CLI interface for the lrmatch compiler

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lrmatch")]
#[command(about = "Compile an error-matching specification against an LR(1) grammar")]
#[command(version)]
pub struct Cli {
    /// The error-matching specification file
    pub spec: Option<PathBuf>,

    /// Compiled LR(1) grammar table file
    #[arg(short = 'g', value_name = "PATH")]
    pub grammar: Option<PathBuf>,

    /// Output file for the generated recognizer
    #[arg(short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Suppress informational output
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Parse the specification only; produce no file
    #[arg(short = 'n')]
    pub parse_only: bool,

    /// Dump the parse tree
    #[arg(short = 'd')]
    pub dump: bool,

    /// Print the bare version number and exit
    #[arg(long)]
    pub vnum: bool,
}
