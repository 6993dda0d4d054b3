//! # Error Types
//!
//! Error types for every phase of the compiler.
//!
//! ## Overview
//!
//! - [`ConfigError`]: missing or unreadable grammar/spec/output paths, or an
//!   invalid grammar-table file (exit code 1)
//! - [`LexicalError`]: malformed token in the specification file (exit code 3)
//! - [`ParseError`]: specification does not conform to the DSL grammar
//!   (exit code 3)
//! - [`ResolutionError`]: unknown symbol name, or a terminal used where a
//!   nonterminal is required (exit code 1)
//!
//! Resolution errors fail eagerly at translation time. Violated invariants
//! during reduction-graph construction are programming errors and abort via
//! panic rather than surfacing here.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with
//! [`miette`] for rich terminal reports.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// A line/column position in a specification file (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Top-level error of the compiler, carrying the process exit code.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl Error {
    /// The exit code the CLI reports for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Resolution(_) => 1,
            Self::Lexical(_) | Self::Parse(_) => 3,
        }
    }
}

/// Configuration and input-file errors.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::config::unreadable)))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::config::unwritable)))]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid grammar tables in {}: {message}", .path.display())]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::config::invalid_tables)))]
    InvalidTables { path: PathBuf, message: String },
}

/// A malformed token in the specification file.
#[derive(Debug, Clone, Error)]
#[error("{}:{pos}: {message}", .file.display())]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::lex)))]
pub struct LexicalError {
    pub file: PathBuf,
    pub pos: Pos,
    pub message: String,
}

/// The specification does not conform to the DSL grammar.
#[derive(Debug, Clone, Error)]
#[error("{}:{pos}: {message}", .file.display())]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::parse)))]
pub struct ParseError {
    pub file: PathBuf,
    pub pos: Pos,
    pub message: String,
}

/// A name in a pattern does not resolve against the loaded grammar.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ResolutionError {
    #[error("Unknown symbol {name}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::resolve::unknown)))]
    UnknownSymbol { name: String, pos: Pos },

    #[error("{name} is a terminal, but a nonterminal is required")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lrmatch::resolve::not_a_nonterminal)))]
    TerminalAsNonterminal { name: String, pos: Pos },
}
