//! # Specification DSL
//!
//! The surface language of error-matching rules: tokenizer, parser, syntax
//! tree, and the resolution/lowering pass into the pattern IR.
//!
//! A specification file is an optional header code block, an optional
//! `startsymbols` declaration, one `rule` with its clauses, and an
//! optional trailer code block. See [`parser::parse_source`] for the entry
//! point and [`translate::translate`] for lowering.

pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod translate;

pub use parser::parse_source;
pub use syntax::{dump, Action, Clause, CodeBlock, Name, Pattern, PatternKind, RuleDef, SpecFile};
pub use translate::{translate, ClauseInfo, CompiledClauses};
