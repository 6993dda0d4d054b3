//! # lrmatch
//!
//! A compiler from a declarative error-matching DSL to a deterministic
//! recognizer over the *reduction-reachable stack suffixes* of an LR(1)
//! parser.
//!
//! ## Overview
//!
//! Given a compiled LR(1) automaton and a specification of clauses
//! (*pattern → action*, where patterns are regular expressions over parser
//! states), lrmatch produces a recognizer that, executed on a parser stack
//! at the moment of a syntax error, selects the highest-priority matching
//! clause. The pipeline:
//!
//! 1. [`grammar`] — typed view over the LR(1) tables, with goto/shift
//!    transition split and item matchers
//! 2. [`redgraph`] — static enumeration of the stack suffixes reachable by
//!    reduction sequences from every state
//! 3. [`pattern`] — the DSL front end, lowered into [`regex`]'s state-set
//!    regular expressions with the distinguished reduce operator
//! 4. [`reduce`] + [`dfa`] — Brzozowski-style simultaneous derivation of
//!    clause continuations and reduction simulators into a DFA with
//!    disjoint transition labels
//! 5. [`emit`] — the generated recognizer tables and dispatcher
//!
//! The compiler is single-threaded; all analysis structures are built once
//! from the loaded grammar and immutable afterwards, wrapped in a [`Ctx`]
//! passed by reference.
//!
//! ## Modules
//!
//! - [`grammar`] - Grammar view and table loading
//! - [`redgraph`] - Reduction graph
//! - [`pattern`] - Specification DSL
//! - [`regex`] - Pattern IR and derivation core
//! - [`reduce`] - Reduce simulator and derivation cache
//! - [`dfa`] - DFA construction
//! - [`emit`] - Code emission
//! - [`error`] - Error types
//! - [`testing`] - Table builders for tests and benches

pub mod dfa;
pub mod emit;
pub mod error;
pub mod grammar;
pub mod index;
pub mod partition;
pub mod pattern;
pub mod redgraph;
pub mod reduce;
pub mod regex;
pub mod testing;

pub use dfa::{build_dfa, Dfa, DfaState, St};
pub use error::{ConfigError, Error, LexicalError, ParseError, Pos, ResolutionError};
pub use grammar::{Grammar, RawTables, Symbol};
pub use pattern::{parse_source, translate, CompiledClauses, SpecFile};
pub use redgraph::Redgraph;
pub use regex::{Kre, KreSet, Re, ReBuilder};

/// The compiler context: the loaded grammar and its reduction graph.
///
/// Built once at startup, then read-only.
pub struct Ctx {
    pub grammar: Grammar,
    pub redgraph: Redgraph,
}

impl Ctx {
    #[must_use]
    pub fn new(grammar: Grammar) -> Self {
        let redgraph = Redgraph::build(&grammar);
        Self { grammar, redgraph }
    }
}

/// Compile a parsed specification into a recognizer.
pub fn compile(ctx: &Ctx, spec: &SpecFile) -> Result<emit::Recognizer, Error> {
    let compiled = pattern::translate(&ctx.grammar, spec)?;
    let dfa = dfa::build_dfa(ctx, &compiled.kres);
    Ok(emit::Recognizer {
        dfa,
        clauses: compiled.clauses,
        header: spec.header.clone(),
        trailer: spec.trailer.clone(),
        rule_name: spec.rule.name.text.clone(),
    })
}
