//! Name resolution and lowering of the surface syntax into the pattern IR.
//!
//! Resolution fails eagerly: the first unknown symbol (or terminal standing
//! where a nonterminal is required) aborts translation.

use compact_str::CompactString;

use crate::error::{Error, ResolutionError};
use crate::grammar::items::{states_by_items, ItemSym};
use crate::grammar::{Grammar, Symbol};
use crate::index::{IdxSet, Nonterm};
use crate::pattern::syntax::{Action, ItemSymAst, Name, Pattern, PatternKind, SpecFile};
use crate::regex::{Kre, Re, ReBuilder};

/// Per-clause metadata carried through to emission.
#[derive(Debug, Clone)]
pub struct ClauseInfo {
    pub action: Action,
    /// Capture names bound anywhere in the clause's pattern.
    pub captures: Vec<CompactString>,
}

/// The translated rule: one continuation per clause, in source order.
#[derive(Debug, Clone)]
pub struct CompiledClauses {
    pub kres: Vec<Kre>,
    pub clauses: Vec<ClauseInfo>,
    pub start_nonterms: Vec<Nonterm>,
}

/// Lower a parsed specification against the loaded grammar.
pub fn translate(grammar: &Grammar, spec: &SpecFile) -> Result<CompiledClauses, Error> {
    let mut builder = ReBuilder::new();
    let mut start_nonterms = Vec::new();
    for name in &spec.startsymbols {
        start_nonterms.push(resolve_nonterminal(grammar, name)?);
    }

    let mut kres = Vec::with_capacity(spec.rule.clauses.len());
    let mut clauses = Vec::with_capacity(spec.rule.clauses.len());
    for (index, clause) in spec.rule.clauses.iter().enumerate() {
        let mut captures = Vec::new();
        let re = lower(grammar, &mut builder, &clause.pattern, &mut captures)?;
        kres.push(Kre::more(re, Kre::done(index)));
        clauses.push(ClauseInfo {
            action: clause.action.clone(),
            captures,
        });
    }

    Ok(CompiledClauses {
        kres,
        clauses,
        start_nonterms,
    })
}

fn lower(
    grammar: &Grammar,
    builder: &mut ReBuilder,
    pattern: &Pattern,
    captures: &mut Vec<CompactString>,
) -> Result<Re, Error> {
    let pos = Some(pattern.pos);
    match &pattern.kind {
        PatternKind::Symbol { capture, name } => {
            let symbol = resolve_symbol(grammar, name)?;
            let states = grammar.symbols().states_of_symbol(symbol).clone();
            Ok(builder.set(states, bind(capture, captures), pos))
        }
        PatternKind::Wildcard { capture } => {
            let states = IdxSet::full(grammar.state_count());
            Ok(builder.set(states, bind(capture, captures), pos))
        }
        PatternKind::Item {
            lhs,
            prefix,
            suffix,
        } => {
            let lhs = lhs
                .as_ref()
                .map(|name| resolve_nonterminal(grammar, name))
                .transpose()?;
            let prefix = resolve_item_syms(grammar, prefix)?;
            let suffix = resolve_item_syms(grammar, suffix)?;
            let states = states_by_items(grammar, lhs, &prefix, &suffix);
            Ok(builder.set(states, None, pos))
        }
        PatternKind::Reduce => Ok(builder.reduce(pos)),
        PatternKind::Seq(items) => {
            let lowered = items
                .iter()
                .map(|item| lower(grammar, builder, item, captures))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(builder.seq(lowered, pos))
        }
        PatternKind::Alt(items) => {
            let lowered = items
                .iter()
                .map(|item| lower(grammar, builder, item, captures))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(builder.alt(lowered, pos))
        }
        PatternKind::Star(inner) => {
            let lowered = lower(grammar, builder, inner, captures)?;
            Ok(builder.star(lowered, pos))
        }
    }
}

fn bind(capture: &Option<Name>, captures: &mut Vec<CompactString>) -> Option<CompactString> {
    capture.as_ref().map(|name| {
        captures.push(name.text.clone());
        name.text.clone()
    })
}

fn resolve_symbol(grammar: &Grammar, name: &Name) -> Result<Symbol, ResolutionError> {
    grammar
        .resolve_symbol(&name.text)
        .ok_or_else(|| ResolutionError::UnknownSymbol {
            name: name.text.to_string(),
            pos: name.pos,
        })
}

fn resolve_nonterminal(grammar: &Grammar, name: &Name) -> Result<Nonterm, ResolutionError> {
    match resolve_symbol(grammar, name)? {
        Symbol::N(nonterm) => Ok(nonterm),
        Symbol::T(_) => Err(ResolutionError::TerminalAsNonterminal {
            name: name.text.to_string(),
            pos: name.pos,
        }),
    }
}

fn resolve_item_syms(
    grammar: &Grammar,
    syms: &[ItemSymAst],
) -> Result<Vec<ItemSym>, ResolutionError> {
    syms.iter()
        .map(|sym| match sym {
            ItemSymAst::Wild(_) => Ok(ItemSym::Wild),
            ItemSymAst::Name(name) => resolve_symbol(grammar, name).map(ItemSym::Sym),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parser::parse_source;
    use crate::regex::{KreNode, ReDesc};
    use crate::testing;
    use std::path::PathBuf;

    fn compile(grammar: &Grammar, source: &str) -> Result<CompiledClauses, Error> {
        let spec = parse_source(source, &PathBuf::from("test.lrm"))?;
        translate(grammar, &spec)
    }

    #[test]
    fn test_symbol_atom_lowers_to_incoming_states() {
        let grammar = testing::unit_chain_grammar();
        let compiled = compile(&grammar, "rule r = | a { act }").unwrap();
        assert_eq!(compiled.kres.len(), 1);
        let KreNode::More(re, cont) = compiled.kres[0].node() else {
            panic!("expected a More node");
        };
        assert_eq!(cont, &Kre::done(0));
        let ReDesc::Set { states, .. } = re.desc() else {
            panic!("expected a state set");
        };
        let expected = grammar
            .symbols()
            .states_of_symbol(grammar.resolve_symbol("a").unwrap());
        assert_eq!(states, expected);
    }

    #[test]
    fn test_unknown_symbol_fails_resolution() {
        let grammar = testing::unit_chain_grammar();
        let err = compile(&grammar, "rule r = | FOO { act }").unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Unknown symbol FOO");
    }

    #[test]
    fn test_terminal_as_item_lhs_is_rejected() {
        let grammar = testing::unit_chain_grammar();
        let err = compile(&grammar, "rule r = | [a: . ] { act }").unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("nonterminal is required"));
    }

    #[test]
    fn test_item_template_selects_states() {
        let grammar = testing::binop_grammar();
        let compiled = compile(&grammar, "rule r = | [E: E PLUS . E] { act }").unwrap();
        let KreNode::More(re, _) = compiled.kres[0].node() else {
            panic!("expected a More node");
        };
        let ReDesc::Set { states, .. } = re.desc() else {
            panic!("expected a state set");
        };
        // Exactly the state entered on PLUS carries the item E -> E + . E.
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn test_captures_are_preserved_in_ir_and_metadata() {
        let grammar = testing::unit_chain_grammar();
        let compiled = compile(&grammar, "rule r = | x = a ; _ { act }").unwrap();
        assert_eq!(compiled.clauses[0].captures, vec!["x"]);
        let KreNode::More(re, _) = compiled.kres[0].node() else {
            panic!("expected a More node");
        };
        let ReDesc::Seq(items) = re.desc() else {
            panic!("expected a sequence");
        };
        let ReDesc::Set { capture, .. } = items[0].desc() else {
            panic!("expected a state set");
        };
        assert_eq!(capture.as_deref(), Some("x"));
    }

    #[test]
    fn test_startsymbols_resolve_to_nonterminals() {
        let grammar = testing::unit_chain_grammar();
        let compiled = compile(&grammar, "startsymbols S rule r = | a { act }").unwrap();
        assert_eq!(compiled.start_nonterms.len(), 1);

        let err = compile(&grammar, "startsymbols a rule r = | a { act }").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_clause_indices_follow_source_order() {
        let grammar = testing::unit_chain_grammar();
        let compiled =
            compile(&grammar, "rule r = | a { one } | A { two } | S { three }").unwrap();
        for (index, kre) in compiled.kres.iter().enumerate() {
            let KreNode::More(_, cont) = kre.node() else {
                panic!("expected a More node");
            };
            assert_eq!(cont, &Kre::done(index));
        }
    }
}
