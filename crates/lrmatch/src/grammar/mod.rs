//! # Grammar View
//!
//! Typed, index-based wrapper over the compiled LR(1) tables.
//!
//! ## Overview
//!
//! The view gives the rest of the compiler O(1), array-backed access to:
//!
//! - **Symbols**: terminals, nonterminals, and their names
//! - **Productions**: `lhs`, `rhs`, and start/regular kind
//! - **States**: incoming symbol, item sets, and reductions grouped by pop
//!   depth (RHS length), deduplicated across lookaheads and excluding start
//!   productions
//! - **Transitions**: the goto/shift split with successor/predecessor
//!   adjacency ([`Transitions`])
//! - **Matchers**: states by incoming symbol and by item template
//!   ([`items`])
//!
//! Everything here is built once when the tables are loaded and is
//! immutable afterwards.

pub mod items;
pub mod tables;
mod transitions;

pub use items::{ItemSym, SymbolIndex};
pub use tables::{RawProdKind, RawProduction, RawState, RawSymbol, RawTables};
pub use transitions::{Any, SplitAny, Transitions};

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::index::{Idx, IdxSet, IndexVec, Lr1, Nonterm, Prod, Term};

/// A grammar symbol: terminal or nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    T(Term),
    N(Nonterm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProdKind {
    Start,
    Regular,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub lhs: Nonterm,
    pub rhs: Vec<Symbol>,
    pub kind: ProdKind,
}

/// An LR(1) item: a production with a dot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub prod: Prod,
    pub pos: u32,
}

#[derive(Debug, Clone)]
struct StateData {
    incoming: Option<Symbol>,
    items: Vec<Item>,
}

/// The typed view over a loaded LR(1) automaton.
#[derive(Debug, Clone)]
pub struct Grammar {
    terminals: IndexVec<Term, CompactString>,
    nonterminals: IndexVec<Nonterm, CompactString>,
    productions: IndexVec<Prod, Production>,
    states: IndexVec<Lr1, StateData>,
    /// Per state, index `d` holds the left-hand sides of the reducible
    /// productions whose RHS length is `d`.
    reductions: IndexVec<Lr1, Vec<IdxSet<Nonterm>>>,
    transitions: Transitions,
    symbols: SymbolIndex,
    by_name: HashMap<CompactString, Symbol, ahash::RandomState>,
}

impl Grammar {
    /// Build the view from raw tables. The tables must already be validated.
    #[must_use]
    pub fn new(raw: &RawTables) -> Self {
        let terminals: IndexVec<Term, CompactString> = IndexVec::from_raw(
            raw.terminals.iter().map(|s| CompactString::from(s.as_str())).collect(),
        );
        let nonterminals: IndexVec<Nonterm, CompactString> = IndexVec::from_raw(
            raw.nonterminals.iter().map(|s| CompactString::from(s.as_str())).collect(),
        );

        let productions: IndexVec<Prod, Production> = IndexVec::from_raw(
            raw.productions
                .iter()
                .map(|p| Production {
                    lhs: Nonterm::from_index(p.lhs as usize),
                    rhs: p.rhs.iter().map(|&s| Self::symbol_of_raw(s)).collect(),
                    kind: match p.kind {
                        RawProdKind::Start => ProdKind::Start,
                        RawProdKind::Regular => ProdKind::Regular,
                    },
                })
                .collect(),
        );

        let states: IndexVec<Lr1, StateData> = IndexVec::from_raw(
            raw.states
                .iter()
                .map(|s| StateData {
                    incoming: s.incoming.map(Self::symbol_of_raw),
                    items: s
                        .items
                        .iter()
                        .map(|&(prod, pos)| Item {
                            prod: Prod::from_index(prod as usize),
                            pos,
                        })
                        .collect(),
                })
                .collect(),
        );

        let reductions = IndexVec::from_fn(raw.states.len(), |state: Lr1| {
            Self::group_reductions(&productions, &raw.states[state.index()], nonterminals.len())
        });

        let transitions = Transitions::build(
            raw.states.len(),
            raw.states.iter().enumerate().flat_map(|(i, s)| {
                let source = Lr1::from_index(i);
                s.transitions.iter().map(move |&(sym, target)| {
                    (source, Self::symbol_of_raw(sym), Lr1::from_index(target as usize))
                })
            }),
        );

        let symbols = SymbolIndex::build(&states, terminals.len(), nonterminals.len());

        let mut by_name = HashMap::with_hasher(ahash::RandomState::new());
        for (t, name) in terminals.iter_enumerated() {
            by_name.insert(name.clone(), Symbol::T(t));
        }
        for (n, name) in nonterminals.iter_enumerated() {
            by_name.insert(name.clone(), Symbol::N(n));
        }

        Self {
            terminals,
            nonterminals,
            productions,
            states,
            reductions,
            transitions,
            symbols,
            by_name,
        }
    }

    /// Deduplicate a state's reductions across lookaheads, drop start
    /// productions, and group the left-hand sides by RHS length.
    fn group_reductions(
        productions: &IndexVec<Prod, Production>,
        raw: &RawState,
        n_nonterms: usize,
    ) -> Vec<IdxSet<Nonterm>> {
        let mut seen: Vec<Prod> = Vec::new();
        for (_, chain) in &raw.reductions {
            for &p in chain {
                let prod = Prod::from_index(p as usize);
                if matches!(productions[prod].kind, ProdKind::Start) {
                    continue;
                }
                if !seen.contains(&prod) {
                    seen.push(prod);
                }
            }
        }
        let max_depth = seen
            .iter()
            .map(|&p| productions[p].rhs.len())
            .max()
            .map_or(0, |d| d + 1);
        let mut grouped = vec![IdxSet::empty(n_nonterms); max_depth];
        for &prod in &seen {
            let data = &productions[prod];
            grouped[data.rhs.len()].insert(data.lhs);
        }
        grouped
    }

    fn symbol_of_raw(sym: RawSymbol) -> Symbol {
        match sym {
            RawSymbol::T(t) => Symbol::T(Term::from_index(t as usize)),
            RawSymbol::N(n) => Symbol::N(Nonterm::from_index(n as usize)),
        }
    }

    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    #[must_use]
    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    #[must_use]
    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> impl DoubleEndedIterator<Item = Lr1> + '_ {
        self.states.indices()
    }

    #[must_use]
    pub fn terminal_name(&self, t: Term) -> &str {
        &self.terminals[t]
    }

    #[must_use]
    pub fn nonterminal_name(&self, n: Nonterm) -> &str {
        &self.nonterminals[n]
    }

    #[must_use]
    pub fn symbol_name(&self, sym: Symbol) -> &str {
        match sym {
            Symbol::T(t) => self.terminal_name(t),
            Symbol::N(n) => self.nonterminal_name(n),
        }
    }

    /// Look a symbol up by its surface name.
    #[must_use]
    pub fn resolve_symbol(&self, name: &str) -> Option<Symbol> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn production(&self, p: Prod) -> &Production {
        &self.productions[p]
    }

    /// The item set of a state.
    #[must_use]
    pub fn items(&self, state: Lr1) -> &[Item] {
        &self.states[state].items
    }

    /// The symbol on every transition entering `state`.
    #[must_use]
    pub fn incoming(&self, state: Lr1) -> Option<Symbol> {
        self.states[state].incoming
    }

    /// Reducible left-hand sides of `state`, grouped by pop depth.
    #[must_use]
    pub fn reductions(&self, state: Lr1) -> &[IdxSet<Nonterm>] {
        &self.reductions[state]
    }

    #[must_use]
    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }
}
