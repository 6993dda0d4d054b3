//! State matchers: by incoming symbol and by item template.
//!
//! Pattern atoms select sets of LR(1) states. A bare symbol selects the
//! states whose incoming symbol equals it; an `[lhs: prefix . suffix]`
//! template selects the states whose item set contains a matching item.

use crate::grammar::{Grammar, Symbol};
use crate::index::{IdxSet, IndexVec, Lr1, Nonterm, Term};

/// A position of an item template: a concrete symbol or the wildcard `_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSym {
    Wild,
    Sym(Symbol),
}

impl ItemSym {
    fn matches(self, sym: Symbol) -> bool {
        match self {
            Self::Wild => true,
            Self::Sym(expected) => expected == sym,
        }
    }
}

/// Precomputed `states_of_symbol` tables.
#[derive(Debug, Clone)]
pub struct SymbolIndex {
    by_terminal: IndexVec<Term, IdxSet<Lr1>>,
    by_nonterminal: IndexVec<Nonterm, IdxSet<Lr1>>,
}

impl SymbolIndex {
    pub(super) fn build(
        states: &IndexVec<Lr1, super::StateData>,
        n_terms: usize,
        n_nonterms: usize,
    ) -> Self {
        let n_states = states.len();
        let mut by_terminal = IndexVec::from_fn(n_terms, |_| IdxSet::empty(n_states));
        let mut by_nonterminal = IndexVec::from_fn(n_nonterms, |_| IdxSet::empty(n_states));
        for (state, data) in states.iter_enumerated() {
            match data.incoming {
                Some(Symbol::T(t)) => {
                    by_terminal[t].insert(state);
                }
                Some(Symbol::N(n)) => {
                    by_nonterminal[n].insert(state);
                }
                None => {}
            }
        }
        Self {
            by_terminal,
            by_nonterminal,
        }
    }

    /// States whose incoming symbol is `sym`.
    #[must_use]
    pub fn states_of_symbol(&self, sym: Symbol) -> &IdxSet<Lr1> {
        match sym {
            Symbol::T(t) => &self.by_terminal[t],
            Symbol::N(n) => &self.by_nonterminal[n],
        }
    }
}

/// States with an item matching the `[lhs: prefix . suffix]` template.
///
/// An item `(p, pos)` matches when the optional `lhs` equals `lhs(p)`, the
/// dot has consumed at least `|prefix|` symbols, at least `|suffix|` symbols
/// remain, and both template sides agree (up to wildcards) with the RHS
/// around the dot.
#[must_use]
pub fn states_by_items(
    grammar: &Grammar,
    lhs: Option<Nonterm>,
    prefix: &[ItemSym],
    suffix: &[ItemSym],
) -> IdxSet<Lr1> {
    let mut out = IdxSet::empty(grammar.state_count());
    for state in grammar.states() {
        let matched = grammar.items(state).iter().any(|item| {
            let prod = grammar.production(item.prod);
            let pos = item.pos as usize;
            if lhs.is_some_and(|want| prod.lhs != want) {
                return false;
            }
            if pos < prefix.len() || prod.rhs.len() < pos + suffix.len() {
                return false;
            }
            let prefix_ok = prefix
                .iter()
                .enumerate()
                .all(|(k, sym)| sym.matches(prod.rhs[pos - prefix.len() + k]));
            let suffix_ok = suffix
                .iter()
                .enumerate()
                .all(|(k, sym)| sym.matches(prod.rhs[pos + k]));
            prefix_ok && suffix_ok
        });
        if matched {
            out.insert(state);
        }
    }
    out
}
