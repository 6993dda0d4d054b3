//! # Test Support
//!
//! Builders and canned LR(1) automata for tests and benches.
//!
//! The automata here are small enough to be written out state by state;
//! each constructor documents the grammar it encodes and the shape of the
//! resulting automaton, so tests can assert against concrete states.

use crate::grammar::{Grammar, RawProdKind, RawProduction, RawState, RawSymbol, RawTables};

/// Incremental builder for raw LR(1) tables.
///
/// Indices are returned in creation order, so tests can refer to states and
/// productions by the handles they got back.
#[derive(Debug, Default)]
pub struct TablesBuilder {
    raw: RawTables,
}

impl TablesBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminal(&mut self, name: &str) -> u32 {
        self.raw.terminals.push(name.to_string());
        (self.raw.terminals.len() - 1) as u32
    }

    pub fn nonterminal(&mut self, name: &str) -> u32 {
        self.raw.nonterminals.push(name.to_string());
        (self.raw.nonterminals.len() - 1) as u32
    }

    pub fn production(&mut self, lhs: u32, rhs: &[RawSymbol]) -> u32 {
        self.push_production(lhs, rhs, RawProdKind::Regular)
    }

    pub fn start_production(&mut self, lhs: u32, rhs: &[RawSymbol]) -> u32 {
        self.push_production(lhs, rhs, RawProdKind::Start)
    }

    fn push_production(&mut self, lhs: u32, rhs: &[RawSymbol], kind: RawProdKind) -> u32 {
        self.raw.productions.push(RawProduction {
            lhs,
            rhs: rhs.to_vec(),
            kind,
        });
        (self.raw.productions.len() - 1) as u32
    }

    pub fn state(&mut self, incoming: Option<RawSymbol>, items: &[(u32, u32)]) -> u32 {
        self.raw.states.push(RawState {
            incoming,
            items: items.to_vec(),
            reductions: Vec::new(),
            transitions: Vec::new(),
        });
        (self.raw.states.len() - 1) as u32
    }

    pub fn transition(&mut self, from: u32, sym: RawSymbol, to: u32) {
        self.raw.states[from as usize].transitions.push((sym, to));
    }

    pub fn reduction(&mut self, state: u32, lookahead: u32, prods: &[u32]) {
        self.raw.states[state as usize]
            .reductions
            .push((lookahead, prods.to_vec()));
    }

    /// Validate and build the typed grammar view.
    ///
    /// # Panics
    ///
    /// Panics if the assembled tables are inconsistent; builders in tests
    /// are expected to be well formed.
    #[must_use]
    pub fn build(self) -> Grammar {
        if let Err(message) = self.raw.validate() {
            panic!("inconsistent test tables: {message}");
        }
        Grammar::new(&self.raw)
    }

    #[must_use]
    pub fn into_raw(self) -> RawTables {
        self.raw
    }
}

/// `S' -> S`, `S -> A`, `A -> a`.
///
/// ```text
/// st0 --S--> st1   (accept)
/// st0 --A--> st2   (reduce S -> A)
/// st0 --a--> st3   (reduce A -> a)
/// ```
#[must_use]
pub fn unit_chain_grammar() -> Grammar {
    let mut b = TablesBuilder::new();
    let a = b.terminal("a");
    let eof = b.terminal("#");
    let s_start = b.nonterminal("S'");
    let s = b.nonterminal("S");
    let nt_a = b.nonterminal("A");

    let p0 = b.start_production(s_start, &[RawSymbol::N(s)]);
    let p1 = b.production(s, &[RawSymbol::N(nt_a)]);
    let p2 = b.production(nt_a, &[RawSymbol::T(a)]);

    let st0 = b.state(None, &[(p0, 0), (p1, 0), (p2, 0)]);
    let st1 = b.state(Some(RawSymbol::N(s)), &[(p0, 1)]);
    let st2 = b.state(Some(RawSymbol::N(nt_a)), &[(p1, 1)]);
    let st3 = b.state(Some(RawSymbol::T(a)), &[(p2, 1)]);

    b.transition(st0, RawSymbol::N(s), st1);
    b.transition(st0, RawSymbol::N(nt_a), st2);
    b.transition(st0, RawSymbol::T(a), st3);
    b.reduction(st1, eof, &[p0]);
    b.reduction(st2, eof, &[p1]);
    b.reduction(st3, eof, &[p2]);

    b.build()
}

/// `E -> E '+' E | 'n'` (states merged LR(0)-style; the conflicts are
/// irrelevant here, only the item sets matter).
///
/// ```text
/// st0 --E--> st1 --+--> st3 --E--> st4 --+--> st3
/// st0 --n--> st2            st3 --n--> st2
/// ```
#[must_use]
pub fn binop_grammar() -> Grammar {
    let mut b = TablesBuilder::new();
    let n = b.terminal("NUM");
    let plus = b.terminal("PLUS");
    let eof = b.terminal("#");
    let e_start = b.nonterminal("E'");
    let e = b.nonterminal("E");

    let p0 = b.start_production(e_start, &[RawSymbol::N(e)]);
    let p1 = b.production(e, &[RawSymbol::N(e), RawSymbol::T(plus), RawSymbol::N(e)]);
    let p2 = b.production(e, &[RawSymbol::T(n)]);

    let st0 = b.state(None, &[(p0, 0), (p1, 0), (p2, 0)]);
    let st1 = b.state(Some(RawSymbol::N(e)), &[(p0, 1), (p1, 1)]);
    let st2 = b.state(Some(RawSymbol::T(n)), &[(p2, 1)]);
    let st3 = b.state(Some(RawSymbol::T(plus)), &[(p1, 2), (p1, 0), (p2, 0)]);
    let st4 = b.state(Some(RawSymbol::N(e)), &[(p1, 3), (p1, 1)]);

    b.transition(st0, RawSymbol::N(e), st1);
    b.transition(st0, RawSymbol::T(n), st2);
    b.transition(st1, RawSymbol::T(plus), st3);
    b.transition(st3, RawSymbol::N(e), st4);
    b.transition(st3, RawSymbol::T(n), st2);
    b.transition(st4, RawSymbol::T(plus), st3);
    b.reduction(st1, eof, &[p0]);
    b.reduction(st2, plus, &[p2]);
    b.reduction(st2, eof, &[p2]);
    b.reduction(st4, plus, &[p1]);
    b.reduction(st4, eof, &[p1]);

    b.build()
}

/// `S' -> S`, `S -> A`, `A -> ε`.
///
/// The epsilon reduction applies a goto without popping, so the reduction
/// graph of `st0` grows concrete frames and the derivation trie is
/// non-empty: paths `st0.st2` and `st0.st1`, both originating at `st0`.
#[must_use]
pub fn epsilon_grammar() -> Grammar {
    let mut b = TablesBuilder::new();
    let eof = b.terminal("#");
    let s_start = b.nonterminal("S'");
    let s = b.nonterminal("S");
    let nt_a = b.nonterminal("A");

    let p0 = b.start_production(s_start, &[RawSymbol::N(s)]);
    let p1 = b.production(s, &[RawSymbol::N(nt_a)]);
    let p2 = b.production(nt_a, &[]);

    let st0 = b.state(None, &[(p0, 0), (p1, 0), (p2, 0)]);
    let st1 = b.state(Some(RawSymbol::N(s)), &[(p0, 1)]);
    let st2 = b.state(Some(RawSymbol::N(nt_a)), &[(p1, 1)]);

    b.transition(st0, RawSymbol::N(s), st1);
    b.transition(st0, RawSymbol::N(nt_a), st2);
    b.reduction(st0, eof, &[p2]);
    b.reduction(st1, eof, &[p0]);
    b.reduction(st2, eof, &[p1]);

    b.build()
}

/// `S -> '(' S ')' | 'x'` (plus the start wrapper).
///
/// ```text
/// st0 --S--> st1        st2 --S--> st4 --)--> st5
/// st0 --(--> st2        st2 --(--> st2
/// st0 --x--> st3        st2 --x--> st3
/// ```
#[must_use]
pub fn paren_grammar() -> Grammar {
    let mut b = TablesBuilder::new();
    let lparen = b.terminal("LPAREN");
    let rparen = b.terminal("RPAREN");
    let x = b.terminal("X");
    let eof = b.terminal("#");
    let s_start = b.nonterminal("S'");
    let s = b.nonterminal("S");

    let p0 = b.start_production(s_start, &[RawSymbol::N(s)]);
    let p1 = b.production(
        s,
        &[RawSymbol::T(lparen), RawSymbol::N(s), RawSymbol::T(rparen)],
    );
    let p2 = b.production(s, &[RawSymbol::T(x)]);

    let st0 = b.state(None, &[(p0, 0), (p1, 0), (p2, 0)]);
    let st1 = b.state(Some(RawSymbol::N(s)), &[(p0, 1)]);
    let st2 = b.state(Some(RawSymbol::T(lparen)), &[(p1, 1), (p1, 0), (p2, 0)]);
    let st3 = b.state(Some(RawSymbol::T(x)), &[(p2, 1)]);
    let st4 = b.state(Some(RawSymbol::N(s)), &[(p1, 2)]);
    let st5 = b.state(Some(RawSymbol::T(rparen)), &[(p1, 3)]);

    b.transition(st0, RawSymbol::N(s), st1);
    b.transition(st0, RawSymbol::T(lparen), st2);
    b.transition(st0, RawSymbol::T(x), st3);
    b.transition(st2, RawSymbol::N(s), st4);
    b.transition(st2, RawSymbol::T(lparen), st2);
    b.transition(st2, RawSymbol::T(x), st3);
    b.transition(st4, RawSymbol::T(rparen), st5);
    b.reduction(st1, eof, &[p0]);
    b.reduction(st3, eof, &[p2]);
    b.reduction(st3, rparen, &[p2]);
    b.reduction(st5, eof, &[p1]);
    b.reduction(st5, rparen, &[p1]);

    b.build()
}

/// A single state with no reductions and no transitions.
#[must_use]
pub fn lone_state_grammar() -> Grammar {
    let mut b = TablesBuilder::new();
    b.terminal("#");
    let s_start = b.nonterminal("S'");
    let p0 = b.start_production(s_start, &[]);
    b.state(None, &[(p0, 0)]);
    b.build()
}

/// A synthetic unit-production chain `A0 -> A1 -> ... -> An -> a` used by
/// the benches to scale the automaton.
#[must_use]
pub fn chain_grammar(depth: usize) -> Grammar {
    let mut b = TablesBuilder::new();
    let a = b.terminal("a");
    let eof = b.terminal("#");
    let start = b.nonterminal("S'");
    let nts: Vec<u32> = (0..=depth)
        .map(|i| b.nonterminal(&format!("A{i}")))
        .collect();

    let p0 = b.start_production(start, &[RawSymbol::N(nts[0])]);
    let mut prods = vec![p0];
    for window in nts.windows(2) {
        prods.push(b.production(window[0], &[RawSymbol::N(window[1])]));
    }
    let p_leaf = b.production(nts[depth], &[RawSymbol::T(a)]);

    let all_items: Vec<(u32, u32)> = prods
        .iter()
        .map(|&p| (p, 0))
        .chain(std::iter::once((p_leaf, 0)))
        .collect();
    let st0 = b.state(None, &all_items);
    let st_leaf = b.state(Some(RawSymbol::T(a)), &[(p_leaf, 1)]);
    b.transition(st0, RawSymbol::T(a), st_leaf);
    b.reduction(st_leaf, eof, &[p_leaf]);
    for (i, &nt) in nts.iter().enumerate() {
        let st = b.state(Some(RawSymbol::N(nt)), &[(prods[i], 1)]);
        b.transition(st0, RawSymbol::N(nt), st);
        if i > 0 {
            b.reduction(st, eof, &[prods[i]]);
        }
    }

    b.build()
}
