//! Transition tables of the LR(1) automaton.
//!
//! The raw per-state transition lists are split into two densely numbered
//! universes: goto transitions (labeled by nonterminals, taken after a
//! reduction) and shift transitions (labeled by terminals, taken on input).
//! [`Any`] is the disjoint union of the two, numbering gotos first.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::grammar::Symbol;
use crate::index::{Goto, Idx, IdxSet, IndexVec, Lr1, Nonterm, Shift, Term};

/// Either half of the transition union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAny {
    Goto(Goto),
    Shift(Shift),
}

/// A transition of either kind; gotos occupy the indices `0..goto_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Any(u32);

impl Any {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    source: Lr1,
    target: Lr1,
}

/// Goto/shift split of the automaton's transitions with O(1) adjacency.
#[derive(Debug, Clone)]
pub struct Transitions {
    gotos: Vec<Edge>,
    goto_syms: Vec<Nonterm>,
    shifts: Vec<Edge>,
    shift_syms: Vec<Term>,
    successors: IndexVec<Lr1, SmallVec<[Any; 4]>>,
    predecessors: IndexVec<Lr1, SmallVec<[Any; 4]>>,
    predecessor_states: IndexVec<Lr1, IdxSet<Lr1>>,
    goto_lookup: HashMap<(Lr1, Nonterm), Goto, ahash::RandomState>,
}

impl Transitions {
    pub(super) fn build(
        n_states: usize,
        edges: impl Iterator<Item = (Lr1, Symbol, Lr1)>,
    ) -> Self {
        let mut gotos = Vec::new();
        let mut goto_syms = Vec::new();
        let mut shifts = Vec::new();
        let mut shift_syms = Vec::new();

        for (source, symbol, target) in edges {
            match symbol {
                Symbol::N(n) => {
                    gotos.push(Edge { source, target });
                    goto_syms.push(n);
                }
                Symbol::T(t) => {
                    shifts.push(Edge { source, target });
                    shift_syms.push(t);
                }
            }
        }

        let mut this = Self {
            gotos,
            goto_syms,
            shifts,
            shift_syms,
            successors: IndexVec::from_fn(n_states, |_| SmallVec::new()),
            predecessors: IndexVec::from_fn(n_states, |_| SmallVec::new()),
            predecessor_states: IndexVec::from_fn(n_states, |_| IdxSet::empty(n_states)),
            goto_lookup: HashMap::with_hasher(ahash::RandomState::new()),
        };

        for index in 0..this.gotos.len() + this.shifts.len() {
            let any = Any(index as u32);
            let (source, target) = (this.source(any), this.target(any));
            this.successors[source].push(any);
            this.predecessors[target].push(any);
            this.predecessor_states[target].insert(source);
        }
        for (index, sym) in this.goto_syms.iter().enumerate() {
            let goto = Goto::from_index(index);
            this.goto_lookup.insert((this.gotos[index].source, *sym), goto);
        }
        this
    }

    #[must_use]
    pub fn goto_count(&self) -> usize {
        self.gotos.len()
    }

    #[must_use]
    pub fn shift_count(&self) -> usize {
        self.shifts.len()
    }

    #[must_use]
    pub fn split(&self, any: Any) -> SplitAny {
        let index = any.index();
        if index < self.gotos.len() {
            SplitAny::Goto(Goto::from_index(index))
        } else {
            SplitAny::Shift(Shift::from_index(index - self.gotos.len()))
        }
    }

    #[must_use]
    pub fn of_goto(&self, goto: Goto) -> Any {
        Any(goto.index() as u32)
    }

    #[must_use]
    pub fn of_shift(&self, shift: Shift) -> Any {
        Any((self.gotos.len() + shift.index()) as u32)
    }

    #[must_use]
    pub fn source(&self, any: Any) -> Lr1 {
        self.edge(any).source
    }

    #[must_use]
    pub fn target(&self, any: Any) -> Lr1 {
        self.edge(any).target
    }

    #[must_use]
    pub fn symbol(&self, any: Any) -> Symbol {
        match self.split(any) {
            SplitAny::Goto(g) => Symbol::N(self.goto_symbol(g)),
            SplitAny::Shift(h) => Symbol::T(self.shift_symbol(h)),
        }
    }

    #[must_use]
    pub fn goto_symbol(&self, goto: Goto) -> Nonterm {
        self.goto_syms[goto.index()]
    }

    #[must_use]
    pub fn shift_symbol(&self, shift: Shift) -> Term {
        self.shift_syms[shift.index()]
    }

    #[must_use]
    pub fn goto_target(&self, goto: Goto) -> Lr1 {
        self.gotos[goto.index()].target
    }

    /// Outgoing transitions of a state.
    #[must_use]
    pub fn successors(&self, state: Lr1) -> &[Any] {
        &self.successors[state]
    }

    /// Incoming transitions of a state.
    #[must_use]
    pub fn predecessors(&self, state: Lr1) -> &[Any] {
        &self.predecessors[state]
    }

    /// Source states of all incoming transitions.
    #[must_use]
    pub fn predecessor_states(&self, state: Lr1) -> &IdxSet<Lr1> {
        &self.predecessor_states[state]
    }

    /// The goto transition leaving `state` on `nonterm`, if any.
    #[must_use]
    pub fn find_goto(&self, state: Lr1, nonterm: Nonterm) -> Option<Goto> {
        self.goto_lookup.get(&(state, nonterm)).copied()
    }

    /// Target of the goto leaving `state` on `nonterm`, if any.
    #[must_use]
    pub fn find_goto_target(&self, state: Lr1, nonterm: Nonterm) -> Option<Lr1> {
        self.find_goto(state, nonterm).map(|g| self.goto_target(g))
    }

    fn edge(&self, any: Any) -> Edge {
        let index = any.index();
        if index < self.gotos.len() {
            self.gotos[index]
        } else {
            self.shifts[index - self.gotos.len()]
        }
    }
}
