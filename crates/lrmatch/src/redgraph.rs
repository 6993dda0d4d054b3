//! # Reduction Graph
//!
//! Static analysis over the LR(1) automaton that enumerates every stack
//! suffix reachable by applying a sequence of reductions from every state.
//!
//! ## Overview
//!
//! The graph is built in four phases:
//!
//! 1. **Abstract frames**: one reserved frame per LR(1) state (`of_lr1`),
//!    whose `states` are the state's predecessors; deeper frames are
//!    allocated lazily while popping below the known suffix.
//! 2. **Stack-suffix enumeration**: for every state, a tree of concrete
//!    frames is grown by simulating its reductions; a goto applied while the
//!    popped prefix is still known creates a concrete child, a goto applied
//!    in the unknown region is recorded on the abstract frame.
//! 3. **Derivation trie**: every root-to-node chain of every concrete tree
//!    is inserted into a global trie; the terminal node records which state
//!    the chain originates from.
//! 4. **Goto closure / reachable goto**: per abstract frame, its states are
//!    partitioned by the set of states their transitive goto closure
//!    reaches, and `reachable_goto` is the least fixed point over the frame
//!    graph.
//!
//! Everything is immutable once [`Redgraph::build`] returns. Frames are
//! arena indices; parent links always point strictly deeper into the stack.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::grammar::Grammar;
use crate::index::{AbsFrame, Idx, IdxSet, IndexVec, Lr1, Nonterm};

/// A concrete frame in the arena: a fully known stack suffix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConcreteId(u32);

impl ConcreteId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct ConcreteFrame {
    state: Lr1,
    parent: Option<ConcreteId>,
    /// Goto children keyed by target state; ordered for determinism.
    children: BTreeMap<Lr1, ConcreteId>,
}

/// A stack suffix whose concrete prefix is unknown: only the set of possible
/// top states is tracked. `parent` points one frame deeper.
#[derive(Debug, Clone)]
pub struct AbstractFrame {
    pub states: IdxSet<Lr1>,
    pub goto_nt: IdxSet<Nonterm>,
    pub parent: Option<AbsFrame>,
}

/// One cell of a frame's goto closure: `sources` all reach exactly the
/// states in `targets` by transitive goto steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureCell {
    pub sources: IdxSet<Lr1>,
    pub targets: IdxSet<Lr1>,
}

#[derive(Debug, Clone)]
struct TrieNode {
    children: BTreeMap<Lr1, usize>,
    goto_targets: IdxSet<Lr1>,
}

#[derive(Clone, Copy)]
enum FramePtr {
    Concrete(ConcreteId),
    Abstract(AbsFrame),
}

/// The reduction graph of an LR(1) automaton.
#[derive(Debug, Clone)]
pub struct Redgraph {
    n_states: usize,
    n_nonterms: usize,
    concrete: Vec<ConcreteFrame>,
    roots: IndexVec<Lr1, ConcreteId>,
    abstracts: Vec<AbstractFrame>,
    trie: Vec<TrieNode>,
    goto_closure: Vec<Vec<ClosureCell>>,
    reachable_goto: Vec<IdxSet<Lr1>>,
}

impl Redgraph {
    /// The reserved abstract frame of an LR(1) state.
    #[must_use]
    pub fn of_lr1(state: Lr1) -> AbsFrame {
        AbsFrame::new(state.index())
    }

    #[must_use]
    pub fn build(grammar: &Grammar) -> Self {
        let n_states = grammar.state_count();
        let n_nonterms = grammar.nonterminal_count();

        let abstracts = grammar
            .states()
            .map(|s| AbstractFrame {
                states: grammar.transitions().predecessor_states(s).clone(),
                goto_nt: IdxSet::empty(n_nonterms),
                parent: None,
            })
            .collect();

        let mut this = Self {
            n_states,
            n_nonterms,
            concrete: Vec::new(),
            roots: IndexVec::new(),
            abstracts,
            trie: vec![TrieNode {
                children: BTreeMap::new(),
                goto_targets: IdxSet::empty(n_states),
            }],
            goto_closure: Vec::new(),
            reachable_goto: Vec::new(),
        };

        for state in grammar.states() {
            let root = this.alloc_concrete(state, None);
            this.roots.push(root);
            this.populate(grammar, root);
        }

        this.build_trie();
        this.build_goto_closure(grammar);
        this.build_reachable_goto();
        this
    }

    /// Simulate the reductions of the frame's state, growing concrete
    /// children while the popped prefix stays known and recording abstract
    /// gotos once it does not.
    fn populate(&mut self, grammar: &Grammar, frame: ConcreteId) {
        let state = self.concrete[frame.index()].state;
        let depths = grammar.reductions(state).len();
        let mut fp = FramePtr::Concrete(frame);
        for depth in 0..depths {
            if depth > 0 {
                fp = self.pop(grammar, fp);
            }
            for nt in grammar.reductions(state)[depth].iter() {
                match fp {
                    FramePtr::Concrete(c) => {
                        let src = self.concrete[c.index()].state;
                        let Some(target) = grammar.transitions().find_goto_target(src, nt)
                        else {
                            panic!(
                                "reduction graph: state {src:?} is claimed reducible on \
                                 {nt:?} but has no goto"
                            );
                        };
                        if self.concrete[c.index()].children.contains_key(&target) {
                            continue;
                        }
                        // A state occurs at most once on any root-to-leaf path.
                        if self.on_path(c, target) {
                            continue;
                        }
                        let child = self.alloc_concrete(target, Some(c));
                        self.concrete[c.index()].children.insert(target, child);
                        self.populate(grammar, child);
                    }
                    FramePtr::Abstract(a) => {
                        self.abstracts[a.index()].goto_nt.insert(nt);
                    }
                }
            }
        }
    }

    /// Move the frame pointer one stack position deeper.
    fn pop(&mut self, grammar: &Grammar, fp: FramePtr) -> FramePtr {
        match fp {
            FramePtr::Concrete(c) => {
                let frame = &self.concrete[c.index()];
                match frame.parent {
                    Some(parent) => FramePtr::Concrete(parent),
                    None => FramePtr::Abstract(Self::of_lr1(frame.state)),
                }
            }
            FramePtr::Abstract(a) => {
                if let Some(parent) = self.abstracts[a.index()].parent {
                    return FramePtr::Abstract(parent);
                }
                let members: Vec<Lr1> = self.abstracts[a.index()].states.iter().collect();
                let mut deeper = IdxSet::empty(self.n_states);
                for state in members {
                    deeper.union_with(grammar.transitions().predecessor_states(state));
                }
                let fresh = AbsFrame::new(self.abstracts.len());
                self.abstracts.push(AbstractFrame {
                    states: deeper,
                    goto_nt: IdxSet::empty(self.n_nonterms),
                    parent: None,
                });
                self.abstracts[a.index()].parent = Some(fresh);
                FramePtr::Abstract(fresh)
            }
        }
    }

    fn alloc_concrete(&mut self, state: Lr1, parent: Option<ConcreteId>) -> ConcreteId {
        let id = ConcreteId(self.concrete.len() as u32);
        self.concrete.push(ConcreteFrame {
            state,
            parent,
            children: BTreeMap::new(),
        });
        id
    }

    fn on_path(&self, mut frame: ConcreteId, state: Lr1) -> bool {
        loop {
            let f = &self.concrete[frame.index()];
            if f.state == state {
                return true;
            }
            match f.parent {
                Some(parent) => frame = parent,
                None => return false,
            }
        }
    }

    fn build_trie(&mut self) {
        for root_state in 0..self.n_states {
            let state = Lr1::from_index(root_state);
            let root = self.roots[state];
            let mut path = vec![self.concrete[root.index()].state];
            let children: Vec<ConcreteId> =
                self.concrete[root.index()].children.values().copied().collect();
            for child in children {
                self.visit_trie(child, &mut path, state);
            }
        }
    }

    fn visit_trie(&mut self, frame: ConcreteId, path: &mut Vec<Lr1>, origin: Lr1) {
        path.push(self.concrete[frame.index()].state);
        let node = self.trie_insert(path);
        self.trie[node].goto_targets.insert(origin);
        let children: Vec<ConcreteId> =
            self.concrete[frame.index()].children.values().copied().collect();
        for child in children {
            self.visit_trie(child, path, origin);
        }
        path.pop();
    }

    fn trie_insert(&mut self, path: &[Lr1]) -> usize {
        let mut node = 0;
        for &state in path {
            node = match self.trie[node].children.get(&state) {
                Some(&child) => child,
                None => {
                    let fresh = self.trie.len();
                    self.trie.push(TrieNode {
                        children: BTreeMap::new(),
                        goto_targets: IdxSet::empty(self.n_states),
                    });
                    self.trie[node].children.insert(state, fresh);
                    fresh
                }
            };
        }
        node
    }

    fn build_goto_closure(&mut self, grammar: &Grammar) {
        let mut closures = Vec::with_capacity(self.abstracts.len());
        for frame in &self.abstracts {
            if frame.goto_nt.is_empty() {
                closures.push(Vec::new());
                continue;
            }
            let mut cells: Vec<ClosureCell> = Vec::new();
            let mut by_targets: HashMap<IdxSet<Lr1>, usize, ahash::RandomState> =
                HashMap::with_hasher(ahash::RandomState::new());
            for source in frame.states.iter() {
                let targets = self.close(grammar, source, &frame.goto_nt);
                match by_targets.entry(targets.clone()) {
                    hashbrown::hash_map::Entry::Occupied(entry) => {
                        cells[*entry.get()].sources.insert(source);
                    }
                    hashbrown::hash_map::Entry::Vacant(entry) => {
                        entry.insert(cells.len());
                        cells.push(ClosureCell {
                            sources: IdxSet::singleton(self.n_states, source),
                            targets,
                        });
                    }
                }
            }
            closures.push(cells);
        }
        self.goto_closure = closures;
    }

    /// States reachable from `source` by one or more goto steps, following
    /// the goto nonterminals of the frame and, transitively, of each
    /// reached target's own abstract root.
    fn close(&self, grammar: &Grammar, source: Lr1, goto_nt: &IdxSet<Nonterm>) -> IdxSet<Lr1> {
        let mut targets = IdxSet::empty(self.n_states);
        let mut seen = IdxSet::empty(self.n_nonterms);
        let mut pending: Vec<Nonterm> = goto_nt.iter().collect();
        for &nt in &pending {
            seen.insert(nt);
        }
        while let Some(nt) = pending.pop() {
            let Some(target) = grammar.transitions().find_goto_target(source, nt) else {
                continue;
            };
            if targets.insert(target) {
                for next in self.abstracts[target.index()].goto_nt.iter() {
                    if seen.insert(next) {
                        pending.push(next);
                    }
                }
            }
        }
        targets
    }

    fn build_reachable_goto(&mut self) {
        let n = self.abstracts.len();
        let targets_of: Vec<IdxSet<Lr1>> = (0..n)
            .map(|i| {
                let mut union = IdxSet::empty(self.n_states);
                for cell in &self.goto_closure[i] {
                    union.union_with(&cell.targets);
                }
                union
            })
            .collect();

        let mut reachable = targets_of.clone();
        loop {
            let mut changed = false;
            for i in 0..n {
                let mut grown = reachable[i].clone();
                if let Some(parent) = self.abstracts[i].parent {
                    grown.union_with(&reachable[parent.index()]);
                }
                for target in targets_of[i].iter() {
                    grown.union_with(&reachable[target.index()]);
                }
                if grown != reachable[i] {
                    reachable[i] = grown;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        self.reachable_goto = reachable;
    }

    #[must_use]
    pub fn abstract_count(&self) -> usize {
        self.abstracts.len()
    }

    #[must_use]
    pub fn abstract_frame(&self, frame: AbsFrame) -> &AbstractFrame {
        &self.abstracts[frame.index()]
    }

    /// The goto-closure partition of an abstract frame's states.
    #[must_use]
    pub fn goto_closure(&self, frame: AbsFrame) -> &[ClosureCell] {
        &self.goto_closure[frame.index()]
    }

    /// The least fixed point of goto reachability for a frame.
    #[must_use]
    pub fn reachable_goto(&self, frame: AbsFrame) -> &IdxSet<Lr1> {
        &self.reachable_goto[frame.index()]
    }

    #[must_use]
    pub fn concrete_root(&self, state: Lr1) -> ConcreteId {
        self.roots[state]
    }

    #[must_use]
    pub fn concrete_state(&self, frame: ConcreteId) -> Lr1 {
        self.concrete[frame.index()].state
    }

    /// Goto children of a concrete frame, in state order.
    #[must_use]
    pub fn concrete_children(&self, frame: ConcreteId) -> Vec<(Lr1, ConcreteId)> {
        self.concrete[frame.index()]
            .children
            .iter()
            .map(|(&s, &c)| (s, c))
            .collect()
    }

    /// All tagged derivation paths `(states, origins)`, for inspection.
    #[must_use]
    pub fn derivation_paths(&self) -> Vec<(Vec<Lr1>, Vec<Lr1>)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_paths(0, &mut path, &mut out);
        out
    }

    fn collect_paths(&self, node: usize, path: &mut Vec<Lr1>, out: &mut Vec<(Vec<Lr1>, Vec<Lr1>)>) {
        if !self.trie[node].goto_targets.is_empty() {
            out.push((path.clone(), self.trie[node].goto_targets.iter().collect()));
        }
        for (&edge, &child) in &self.trie[node].children {
            path.push(edge);
            self.collect_paths(child, path, out);
            path.pop();
        }
    }

    /// Map a derivable value over the derivation trie.
    ///
    /// `step` advances the value along one trie edge (`None` kills the
    /// branch); whenever a node is tagged with origin states, the value at
    /// that node is accumulated for each origin; `join` merges the
    /// accumulated values per origin into the result.
    pub fn derive<X, Y>(
        &self,
        root: &X,
        mut step: impl FnMut(&X, Lr1) -> Option<X>,
        mut join: impl FnMut(Vec<X>) -> Y,
    ) -> HashMap<Lr1, Y, ahash::RandomState>
    where
        X: Clone,
    {
        fn dfs<X: Clone>(
            trie: &[TrieNode],
            node: usize,
            value: &X,
            step: &mut impl FnMut(&X, Lr1) -> Option<X>,
            acc: &mut HashMap<Lr1, Vec<X>, ahash::RandomState>,
        ) {
            for origin in trie[node].goto_targets.iter() {
                acc.entry(origin).or_default().push(value.clone());
            }
            for (&edge, &child) in &trie[node].children {
                if let Some(next) = step(value, edge) {
                    dfs(trie, child, &next, step, acc);
                }
            }
        }

        let mut acc: HashMap<Lr1, Vec<X>, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());
        dfs(&self.trie, 0, root, &mut step, &mut acc);
        acc.into_iter().map(|(s, values)| (s, join(values))).collect()
    }
}
