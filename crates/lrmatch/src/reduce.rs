//! # Reduce Simulator
//!
//! Lifts a derivable value into an object that walks the reduction graph.
//!
//! ## Overview
//!
//! [`Derivable`] is the capability the DFA driver needs from a value it
//! derives: a single derivation step producing labeled successors, a merge
//! of parallel values, and a total order. The only production implementor
//! is [`KreSet`], but [`Cache`] and [`ReduceOp`] are generic so the
//! machinery can be exercised with synthetic values in tests.
//!
//! [`ReduceOp`] is built once per distinct set of requested reductions: it
//! precomputes, via [`Redgraph::derive`], the merged derivative of the
//! value along every derivation path, keyed by the origin state of the
//! path. [`Red`] instances then advance through abstract frames as the DFA
//! consumes stack states, emitting direct transitions whenever a goto
//! target has a precomputed continuation and reducible transitions while
//! deeper simulation can still reach one.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::index::{IdxSet, Lr1, Nonterm};
use crate::redgraph::Redgraph;
use crate::regex::KreSet;
use crate::Ctx;

/// A value the DFA driver can derive, merge, and order.
pub trait Derivable: Clone + Eq + Ord + Hash {
    /// One derivation step: labeled transitions to successor values.
    fn derive(&self, ctx: &Ctx) -> Vec<(IdxSet<Lr1>, Self)>;

    /// Merge parallel values into one.
    fn merge(values: Vec<Self>) -> Self;
}

impl Derivable for KreSet {
    fn derive(&self, ctx: &Ctx) -> Vec<(IdxSet<Lr1>, Self)> {
        self.derive_reduce(ctx.grammar.state_count())
    }

    fn merge(values: Vec<Self>) -> Self {
        let mut out = Self::new();
        for value in values {
            out.union_with(&value);
        }
        out
    }
}

/// Memoizes [`Derivable::derive`].
///
/// The same continuation set is derived along many reduction-graph paths;
/// entries are never evicted.
pub struct Cache<D: Derivable> {
    memo: HashMap<D, Rc<Vec<(IdxSet<Lr1>, D)>>, ahash::RandomState>,
}

impl<D: Derivable> Cache<D> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memo: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    pub fn derive(&mut self, ctx: &Ctx, value: &D) -> Rc<Vec<(IdxSet<Lr1>, D)>> {
        if let Some(hit) = self.memo.get(value) {
            return Rc::clone(hit);
        }
        let computed = Rc::new(value.derive(ctx));
        self.memo.insert(value.clone(), Rc::clone(&computed));
        computed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

impl<D: Derivable> Default for Cache<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// The reduce operator instantiated for one derivable value.
pub struct ReduceOp<D: Derivable> {
    source: D,
    continuations: HashMap<Lr1, D, ahash::RandomState>,
    domain: IdxSet<Lr1>,
}

impl<D: Derivable> ReduceOp<D> {
    /// Precompute the continuation table of `source` over the derivation
    /// trie.
    pub fn new(ctx: &Ctx, cache: &mut Cache<D>, source: D) -> Rc<Self> {
        let continuations = ctx.redgraph.derive(
            &source,
            |value, state| {
                cache
                    .derive(ctx, value)
                    .iter()
                    .find(|(label, _)| label.contains(state))
                    .map(|(_, next)| next.clone())
            },
            D::merge,
        );
        let mut domain = IdxSet::empty(ctx.grammar.state_count());
        for &state in continuations.keys() {
            domain.insert(state);
        }
        Rc::new(Self {
            source,
            continuations,
            domain,
        })
    }

    /// The value this operator was built from.
    #[must_use]
    pub fn source(&self) -> &D {
        &self.source
    }

    /// States for which a continuation exists.
    #[must_use]
    pub fn domain(&self) -> &IdxSet<Lr1> {
        &self.domain
    }

    #[must_use]
    pub fn continuation(&self, state: Lr1) -> Option<&D> {
        self.continuations.get(&state)
    }

    /// Entry transitions of the simulation.
    ///
    /// Direct: one single-state transition per continuation. Reducible: one
    /// simulator per LR(1) state from which deeper reductions can still
    /// reach the continuation domain.
    pub fn initial(op: &Rc<Self>, ctx: &Ctx) -> Transitions<D> {
        let n_states = ctx.grammar.state_count();
        let direct = op
            .domain
            .iter()
            .map(|state| {
                (
                    IdxSet::singleton(n_states, state),
                    op.continuations[&state].clone(),
                )
            })
            .collect();
        let mut reducible = Vec::new();
        for state in ctx.grammar.states() {
            let frame = Redgraph::of_lr1(state);
            if ctx.redgraph.reachable_goto(frame).intersects(&op.domain) {
                reducible.push((
                    IdxSet::singleton(n_states, state),
                    Red {
                        op: Rc::clone(op),
                        state: frame,
                    },
                ));
            }
        }
        Transitions { direct, reducible }
    }
}

/// Output of one simulation step: transitions to plain values and to
/// further simulators.
pub struct Transitions<D: Derivable> {
    pub direct: Vec<(IdxSet<Lr1>, D)>,
    pub reducible: Vec<(IdxSet<Lr1>, Red<D>)>,
}

/// A reduction simulator positioned at an abstract frame.
pub struct Red<D: Derivable> {
    op: Rc<ReduceOp<D>>,
    state: crate::index::AbsFrame,
}

impl<D: Derivable> Red<D> {
    #[must_use]
    pub fn frame(&self) -> crate::index::AbsFrame {
        self.state
    }

    #[must_use]
    pub fn op(&self) -> &Rc<ReduceOp<D>> {
        &self.op
    }

    /// Advance the simulation by one consumed stack state.
    pub fn derive(&self, ctx: &Ctx, cache: &mut Cache<D>) -> Transitions<D> {
        let n_states = ctx.grammar.state_count();
        let mut out = Transitions {
            direct: Vec::new(),
            reducible: Vec::new(),
        };
        let frame = ctx.redgraph.abstract_frame(self.state);
        if let Some(parent) = frame.parent {
            if ctx.redgraph.reachable_goto(parent).intersects(&self.op.domain) {
                out.reducible.push((
                    IdxSet::full(n_states),
                    Red {
                        op: Rc::clone(&self.op),
                        state: parent,
                    },
                ));
            }
        }
        let mut visited = IdxSet::<Nonterm>::empty(ctx.grammar.nonterminal_count());
        self.walk(ctx, cache, &frame.states, &frame.goto_nt, &mut visited, &mut out);
        out
    }

    /// Walk the frame's goto nonterminals transitively, grouping sources by
    /// goto target.
    fn walk(
        &self,
        ctx: &Ctx,
        cache: &mut Cache<D>,
        sources: &IdxSet<Lr1>,
        goto_nt: &IdxSet<Nonterm>,
        visited: &mut IdxSet<Nonterm>,
        out: &mut Transitions<D>,
    ) {
        let n_states = ctx.grammar.state_count();
        for nt in goto_nt.iter() {
            if !visited.insert(nt) {
                continue;
            }
            let mut by_target: BTreeMap<Lr1, IdxSet<Lr1>> = BTreeMap::new();
            for source in sources.iter() {
                if let Some(target) = ctx.grammar.transitions().find_goto_target(source, nt) {
                    by_target
                        .entry(target)
                        .or_insert_with(|| IdxSet::empty(n_states))
                        .insert(source);
                }
            }
            for (target, srcs) in by_target {
                if let Some(cont) = self.op.continuation(target) {
                    let cont = cont.clone();
                    for (label, value) in cache.derive(ctx, &cont).iter() {
                        let restricted = label.intersection(&srcs);
                        if !restricted.is_empty() {
                            out.direct.push((restricted, value.clone()));
                        }
                    }
                }
                let target_frame = Redgraph::of_lr1(target);
                if ctx
                    .redgraph
                    .reachable_goto(target_frame)
                    .intersects(&self.op.domain)
                {
                    out.reducible.push((
                        srcs.clone(),
                        Red {
                            op: Rc::clone(&self.op),
                            state: target_frame,
                        },
                    ));
                }
                let next = ctx.redgraph.abstract_frame(target_frame);
                self.walk(ctx, cache, &srcs, &next.goto_nt, visited, out);
            }
        }
    }
}

impl<D: Derivable> Clone for Red<D> {
    fn clone(&self) -> Self {
        Self {
            op: Rc::clone(&self.op),
            state: self.state,
        }
    }
}

impl<D: Derivable> PartialEq for Red<D> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.op.source == other.op.source
    }
}

impl<D: Derivable> Eq for Red<D> {}

impl<D: Derivable> PartialOrd for Red<D> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: Derivable> Ord for Red<D> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.state
            .cmp(&other.state)
            .then_with(|| self.op.source.cmp(&other.op.source))
    }
}

impl<D: Derivable> Hash for Red<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
        self.op.source.hash(state);
    }
}

impl<D: Derivable> std::fmt::Debug for Red<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Red").field("state", &self.state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::{Kre, ReBuilder};
    use crate::testing;

    #[test]
    fn test_cache_returns_identical_transitions() {
        let ctx = Ctx::new(testing::epsilon_grammar());
        let mut cache = Cache::new();
        let mut b = ReBuilder::new();
        let any = b.set(IdxSet::full(ctx.grammar.state_count()), None, None);
        let set = KreSet::singleton(Kre::more(any, Kre::done(0)));

        let first = cache.derive(&ctx, &set);
        let second = cache.derive(&ctx, &set);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_initial_derivations_domain_matches_trie_origins() {
        let ctx = Ctx::new(testing::epsilon_grammar());
        let mut cache = Cache::new();
        let mut b = ReBuilder::new();
        let any = b.set(IdxSet::full(ctx.grammar.state_count()), None, None);
        let wild = b.star(any, None);
        let source = KreSet::singleton(Kre::more(wild, Kre::done(0)));

        let op = ReduceOp::new(&ctx, &mut cache, source);
        let origins: Vec<Lr1> = ctx
            .redgraph
            .derivation_paths()
            .iter()
            .flat_map(|(_, origins)| origins.iter().copied())
            .collect();
        for origin in &origins {
            assert!(op.domain().contains(*origin));
        }
        assert_eq!(op.domain().len(), 1);
        assert_eq!(op.domain().iter().next(), Some(Lr1::new(0)));
    }

    #[test]
    fn test_initial_emits_single_state_transitions() {
        let ctx = Ctx::new(testing::epsilon_grammar());
        let mut cache = Cache::new();
        let mut b = ReBuilder::new();
        let any = b.set(IdxSet::full(ctx.grammar.state_count()), None, None);
        let wild = b.star(any, None);
        let source = KreSet::singleton(Kre::more(wild, Kre::done(0)));

        let op = ReduceOp::new(&ctx, &mut cache, source);
        let transitions = ReduceOp::initial(&op, &ctx);
        for (label, _) in &transitions.direct {
            assert_eq!(label.len(), 1);
        }
        assert_eq!(transitions.direct.len(), op.domain().len());
    }

    #[test]
    fn test_red_ordering_is_by_frame_then_source() {
        let ctx = Ctx::new(testing::epsilon_grammar());
        let mut cache = Cache::new();
        let source = KreSet::singleton(Kre::done(0));
        let op = ReduceOp::new(&ctx, &mut cache, source);

        let shallow = Red {
            op: Rc::clone(&op),
            state: Redgraph::of_lr1(Lr1::new(0)),
        };
        let deep = Red {
            op,
            state: Redgraph::of_lr1(Lr1::new(1)),
        };
        assert!(shallow < deep);
        assert_eq!(shallow, shallow.clone());
    }
}
