//! # DFA Construction
//!
//! Worklist construction of the recognizer from clause continuations.
//!
//! ## Overview
//!
//! A DFA state pairs the direct continuations ([`KreSet`]) with the set of
//! reduction simulators running in parallel ([`Red`]). Deriving a state:
//!
//! 1. runs the ε-closure over the direct component, collecting accepted
//!    clauses, direct transitions, and newly requested reductions;
//! 2. instantiates (or looks up) the reduce operator for the requested
//!    continuation set and lifts its entry transitions;
//! 3. advances every running simulator by one step;
//! 4. partition-refines all collected transitions so labels are pairwise
//!    disjoint, merging destinations componentwise within each cell.
//!
//! Accepted clause sets are kept in full; the selected action is the
//! smallest clause index (priority is source order).

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::index::{IdxSet, Lr1};
use crate::partition;
use crate::reduce::{Cache, Red, ReduceOp, Transitions};
use crate::regex::{Kre, KreSet};
use crate::Ctx;

/// A DFA state: direct continuations plus parallel reduction simulators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct St {
    pub direct: KreSet,
    pub reduce: BTreeSet<Red<KreSet>>,
}

impl St {
    #[must_use]
    pub fn initial(clauses: &[Kre]) -> Self {
        Self {
            direct: clauses.iter().cloned().collect(),
            reduce: BTreeSet::new(),
        }
    }

    fn lift_direct(value: KreSet) -> Self {
        Self {
            direct: value,
            reduce: BTreeSet::new(),
        }
    }

    fn lift_red(red: Red<KreSet>) -> Self {
        Self {
            direct: KreSet::new(),
            reduce: BTreeSet::from([red]),
        }
    }
}

/// A constructed DFA state.
#[derive(Debug, Clone)]
pub struct DfaState {
    /// All clauses accepted here, ascending.
    pub accepts: Vec<usize>,
    /// The winning clause: the smallest accepted index.
    pub selected: Option<usize>,
    /// Disjointly labeled edges.
    pub transitions: Vec<(IdxSet<Lr1>, usize)>,
}

/// The recognizer automaton. State 0 is the initial state.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub states: Vec<DfaState>,
}

impl Dfa {
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Follow the edge labeled with `state`, if any.
    #[must_use]
    pub fn step(&self, from: usize, state: Lr1) -> Option<usize> {
        self.states[from]
            .transitions
            .iter()
            .find(|(label, _)| label.contains(state))
            .map(|&(_, target)| target)
    }
}

/// Worklist DFA builder with the reduction-derivative caches.
pub struct DfaBuilder<'ctx> {
    ctx: &'ctx Ctx,
    cache: Cache<KreSet>,
    reduction_cache: HashMap<KreSet, Vec<(IdxSet<Lr1>, St)>, ahash::RandomState>,
}

impl<'ctx> DfaBuilder<'ctx> {
    #[must_use]
    pub fn new(ctx: &'ctx Ctx) -> Self {
        Self {
            ctx,
            cache: Cache::new(),
            reduction_cache: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Build the DFA from the clause continuations, in clause order.
    #[must_use]
    pub fn build(mut self, clauses: &[Kre]) -> Dfa {
        let initial = St::initial(clauses);
        let mut index: HashMap<St, usize, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());
        let mut pending: Vec<St> = vec![initial.clone()];
        index.insert(initial, 0);
        let mut states: Vec<DfaState> = Vec::new();

        let mut cursor = 0;
        while cursor < pending.len() {
            let st = pending[cursor].clone();
            cursor += 1;

            let (accepts, raw_transitions) = self.derive(&st);
            let transitions = raw_transitions
                .into_iter()
                .map(|(label, target)| {
                    let next_id = pending.len();
                    let id = *index.entry(target.clone()).or_insert_with(|| {
                        pending.push(target);
                        next_id
                    });
                    (label, id)
                })
                .collect();
            states.push(DfaState {
                selected: accepts.first().copied(),
                accepts,
                transitions,
            });
        }

        Dfa { states }
    }

    /// One derivation step of a combined state.
    fn derive(&mut self, st: &St) -> (Vec<usize>, Vec<(IdxSet<Lr1>, St)>) {
        let n_states = self.ctx.grammar.state_count();
        let pre = st.direct.prederive();

        let mut labels: Vec<IdxSet<Lr1>> = Vec::new();
        let mut targets: Vec<St> = Vec::new();
        for (label, kre) in pre.direct {
            labels.push(label);
            targets.push(St::lift_direct(KreSet::singleton(kre)));
        }

        if !pre.reduce.is_empty() {
            let request: KreSet = pre.reduce.iter().cloned().collect();
            for (label, target) in self.reduction_transitions(request) {
                labels.push(label);
                targets.push(target);
            }
        }

        for red in &st.reduce {
            let stepped = red.derive(self.ctx, &mut self.cache);
            for (label, target) in lift(stepped) {
                labels.push(label);
                targets.push(target);
            }
        }

        let transitions = partition::refine(&labels, n_states)
            .into_iter()
            .map(|(label, members)| {
                let mut merged = St {
                    direct: KreSet::new(),
                    reduce: BTreeSet::new(),
                };
                for i in members {
                    merged.direct.union_with(&targets[i].direct);
                    merged.reduce.extend(targets[i].reduce.iter().cloned());
                }
                (label, merged)
            })
            .collect();

        (pre.reached, transitions)
    }

    /// Entry transitions for a set of requested reductions, memoized by the
    /// continuation set.
    fn reduction_transitions(&mut self, request: KreSet) -> Vec<(IdxSet<Lr1>, St)> {
        if let Some(hit) = self.reduction_cache.get(&request) {
            return hit.clone();
        }
        let op = ReduceOp::new(self.ctx, &mut self.cache, request.clone());
        let lifted = lift(ReduceOp::initial(&op, self.ctx));
        self.reduction_cache.insert(request, lifted.clone());
        lifted
    }
}

fn lift(transitions: Transitions<KreSet>) -> Vec<(IdxSet<Lr1>, St)> {
    let mut out = Vec::with_capacity(transitions.direct.len() + transitions.reducible.len());
    for (label, value) in transitions.direct {
        out.push((label, St::lift_direct(value)));
    }
    for (label, red) in transitions.reducible {
        out.push((label, St::lift_red(red)));
    }
    out
}

/// Build the recognizer for the given clause continuations.
#[must_use]
pub fn build_dfa(ctx: &Ctx, clauses: &[Kre]) -> Dfa {
    DfaBuilder::new(ctx).build(clauses)
}
