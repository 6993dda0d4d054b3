//! # Pattern IR
//!
//! Regular expressions whose alphabet is the set of LR(1) states, plus the
//! continuation-tagged form driving the DFA construction.
//!
//! ## Overview
//!
//! - [`Re`]: a reference-counted regex node (`Set`, `Alt`, `Seq`, `Star`,
//!   `Reduce`). Every node carries a unique id assigned by [`ReBuilder`];
//!   ids order and hash nodes, so structurally shared subterms compare in
//!   O(1).
//! - [`Kre`]: a continuation-tagged expression — either `Done { clause }`
//!   (accept that clause) or `More(re, k)` (consume `re`, continue with
//!   `k`).
//! - [`KreSet`]: an ordered set of `Kre` representing their union; one
//!   `KreSet` is a DFA state's direct component and also the unit of
//!   derivation caching.
//!
//! [`KreSet::prederive`] is the single-step ε-closure: it walks every
//! member and collects accepted clauses, direct transitions on state sets,
//! and the continuations that requested a reduction. A `Reduce` node is
//! optional by construction: its continuation is also expanded in place.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use compact_str::CompactString;
use hashbrown::HashSet;

use crate::error::Pos;
use crate::index::{IdxSet, Lr1};
use crate::partition;

/// The shape of a regex node.
#[derive(Debug, Clone)]
pub enum ReDesc {
    /// Match one stack state drawn from `states`, optionally binding it.
    Set {
        states: IdxSet<Lr1>,
        capture: Option<CompactString>,
    },
    Alt(Vec<Re>),
    Seq(Vec<Re>),
    Star(Re),
    /// Close over the reduction graph at the current position.
    Reduce,
}

#[derive(Debug)]
struct ReData {
    id: u32,
    pos: Option<Pos>,
    desc: ReDesc,
}

/// A shared regex node, compared by unique id.
#[derive(Debug, Clone)]
pub struct Re(Rc<ReData>);

impl Re {
    #[must_use]
    pub fn id(&self) -> u32 {
        self.0.id
    }

    #[must_use]
    pub fn pos(&self) -> Option<Pos> {
        self.0.pos
    }

    #[must_use]
    pub fn desc(&self) -> &ReDesc {
        &self.0.desc
    }
}

impl PartialEq for Re {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Re {}

impl PartialOrd for Re {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Re {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl Hash for Re {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

/// Allocates regex nodes with unique ids.
///
/// `Seq` and `Alt` flatten nested nodes of the same kind on construction.
#[derive(Debug, Default)]
pub struct ReBuilder {
    next_id: u32,
}

impl ReBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh(&mut self, desc: ReDesc, pos: Option<Pos>) -> Re {
        let id = self.next_id;
        self.next_id += 1;
        Re(Rc::new(ReData { id, pos, desc }))
    }

    pub fn set(
        &mut self,
        states: IdxSet<Lr1>,
        capture: Option<CompactString>,
        pos: Option<Pos>,
    ) -> Re {
        self.fresh(ReDesc::Set { states, capture }, pos)
    }

    pub fn alt(&mut self, items: Vec<Re>, pos: Option<Pos>) -> Re {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item.desc() {
                ReDesc::Alt(inner) => flat.extend(inner.iter().cloned()),
                _ => flat.push(item),
            }
        }
        self.fresh(ReDesc::Alt(flat), pos)
    }

    pub fn seq(&mut self, items: Vec<Re>, pos: Option<Pos>) -> Re {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item.desc() {
                ReDesc::Seq(inner) => flat.extend(inner.iter().cloned()),
                _ => flat.push(item),
            }
        }
        self.fresh(ReDesc::Seq(flat), pos)
    }

    pub fn star(&mut self, inner: Re, pos: Option<Pos>) -> Re {
        self.fresh(ReDesc::Star(inner), pos)
    }

    pub fn reduce(&mut self, pos: Option<Pos>) -> Re {
        self.fresh(ReDesc::Reduce, pos)
    }
}

/// A continuation-tagged regular expression.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KreNode {
    /// Accept clause `clause`.
    Done { clause: usize },
    /// Consume the regex, then continue.
    More(Re, Kre),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kre(Rc<KreNode>);

impl Kre {
    #[must_use]
    pub fn done(clause: usize) -> Self {
        Self(Rc::new(KreNode::Done { clause }))
    }

    #[must_use]
    pub fn more(re: Re, cont: Kre) -> Self {
        Self(Rc::new(KreNode::More(re, cont)))
    }

    #[must_use]
    pub fn node(&self) -> &KreNode {
        &self.0
    }
}

/// An ordered set of continuations, representing their union.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KreSet(BTreeSet<Kre>);

/// Result of a single derivation step over a [`KreSet`].
#[derive(Debug, Default)]
pub struct Prederivation {
    /// Clause indices accepted at the current position, ascending.
    pub reached: Vec<usize>,
    /// Transitions on a state set to a continuation.
    pub direct: Vec<(IdxSet<Lr1>, Kre)>,
    /// Continuations that requested a reduction simulation.
    pub reduce: Vec<Kre>,
}

impl KreSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn singleton(kre: Kre) -> Self {
        Self(BTreeSet::from([kre]))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Kre> {
        self.0.iter()
    }

    pub fn insert(&mut self, kre: Kre) -> bool {
        self.0.insert(kre)
    }

    pub fn union_with(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Merge a list of sets into their union.
    #[must_use]
    pub fn merge(sets: Vec<Self>) -> Self {
        let mut out = Self::new();
        for set in sets {
            out.0.extend(set.0);
        }
        out
    }

    /// Single-step ε-closure of every member.
    #[must_use]
    pub fn prederive(&self) -> Prederivation {
        let mut visited: HashSet<Kre, ahash::RandomState> =
            HashSet::with_hasher(ahash::RandomState::new());
        let mut out = Prederivation::default();
        for kre in &self.0 {
            prederive_kre(kre, &mut visited, &mut out);
        }
        out.reached.sort_unstable();
        out.reached.dedup();
        out
    }

    /// Derivation step used while simulating reductions.
    ///
    /// Reached clauses become transitions on the full state set; reduction
    /// requests collected along the way are dropped (the simulation itself
    /// is the reduction, and the optional-skip expansion of `Reduce` is
    /// already part of the closure). Labels are refined to be disjoint and
    /// continuations merged per cell.
    #[must_use]
    pub fn derive_reduce(&self, n_states: usize) -> Vec<(IdxSet<Lr1>, Self)> {
        let pre = self.prederive();
        let mut labels: Vec<IdxSet<Lr1>> = Vec::new();
        let mut targets: Vec<Kre> = Vec::new();
        for &clause in &pre.reached {
            labels.push(IdxSet::full(n_states));
            targets.push(Kre::done(clause));
        }
        for (label, kre) in pre.direct {
            labels.push(label);
            targets.push(kre);
        }
        partition::refine(&labels, n_states)
            .into_iter()
            .map(|(label, members)| {
                let set: Self = members.into_iter().map(|i| targets[i].clone()).collect();
                (label, set)
            })
            .collect()
    }
}

impl FromIterator<Kre> for KreSet {
    fn from_iter<I: IntoIterator<Item = Kre>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn prederive_kre(
    kre: &Kre,
    visited: &mut HashSet<Kre, ahash::RandomState>,
    out: &mut Prederivation,
) {
    if !visited.insert(kre.clone()) {
        return;
    }
    match kre.node() {
        KreNode::Done { clause } => out.reached.push(*clause),
        KreNode::More(re, cont) => match re.desc() {
            ReDesc::Set { states, .. } => out.direct.push((states.clone(), cont.clone())),
            ReDesc::Alt(items) => {
                for item in items {
                    prederive_kre(&Kre::more(item.clone(), cont.clone()), visited, out);
                }
            }
            ReDesc::Seq(items) => {
                let folded = items
                    .iter()
                    .rev()
                    .fold(cont.clone(), |acc, item| Kre::more(item.clone(), acc));
                prederive_kre(&folded, visited, out);
            }
            ReDesc::Star(inner) => {
                prederive_kre(cont, visited, out);
                prederive_kre(&Kre::more(inner.clone(), kre.clone()), visited, out);
            }
            ReDesc::Reduce => {
                out.reduce.push(cont.clone());
                prederive_kre(cont, visited, out);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Idx;

    fn states(members: &[usize]) -> IdxSet<Lr1> {
        IdxSet::collect(8, members.iter().map(|&i| Lr1::from_index(i)))
    }

    #[test]
    fn test_prederive_done_reaches_clause() {
        let set = KreSet::singleton(Kre::done(3));
        let pre = set.prederive();
        assert_eq!(pre.reached, vec![3]);
        assert!(pre.direct.is_empty());
        assert!(pre.reduce.is_empty());
    }

    #[test]
    fn test_prederive_set_emits_direct_transition() {
        let mut b = ReBuilder::new();
        let atom = b.set(states(&[1, 2]), None, None);
        let set = KreSet::singleton(Kre::more(atom, Kre::done(0)));
        let pre = set.prederive();
        assert!(pre.reached.is_empty());
        assert_eq!(pre.direct.len(), 1);
        assert_eq!(pre.direct[0].0, states(&[1, 2]));
        assert_eq!(pre.direct[0].1, Kre::done(0));
    }

    #[test]
    fn test_prederive_star_skips_and_loops() {
        let mut b = ReBuilder::new();
        let atom = b.set(states(&[4]), None, None);
        let star = b.star(atom, None);
        let looped = Kre::more(star, Kre::done(0));
        let pre = KreSet::singleton(looped.clone()).prederive();
        // Skipping the star reaches the clause; entering it emits a
        // transition whose continuation is the star expression itself.
        assert_eq!(pre.reached, vec![0]);
        assert_eq!(pre.direct.len(), 1);
        assert_eq!(pre.direct[0].1, looped);
    }

    #[test]
    fn test_prederive_seq_folds_left_to_right() {
        let mut b = ReBuilder::new();
        let first = b.set(states(&[1]), None, None);
        let second = b.set(states(&[2]), None, None);
        let seq = b.seq(vec![first, second.clone()], None);
        let pre = KreSet::singleton(Kre::more(seq, Kre::done(0))).prederive();
        assert_eq!(pre.direct.len(), 1);
        assert_eq!(pre.direct[0].0, states(&[1]));
        assert_eq!(pre.direct[0].1, Kre::more(second, Kre::done(0)));
    }

    #[test]
    fn test_prederive_reduce_is_optional() {
        let mut b = ReBuilder::new();
        let reduce = b.reduce(None);
        let pre = KreSet::singleton(Kre::more(reduce, Kre::done(1))).prederive();
        assert_eq!(pre.reached, vec![1]);
        assert_eq!(pre.reduce, vec![Kre::done(1)]);
    }

    #[test]
    fn test_prederive_alt_expands_every_branch() {
        let mut b = ReBuilder::new();
        let left = b.set(states(&[1]), None, None);
        let right = b.set(states(&[2]), None, None);
        let alt = b.alt(vec![left, right], None);
        let pre = KreSet::singleton(Kre::more(alt, Kre::done(0))).prederive();
        assert_eq!(pre.direct.len(), 2);
    }

    #[test]
    fn test_builders_flatten_nested_nodes() {
        let mut b = ReBuilder::new();
        let x = b.set(states(&[1]), None, None);
        let y = b.set(states(&[2]), None, None);
        let z = b.set(states(&[3]), None, None);
        let inner = b.seq(vec![x, y], None);
        let outer = b.seq(vec![inner, z], None);
        let ReDesc::Seq(items) = outer.desc() else {
            panic!("expected a sequence");
        };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_derive_reduce_refines_overlapping_labels() {
        let mut b = ReBuilder::new();
        let wide = b.set(states(&[1, 2]), None, None);
        let narrow = b.set(states(&[2]), None, None);
        let set: KreSet = [
            Kre::more(wide, Kre::done(0)),
            Kre::more(narrow, Kre::done(1)),
        ]
        .into_iter()
        .collect();
        let transitions = set.derive_reduce(8);
        assert_eq!(transitions.len(), 2);
        // {1} keeps only clause 0's continuation, {2} merges both.
        assert_eq!(transitions[0].0, states(&[1]));
        assert_eq!(transitions[0].1.len(), 1);
        assert_eq!(transitions[1].0, states(&[2]));
        assert_eq!(transitions[1].1.len(), 2);
    }

    #[test]
    fn test_derive_reduce_drops_nested_reductions() {
        let mut b = ReBuilder::new();
        let reduce = b.reduce(None);
        let set = KreSet::singleton(Kre::more(reduce, Kre::done(0)));
        let transitions = set.derive_reduce(4);
        // Only the optional-skip acceptance survives.
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].0, IdxSet::full(4));
    }
}
