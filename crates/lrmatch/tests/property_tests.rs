//! Property-based tests for the set, refinement, and derivation layers.

#![cfg(test)]

use proptest::prelude::*;

use lrmatch::index::{Idx, IdxSet, Lr1};
use lrmatch::partition;
use lrmatch::regex::{Kre, KreSet, ReBuilder};

const DOMAIN: usize = 48;

fn arb_state_set() -> impl Strategy<Value = IdxSet<Lr1>> {
    proptest::collection::vec(0..DOMAIN, 0..12).prop_map(|members| {
        IdxSet::collect(DOMAIN, members.into_iter().map(Lr1::from_index))
    })
}

proptest! {
    #[test]
    fn prop_union_is_commutative_and_idempotent(a in arb_state_set(), b in arb_state_set()) {
        prop_assert_eq!(a.union(&b), b.union(&a));
        prop_assert_eq!(a.union(&a), a.clone());
    }

    #[test]
    fn prop_intersection_bounds_both_sides(a in arb_state_set(), b in arb_state_set()) {
        let both = a.intersection(&b);
        prop_assert!(both.is_subset(&a));
        prop_assert!(both.is_subset(&b));
        prop_assert_eq!(both.is_empty(), !a.intersects(&b));
    }

    #[test]
    fn prop_iteration_is_sorted_and_complete(a in arb_state_set()) {
        let members: Vec<usize> = a.iter().map(Idx::index).collect();
        let mut sorted = members.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(&members, &sorted);
        prop_assert_eq!(members.len(), a.len());
        for &m in &members {
            prop_assert!(a.contains(Lr1::from_index(m)));
        }
    }

    #[test]
    fn prop_refinement_partitions_the_union(
        labels in proptest::collection::vec(arb_state_set(), 0..8)
    ) {
        let cells = partition::refine(&labels, DOMAIN);

        let mut union = IdxSet::empty(DOMAIN);
        for label in &labels {
            union.union_with(label);
        }

        let mut covered = IdxSet::empty(DOMAIN);
        for (members, covering) in &cells {
            prop_assert!(!members.is_empty());
            prop_assert!(!covered.intersects(members));
            covered.union_with(members);
            // The signature is exact: a cell member belongs to precisely the
            // covering labels.
            for state in members.iter() {
                for (index, label) in labels.iter().enumerate() {
                    prop_assert_eq!(label.contains(state), covering.contains(&index));
                }
            }
        }
        prop_assert_eq!(covered, union);
    }

    #[test]
    fn prop_refinement_is_stable(
        labels in proptest::collection::vec(arb_state_set(), 0..8)
    ) {
        let first = partition::refine(&labels, DOMAIN);
        let second = partition::refine(&labels, DOMAIN);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_prederive_is_deterministic(
        sets in proptest::collection::vec(
            proptest::collection::vec(0..DOMAIN, 1..6),
            1..5
        )
    ) {
        // Build an alternation of short sequences and check two prederive
        // runs agree transition for transition.
        let build = || {
            let mut b = ReBuilder::new();
            let branches: Vec<_> = sets
                .iter()
                .map(|members| {
                    b.set(
                        IdxSet::collect(DOMAIN, members.iter().map(|&m| Lr1::from_index(m))),
                        None,
                        None,
                    )
                })
                .collect();
            let alt = b.alt(branches, None);
            KreSet::singleton(Kre::more(alt, Kre::done(0)))
        };
        let first = build().prederive();
        let second = build().prederive();
        prop_assert_eq!(first.reached, second.reached);
        prop_assert_eq!(first.direct.len(), second.direct.len());
        for ((la, ka), (lb, kb)) in first.direct.iter().zip(second.direct.iter()) {
            prop_assert_eq!(la, lb);
            prop_assert_eq!(ka, kb);
        }
    }

    #[test]
    fn prop_derive_reduce_labels_are_disjoint(
        sets in proptest::collection::vec(
            proptest::collection::vec(0..DOMAIN, 0..6),
            1..5
        )
    ) {
        let mut b = ReBuilder::new();
        let kres: KreSet = sets
            .iter()
            .enumerate()
            .map(|(clause, members)| {
                let atom = b.set(
                    IdxSet::collect(DOMAIN, members.iter().map(|&m| Lr1::from_index(m))),
                    None,
                    None,
                );
                Kre::more(atom, Kre::done(clause))
            })
            .collect();
        let transitions = kres.derive_reduce(DOMAIN);
        let mut seen = IdxSet::empty(DOMAIN);
        for (label, target) in &transitions {
            prop_assert!(!label.is_empty());
            prop_assert!(!seen.intersects(label));
            seen.union_with(label);
            prop_assert!(!target.is_empty());
        }
    }
}
