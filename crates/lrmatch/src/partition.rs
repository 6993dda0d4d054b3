//! Partition refinement of transition labels.
//!
//! Transitions produced by derivation may carry overlapping state-set
//! labels. Before they become DFA edges the labels are refined into
//! pairwise-disjoint cells keyed by membership signature: two states land
//! in the same cell exactly when they are covered by the same set of input
//! labels. Cell order is the first-occurrence order of signatures over
//! states in index order, so the result is stable and deterministic.

use hashbrown::HashMap;

use crate::index::{IdxSet, Lr1};

/// Refine `labels` into disjoint cells.
///
/// Each returned cell carries the member states and the indices of the
/// input labels covering them. Cells are non-empty and their union equals
/// the union of the inputs.
#[must_use]
pub fn refine(labels: &[IdxSet<Lr1>], domain: usize) -> Vec<(IdxSet<Lr1>, Vec<usize>)> {
    let mut union = IdxSet::empty(domain);
    for label in labels {
        union.union_with(label);
    }

    let mut cells: Vec<(IdxSet<Lr1>, Vec<usize>)> = Vec::new();
    let mut by_signature: HashMap<Vec<u32>, usize, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());

    for state in union.iter() {
        let signature: Vec<u32> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.contains(state))
            .map(|(index, _)| index as u32)
            .collect();
        match by_signature.entry(signature) {
            hashbrown::hash_map::Entry::Occupied(entry) => {
                cells[*entry.get()].0.insert(state);
            }
            hashbrown::hash_map::Entry::Vacant(entry) => {
                let members = entry.key().iter().map(|&i| i as usize).collect();
                entry.insert(cells.len());
                cells.push((IdxSet::singleton(domain, state), members));
            }
        }
    }
    cells
}
