//! First-occurrence canonicalization: a coarse, sound symmetry-breaking
//! filter over a caller-chosen prefix of `V(H)`.
//!
//! This is *not* a full quotient by `Aut(H)` — it only breaks the action of
//! the subgroup of `Aut(H)` that permutes target values no map has used yet.
//! See [`filter_candidates`] for the exact rule.

use crate::graph::BitSet;
use crate::partial::PartialMap;

/// The set of `H`-vertices that already appear as the image of some
/// assigned `G`-vertex in `f`.
pub fn used_targets(n_h: usize, f: &PartialMap) -> BitSet {
    let mut used = BitSet::new(n_h);
    for (_v, u) in f.assigned_pairs() {
        used.set(u);
    }
    used
}

/// Restricts `candidates` to honor the symmetry prefix `k`: while fewer than
/// `k` distinct target values have been used so far (`used.popcount() < k`),
/// any candidate that would introduce a *new* target value is dropped
/// unless it is the smallest value not yet in `used` — the canonical next
/// target. Once `k` distinct values have been used, `candidates` passes
/// through unchanged.
///
/// Because every constrained first occurrence is forced to be the smallest
/// unused value at the time, `used.popcount()` while still below `k` is
/// exactly the count of first occurrences constrained so far — no separate
/// counter is needed.
pub fn filter_candidates(n_h: usize, k: usize, used: &BitSet, candidates: &BitSet) -> BitSet {
    if used.popcount() >= k {
        return candidates.clone();
    }

    let smallest_unused = (0..n_h).find(|&u| !used.get(u));
    let mut out = BitSet::new(candidates.capacity());
    for c in candidates.iter() {
        if used.get(c) || Some(c) == smallest_unused {
            out.set(c);
        }
    }
    out
}

/// The effective symmetry prefix for a parallel-driver job whose partial map
/// has grown from `initial_size` to `current_size` assignments: the caller's
/// `k` shrinks by exactly the number of assignments already made since the
/// top-level search started, floored at zero, so the filter always applies
/// to the same prefix of `V(H)` it would in a single-threaded run.
pub fn adjusted_prefix(k_user: usize, initial_size: usize, current_size: usize) -> usize {
    (k_user + initial_size).saturating_sub(current_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_constraint_once_k_distinct_values_used() {
        let mut used = BitSet::new(4);
        used.set(0);
        used.set(2);
        let mut candidates = BitSet::new(4);
        candidates.set(1);
        candidates.set(3);
        let filtered = filter_candidates(4, 2, &used, &candidates);
        assert_eq!(filtered, candidates);
    }

    #[test]
    fn restricts_new_targets_to_the_smallest_unused() {
        let used = BitSet::new(4); // nothing used yet
        let mut candidates = BitSet::new(4);
        candidates.set(1);
        candidates.set(2);
        candidates.set(3);
        // k=1: no value used yet, smallest unused is 0, which isn't even a candidate here,
        // so every candidate is dropped.
        let filtered = filter_candidates(4, 1, &used, &candidates);
        assert!(filtered.is_empty());

        candidates.set(0);
        let filtered = filter_candidates(4, 1, &used, &candidates);
        assert_eq!(filtered.iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn window_closes_once_k_values_are_used() {
        let mut used = BitSet::new(4);
        used.set(2);
        let mut candidates = BitSet::new(4);
        candidates.set(0);
        candidates.set(2);
        // k=1 is already satisfied by the one used value, so the window has closed:
        // candidate 0, a brand new value, passes through unconstrained.
        let filtered = filter_candidates(4, 1, &used, &candidates);
        assert_eq!(filtered.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn adjusted_prefix_shrinks_as_the_map_grows() {
        assert_eq!(adjusted_prefix(4, 0, 0), 4);
        assert_eq!(adjusted_prefix(4, 0, 3), 1);
        assert_eq!(adjusted_prefix(4, 2, 5), 1);
        assert_eq!(adjusted_prefix(4, 0, 10), 0);
    }
}
