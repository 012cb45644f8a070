//! Per-vertex candidate sets: the arc-consistency–style pruning structure
//! that narrows `cand[v] ⊆ V(H)` as vertices of `G` are assigned.

use crate::graph::{BitSet, Graph};
use crate::partial::PartialMap;

/// `cand[v]` for every unassigned vertex `v` of `G`.
///
/// `cand[v]` is always recomputable from scratch from the current
/// [`PartialMap`]; the store only exists to make that recomputation
/// incremental. Assigned vertices have no meaningful entry (kept as an
/// unused empty bitset to keep indexing simple).
#[derive(Clone, Debug)]
pub struct CandidateStore {
    cand: Vec<BitSet>,
    n_h: usize,
}

impl CandidateStore {
    /// Builds the candidate store from scratch for the current state of
    /// `f`: every unassigned vertex starts with every `V(H)` vertex as a
    /// candidate, then is narrowed by every already-assigned neighbor.
    pub fn init(g: &Graph, h: &Graph, f: &PartialMap) -> Self {
        let n_h = h.order();
        let mut cand = vec![BitSet::full(n_h); g.order()];

        for v in 0..g.order() {
            if f.is_assigned(v) {
                continue;
            }
            for w in g.neighbors(v).iter() {
                if let Some(fw) = f.get(w) {
                    cand[v].intersect_with(h.neighbors(fw));
                }
            }
        }

        CandidateStore { cand, n_h }
    }

    /// The candidate set for vertex `v`.
    pub fn get(&self, v: usize) -> &BitSet {
        &self.cand[v]
    }

    /// `true` if some unassigned vertex among `vertices` has no candidates
    /// left — the search node reachable from this state is infeasible.
    pub fn any_empty(&self, f: &PartialMap, vertices: impl Iterator<Item = usize>) -> bool {
        vertices.filter(|&v| !f.is_assigned(v)).any(|v| self.cand[v].is_empty())
    }

    /// Narrows `cand[w]` for every unassigned neighbor `w` of `v` in `g` by
    /// intersecting with `h.neighbors(u)`, recording what changed so
    /// [`CandidateStore::undo_assign`] can restore it.
    ///
    /// Call this *after* tentatively setting `f(v) = u` in the caller's
    /// [`PartialMap`], passing that same map so already-assigned neighbors
    /// are skipped.
    pub fn assign(&mut self, g: &Graph, h: &Graph, f: &PartialMap, v: usize, u: usize) -> AssignDiff {
        let mut touched = Vec::new();
        for w in g.neighbors(v).iter() {
            if f.is_assigned(w) {
                continue;
            }
            let before = self.cand[w].clone();
            self.cand[w].intersect_with(h.neighbors(u));
            if self.cand[w] != before {
                touched.push((w, before));
            }
        }
        AssignDiff { touched }
    }

    /// Restores the candidate sets touched by the matching
    /// [`CandidateStore::assign`] call, undoing the narrowing.
    pub fn undo_assign(&mut self, diff: AssignDiff) {
        for (w, before) in diff.touched {
            self.cand[w] = before;
        }
    }

    /// Recomputes every unassigned vertex's candidate set from scratch and
    /// compares it to the currently stored value. Used by tests to check the
    /// "recomputable from `f`" invariant from the data model.
    #[cfg(test)]
    pub(crate) fn matches_recomputation(&self, g: &Graph, h: &Graph, f: &PartialMap) -> bool {
        let fresh = CandidateStore::init(g, h, f);
        (0..g.order())
            .filter(|&v| !f.is_assigned(v))
            .all(|v| fresh.cand[v] == self.cand[v])
    }

    pub(crate) fn n_h(&self) -> usize {
        self.n_h
    }
}

/// The set of per-vertex candidate changes made by one
/// [`CandidateStore::assign`] call, opaque to callers — only used to undo
/// that exact assignment.
#[derive(Debug)]
pub struct AssignDiff {
    touched: Vec<(usize, BitSet)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn k_n(n: usize) -> Graph {
        let adj: Vec<Vec<usize>> = (0..n)
            .map(|v| (0..n).filter(|&u| u != v).collect())
            .collect();
        Graph::new(&adj).unwrap()
    }

    fn c_n(n: usize) -> Graph {
        let adj: Vec<Vec<usize>> = (0..n)
            .map(|v| vec![(v + n - 1) % n, (v + 1) % n])
            .collect();
        Graph::new(&adj).unwrap()
    }

    #[test]
    fn init_with_empty_map_gives_full_candidates() {
        let k4 = k_n(4);
        let f = PartialMap::new(4);
        let store = CandidateStore::init(&k4, &k4, &f);
        for v in 0..4 {
            assert_eq!(store.get(v).popcount(), 4);
        }
    }

    #[test]
    fn assign_narrows_neighbors_and_undo_restores() {
        let c4 = c_n(4);
        let mut f = PartialMap::new(4);
        let mut store = CandidateStore::init(&c4, &c4, &f);

        f.assign(0, 0);
        let diff = store.assign(&c4, &c4, &f, 0, 0);
        // neighbors of 0 in C4 are 1 and 3; both narrowed to neighbors of 0 in C4 = {1,3}
        assert_eq!(store.get(1).iter().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(store.get(3).iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(store.matches_recomputation(&c4, &c4, &f));

        store.undo_assign(diff);
        f.unassign(0);
        assert_eq!(store.get(1).popcount(), 4);
        assert!(store.matches_recomputation(&c4, &c4, &f));
    }

    #[test]
    fn infeasible_partial_map_yields_empty_candidate() {
        // C16 with f(0)=0, f(2)=1 in K2: vertex 1 is adjacent to both 0 and 2,
        // so cand[1] must be the intersection of K2's neighbors of 0 and of 1 — empty,
        // since K2 has no self-loops and vertex 0 and vertex 1 have disjoint neighbor sets.
        let c16 = c_n(16);
        let k2 = k_n(2);
        let mut f = PartialMap::new(16);
        f.assign(0, 0);
        f.assign(2, 1);
        let store = CandidateStore::init(&c16, &k2, &f);
        assert!(store.any_empty(&f, 0..16));
    }
}
