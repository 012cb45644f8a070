//! The partial map `f: V(G) -> V(H) ∪ {⊥}` and the adjacency checker that
//! decides whether a tentative assignment preserves edges (and, in retract
//! mode, the fixed-point constraint).

use crate::graph::Graph;

const UNASSIGNED: usize = usize::MAX;

/// A partial function from `V(G)` to `V(H)`, represented as an array of
/// `usize` with a sentinel for "unassigned".
#[derive(Clone, Debug)]
pub struct PartialMap {
    f: Vec<usize>,
    assigned_count: usize,
}

impl PartialMap {
    /// A fully-unassigned map over `n` source vertices.
    pub fn new(n: usize) -> Self {
        PartialMap {
            f: vec![UNASSIGNED; n],
            assigned_count: 0,
        }
    }

    /// Builds a partial map from explicit `(v, u)` assignments.
    pub fn from_pairs(n: usize, pairs: &[(usize, usize)]) -> Self {
        let mut m = PartialMap::new(n);
        for &(v, u) in pairs {
            m.assign(v, u);
        }
        m
    }

    /// Rebuilds a [`PartialMap`] from a [`PartialMap::snapshot`] — used by
    /// the parallel driver to turn one stage's emitted maps back into the
    /// next stage's starting points.
    pub fn from_snapshot(snapshot: &[Option<usize>]) -> Self {
        let mut m = PartialMap::new(snapshot.len());
        for (v, u) in snapshot.iter().enumerate() {
            if let &Some(u) = u {
                m.assign(v, u);
            }
        }
        m
    }

    /// Number of source vertices (assigned or not).
    pub fn domain_size(&self) -> usize {
        self.f.len()
    }

    /// Number of vertices currently assigned.
    pub fn assigned_count(&self) -> usize {
        self.assigned_count
    }

    /// `true` if every vertex is assigned.
    pub fn is_total(&self) -> bool {
        self.assigned_count == self.f.len()
    }

    /// `true` if `v` currently has an assignment.
    pub fn is_assigned(&self, v: usize) -> bool {
        self.f[v] != UNASSIGNED
    }

    /// The current assignment for `v`, if any.
    pub fn get(&self, v: usize) -> Option<usize> {
        (self.f[v] != UNASSIGNED).then_some(self.f[v])
    }

    /// Sets `f(v) = u`. `v` must currently be unassigned.
    pub fn assign(&mut self, v: usize, u: usize) {
        debug_assert!(!self.is_assigned(v), "vertex {v} is already assigned");
        self.f[v] = u;
        self.assigned_count += 1;
    }

    /// Clears the assignment for `v`. `v` must currently be assigned.
    pub fn unassign(&mut self, v: usize) {
        debug_assert!(self.is_assigned(v), "vertex {v} is not assigned");
        self.f[v] = UNASSIGNED;
        self.assigned_count -= 1;
    }

    /// A snapshot of the map as `Some(u)` / `None` per vertex, in index
    /// order — the form handed back to callers as a finished or partial
    /// result.
    pub fn snapshot(&self) -> Vec<Option<usize>> {
        self.f
            .iter()
            .map(|&u| (u != UNASSIGNED).then_some(u))
            .collect()
    }

    /// The assigned vertices in ascending index order, each paired with its
    /// image.
    pub fn assigned_pairs(&self) -> Vec<(usize, usize)> {
        self.f
            .iter()
            .enumerate()
            .filter_map(|(v, &u)| (u != UNASSIGNED).then_some((v, u)))
            .collect()
    }
}

/// Checks whether tentatively setting `f(v) = u` preserves every edge to an
/// already-assigned neighbor of `v` in `g`, and — in retract mode — the
/// fixed-point constraint in both directions: that `u` equals `v` whenever
/// `v` is a designated fixed point, and that `u`, if already assigned
/// elsewhere in `f`, is already mapped to itself.
///
/// The second check matters regardless of branching order: setting
/// `f(v) = u` puts `u` in the image, so `u` must satisfy `f(u) = u`. If `u`
/// was assigned earlier in the search — before anything pointed at it — the
/// forward check never saw it, so it has to be re-checked here against
/// whatever `u` was already assigned to.
///
/// `fixed` is `None` outside retract mode. In retract mode it is the set of
/// vertices required to map to themselves (the designated subset whose
/// image defines the retract).
pub fn check_assignment(
    g: &Graph,
    h: &Graph,
    f: &PartialMap,
    v: usize,
    u: usize,
    fixed: Option<&[bool]>,
) -> bool {
    if let Some(fixed) = fixed {
        if fixed[v] && u != v {
            return false;
        }
        if let Some(existing) = f.get(u)
            && existing != u
        {
            return false;
        }
    }

    g.neighbors(v)
        .iter()
        .filter_map(|w| f.get(w).map(|fw| (w, fw)))
        .all(|(_w, fw)| h.has_edge(u, fw))
}
