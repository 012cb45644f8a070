//! The backtracking search engine: depth-first homomorphism enumeration
//! over an explicit stack of frames, bounded by a result cap, an optional
//! depth budget, and an optional symmetry prefix.
//!
//! The search is written iteratively rather than recursively so its stack
//! depth is bounded by `|V(G)|` regardless of the host thread's stack size
//! (see the design notes on explicit-stack search).

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::candidates::{AssignDiff, CandidateStore};
use crate::graph::Graph;
use crate::heuristic::select_branch_vertex;
use crate::partial::{check_assignment, PartialMap};
use crate::stats::SearchStats;
use crate::symmetry::{filter_candidates, used_targets};

/// The caller-supplied bound on the number of results, or the distinguished
/// "no bound" sentinel.
///
/// The source's `limit=0` is ambiguous between "unlimited" and "nothing";
/// this crate resolves the ambiguity with an explicit enum instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cap {
    /// No limit on the number of results.
    Unlimited,
    /// Stop once this many results have been found.
    Limited(usize),
}

impl Cap {
    fn reached(&self, count: usize) -> bool {
        match self {
            Cap::Unlimited => false,
            Cap::Limited(n) => count >= *n,
        }
    }
}

/// How far past the initial partial map the engine should search before
/// emitting the current (possibly partial) assignment as a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxDepth {
    /// Search until every vertex is assigned.
    Unbounded,
    /// Stop after exactly this many further assignments beyond the initial
    /// partial map.
    Bounded(usize),
}

/// One full configuration for a [`search`] call.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    pub cap: Cap,
    pub max_depth: MaxDepth,
    pub only_count: bool,
    pub sym_prefix: usize,
    pub retract: bool,
    /// A caller-supplied explicit branching order (§4.3). When non-empty,
    /// branching follows this order (skipping vertices it doesn't mention
    /// is not supported — every unassigned vertex of `f0` must appear in
    /// it) instead of the dynamic heuristic.
    pub order: Vec<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            cap: Cap::Unlimited,
            max_depth: MaxDepth::Unbounded,
            only_count: false,
            sym_prefix: 0,
            retract: false,
            order: Vec::new(),
        }
    }
}

/// The outcome of a [`search`] call.
#[derive(Clone, Debug)]
pub enum Results {
    /// The number of maps found, already capped.
    Count(usize),
    /// The maps themselves, each a snapshot of a [`PartialMap`] (`None` for
    /// vertices left unassigned by a `max_depth` cutoff).
    Maps(Vec<Vec<Option<usize>>>),
}

impl Results {
    /// The number of results, regardless of which variant this is.
    pub fn len(&self) -> usize {
        match self {
            Results::Count(n) => *n,
            Results::Maps(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The list of maps, if this is the listing variant.
    pub fn into_maps(self) -> Option<Vec<Vec<Option<usize>>>> {
        match self {
            Results::Maps(v) => Some(v),
            Results::Count(_) => None,
        }
    }
}

/// Per-vertex "is this vertex required to map to itself" flags used by the
/// retract fixed-point constraint (§4.4), derived dynamically from how many
/// currently-assigned vertices map to each value — no statically precomputed
/// subset is needed.
///
/// `fixed_mask` only covers the forward direction: it tells
/// [`check_assignment`] whether the vertex it's about to assign is already
/// required to be fixed. It says nothing about a vertex assigned *earlier*
/// that only now becomes a target — [`check_assignment`]'s own
/// already-assigned-target check covers that side.
struct RetractState {
    image_count: Vec<usize>,
}

impl RetractState {
    fn new(n: usize) -> Self {
        RetractState {
            image_count: vec![0; n],
        }
    }

    fn assign(&mut self, u: usize) {
        self.image_count[u] += 1;
    }

    fn unassign(&mut self, u: usize) {
        self.image_count[u] -= 1;
    }

    fn fixed_mask(&self) -> Vec<bool> {
        self.image_count.iter().map(|&c| c > 0).collect()
    }
}

/// One level of the explicit search stack: the vertex branched on here, the
/// candidates left to try, and — once one has been tentatively assigned —
/// what it was and how to undo it.
struct Frame {
    v: usize,
    remaining: std::vec::IntoIter<usize>,
    assigned_u: Option<usize>,
    diff: Option<AssignDiff>,
}

/// Runs the backtracking homomorphism search described in §4.5.
///
/// `g` is the source graph, `h` the target (equal to `g`, by reference, in
/// retract mode). `f0` is the initial partial map (possibly empty) — its
/// domain size must match `g.order()`. `cancel`, if given, is polled between
/// search nodes so a long-running search can be cooperatively stopped (used
/// by the parallel driver).
pub fn search(
    g: &Graph,
    h: &Graph,
    f0: &PartialMap,
    opts: &SearchOptions,
    cancel: Option<&AtomicBool>,
) -> (Results, SearchStats) {
    let mut stats = SearchStats::new();
    let mut f = f0.clone();
    let mut cand = CandidateStore::init(g, h, &f);

    let mut retract_state = opts.retract.then(|| {
        let mut rs = RetractState::new(g.order());
        for (_v, u) in f.assigned_pairs() {
            rs.assign(u);
        }
        rs
    });

    let mut results: Vec<Vec<Option<usize>>> = Vec::new();
    let mut count = 0usize;

    if cand.any_empty(&f, 0..g.order()) {
        return finish(opts, results, count);
    }

    let depth_target = match opts.max_depth {
        MaxDepth::Unbounded => usize::MAX,
        MaxDepth::Bounded(d) => f0.assigned_count().saturating_add(d),
    };

    let next_vertex = |f: &PartialMap| -> Option<usize> {
        if opts.order.is_empty() {
            select_branch_vertex(g, f)
        } else {
            opts.order.iter().copied().find(|&v| !f.is_assigned(v))
        }
    };

    let mut stack: Vec<Frame> = Vec::new();

    'outer: loop {
        if let Some(c) = cancel
            && c.load(Ordering::Relaxed)
        {
            break;
        }

        let at_leaf = f.is_total() || f.assigned_count() >= depth_target;
        if at_leaf {
            emit(&f, opts, &mut results, &mut count);
            if opts.cap.reached(count) {
                stats.mark_cap_reached();
                break;
            }
            if !retreat(&mut stack, &mut f, &mut cand, g, h, &mut retract_state, opts, &mut stats) {
                break;
            }
            continue;
        }

        let Some(v) = next_vertex(&f) else {
            // Total w.r.t. the given order but not every vertex (shouldn't
            // happen given the order contract, but fall through safely).
            emit(&f, opts, &mut results, &mut count);
            if opts.cap.reached(count) {
                stats.mark_cap_reached();
                break;
            }
            if !retreat(&mut stack, &mut f, &mut cand, g, h, &mut retract_state, opts, &mut stats) {
                break;
            }
            continue;
        };

        stats.bump_nodes_expanded();
        let used = used_targets(h.order(), &f);
        let candidates = filter_candidates(h.order(), opts.sym_prefix, &used, cand.get(v));
        let mut frame = Frame {
            v,
            remaining: candidates.iter().collect::<Vec<_>>().into_iter(),
            assigned_u: None,
            diff: None,
        };

        if try_assign(&mut frame, g, h, &mut f, &mut cand, &mut retract_state, &mut stats) {
            stack.push(frame);
            continue;
        }

        // No candidate at all worked for v: back off to the previous frame.
        if !retreat(&mut stack, &mut f, &mut cand, g, h, &mut retract_state, opts, &mut stats) {
            break 'outer;
        }
    }

    finish(opts, results, count)
}

/// Tries candidates from `frame.remaining` in order until one passes
/// [`check_assignment`] and doesn't starve any candidate set, committing it
/// to `f` and `cand`. Returns `false` if none work, leaving `f` and `cand`
/// untouched.
fn try_assign(
    frame: &mut Frame,
    g: &Graph,
    h: &Graph,
    f: &mut PartialMap,
    cand: &mut CandidateStore,
    retract_state: &mut Option<RetractState>,
    stats: &mut SearchStats,
) -> bool {
    let v = frame.v;
    for u in frame.remaining.by_ref() {
        stats.bump_branches_taken();
        let fixed = retract_state.as_ref().map(|rs| rs.fixed_mask());
        if !check_assignment(g, h, f, v, u, fixed.as_deref()) {
            continue;
        }
        f.assign(v, u);
        let diff = cand.assign(g, h, f, v, u);
        if cand.any_empty(f, g.neighbors(v).iter()) {
            cand.undo_assign(diff);
            f.unassign(v);
            continue;
        }
        if let Some(rs) = retract_state {
            rs.assign(u);
        }
        frame.assigned_u = Some(u);
        frame.diff = Some(diff);
        return true;
    }
    false
}

/// Undoes the top frame's current assignment (if any) and tries its next
/// candidate; pops and repeats on exhausted frames. Returns `false` once the
/// stack is empty — the whole search tree has been explored.
#[allow(clippy::too_many_arguments)]
fn retreat(
    stack: &mut Vec<Frame>,
    f: &mut PartialMap,
    cand: &mut CandidateStore,
    g: &Graph,
    h: &Graph,
    retract_state: &mut Option<RetractState>,
    opts: &SearchOptions,
    stats: &mut SearchStats,
) -> bool {
    let _ = opts;
    while let Some(frame) = stack.last_mut() {
        if let Some(u) = frame.assigned_u.take() {
            cand.undo_assign(frame.diff.take().expect("assigned_u implies diff"));
            f.unassign(frame.v);
            if let Some(rs) = retract_state {
                rs.unassign(u);
            }
            stats.bump_backtracks();
            trace!(v = frame.v, "undid assignment, trying next candidate");
        }
        if try_assign(frame, g, h, f, cand, retract_state, stats) {
            return true;
        }
        stack.pop();
    }
    false
}

fn emit(
    f: &PartialMap,
    opts: &SearchOptions,
    results: &mut Vec<Vec<Option<usize>>>,
    count: &mut usize,
) {
    *count += 1;
    if !opts.only_count {
        results.push(f.snapshot());
    }
}

fn finish(opts: &SearchOptions, results: Vec<Vec<Option<usize>>>, count: usize) -> Results {
    if opts.only_count {
        Results::Count(count)
    } else {
        Results::Maps(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn k4_to_k4_has_twenty_four_homomorphisms() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let opts = SearchOptions {
            only_count: true,
            ..Default::default()
        };
        let (results, _stats) = search(&k4, &k4, &f0, &opts, None);
        assert_eq!(results.len(), 24);
    }

    #[test]
    fn c16_to_k2_is_bipartite_so_two_homomorphisms() {
        let c16 = c_n(16);
        let k2 = k_n(2);
        let f0 = PartialMap::new(16);
        let opts = SearchOptions {
            only_count: true,
            ..Default::default()
        };
        let (results, _stats) = search(&c16, &k2, &f0, &opts, None);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn c16_to_k2_with_infeasible_partial_map_has_no_homomorphisms() {
        let c16 = c_n(16);
        let k2 = k_n(2);
        // f(0) = 0 and f(2) = 1 force vertex 1 to be adjacent to both images
        // in K2, which has no such vertex.
        let f0 = PartialMap::from_pairs(16, &[(0, 0), (2, 1)]);
        let opts = SearchOptions {
            only_count: true,
            ..Default::default()
        };
        let (results, _stats) = search(&c16, &k2, &f0, &opts, None);
        assert_eq!(results.len(), 0);
    }

    #[test]
    fn cap_stops_search_early_and_marks_stats() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let opts = SearchOptions {
            only_count: true,
            cap: Cap::Limited(5),
            ..Default::default()
        };
        let (results, stats) = search(&k4, &k4, &f0, &opts, None);
        assert_eq!(results.len(), 5);
        assert!(stats.cap_reached());
    }

    #[test]
    fn retract_mode_on_k4_only_finds_the_identity() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let opts = SearchOptions {
            retract: true,
            ..Default::default()
        };
        let (results, _stats) = search(&k4, &k4, &f0, &opts, None);
        let maps = results.into_maps().unwrap();
        assert_eq!(maps.len(), 1);
        assert_eq!(
            maps[0],
            vec![Some(0), Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn symmetry_prefix_collapses_automorphic_k4_maps() {
        let k4 = k_n(4);
        let f0 = PartialMap::new(4);
        let full = SearchOptions {
            only_count: true,
            ..Default::default()
        };
        let (full_results, _) = search(&k4, &k4, &f0, &full, None);
        assert_eq!(full_results.len(), 24);

        for (k, expected) in [(1usize, 6usize), (2, 2), (3, 1), (4, 1)] {
            let opts = SearchOptions {
                only_count: true,
                sym_prefix: k,
                ..Default::default()
            };
            let (results, _stats) = search(&k4, &k4, &f0, &opts, None);
            assert_eq!(results.len(), expected, "sym_prefix {k}");
        }
    }

    #[test]
    fn retracts_of_an_isolated_vertex_plus_a_4_cycle_are_all_idempotent() {
        // Vertex 0 is isolated; 1-2-3-4-1 is a 4-cycle. Vertex 0 has no
        // neighbors, so check_assignment's edge check never constrains it —
        // only the retract fixed-point check can stop it from landing on an
        // already-assigned vertex of the cycle that maps elsewhere.
        let g = Graph::new(&[vec![], vec![2, 4], vec![1, 3], vec![2, 4], vec![1, 3]]).unwrap();
        let f0 = PartialMap::new(5);
        let opts = SearchOptions {
            retract: true,
            ..Default::default()
        };
        let (results, _stats) = search(&g, &g, &f0, &opts, None);
        let maps = results.into_maps().unwrap();
        assert!(!maps.is_empty());
        for map in &maps {
            for v in 0..5 {
                let fv = map[v].expect("retract mode always returns total maps");
                let ffv = map[fv].expect("retract mode always returns total maps");
                assert_eq!(ffv, fv, "f(f({v})) != f({v}) in {map:?}: not a valid retract");
            }
        }
    }

    #[test]
    fn explicit_order_is_honored() {
        let c16 = c_n(16);
        let k2 = k_n(2);
        let f0 = PartialMap::new(16);
        let opts = SearchOptions {
            only_count: true,
            order: (0..16).rev().collect(),
            ..Default::default()
        };
        let (results, _stats) = search(&c16, &k2, &f0, &opts, None);
        assert_eq!(results.len(), 2);
    }
}
