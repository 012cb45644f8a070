//! Branching-vertex selection: both the dynamic heuristic the engine uses at
//! every search node, and the static `order_max_adjacent` helper for callers
//! who want a precomputed order (e.g. to hand an explicit order to the
//! engine, or to seed the parallel driver's depth split).

use std::cmp::Reverse;
use std::collections::HashMap;

use rand::seq::SliceRandom;

use crate::error::HomError;
use crate::graph::{BitSet, Graph};
use crate::partial::PartialMap;

/// One priority key for [`order_max_adjacent`]. Applied right-to-left over
/// `priorities` so that `priorities[0]` ends up dominant (see module docs).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    /// Most neighbors already in the frontier set.
    Within,
    /// Largest degree in `G`.
    Degree,
    /// Smallest second-shortest path to the frontier (see
    /// [`second_dist_to_set`]).
    Dist2,
    /// Uniformly random order among the tied group.
    ///
    /// The source's branching helper spells this `'ranfom'`; this crate uses
    /// the evidently intended spelling and rejects the typo as an
    /// [`HomError::InvalidOption`].
    Random,
}

impl Priority {
    /// Parses a priority name. `"ranfom"` is deliberately not accepted —
    /// see [`Priority::Random`].
    pub fn parse(name: &str) -> Result<Self, HomError> {
        match name {
            "within" => Ok(Priority::Within),
            "degree" => Ok(Priority::Degree),
            "dist2" => Ok(Priority::Dist2),
            "random" => Ok(Priority::Random),
            other => Err(HomError::InvalidOption(format!(
                "unknown branching priority {other:?}"
            ))),
        }
    }
}

/// Selects the next branching vertex for the backtracking engine: the
/// unassigned vertex of `g` with (1) the most already-assigned neighbors,
/// (2) the largest degree, (3) the smallest index, in that priority order.
///
/// Returns `None` if every vertex is assigned.
pub fn select_branch_vertex(g: &Graph, f: &PartialMap) -> Option<usize> {
    (0..g.order())
        .filter(|&v| !f.is_assigned(v))
        .max_by_key(|&v| {
            let assigned_neighbors = g
                .neighbors(v)
                .iter()
                .filter(|&w| f.is_assigned(w))
                .count();
            (assigned_neighbors, g.degree(v), Reverse(v))
        })
}

/// The length of the second-shortest path from `v` to the vertex set `w`
/// (a frontier of already-ordered vertices), used by the `dist2` priority.
///
/// - If `v` is in `w`, the distance is `0`.
/// - If `v` has no neighbor in `w`, the distance is `g.order()` (treated as
///   "infinite" within this search).
/// - If `v` has two or more neighbors in `w`, a second path of length 1
///   already exists, so the distance is `1`.
/// - Otherwise `v` has exactly one neighbor in `w`; the distance is the
///   shortest path from `v` to `w` after deleting that single edge.
///
/// The three cases above must be checked in this order: multiple neighbors
/// in `w`, or a neighbor reachable by another length-1 path, both short
/// circuit to `1` before the edge-deletion step — which assumes the
/// remaining distance is at least `2` and only holds once those cases are
/// ruled out.
pub fn second_dist_to_set(g: &Graph, v: usize, w: &BitSet) -> usize {
    if w.get(v) {
        return 0;
    }
    let neighbors_in_w: Vec<usize> = g.neighbors(v).iter().filter(|&u| w.get(u)).collect();
    if neighbors_in_w.is_empty() {
        return g.order();
    }
    if neighbors_in_w.len() >= 2 {
        return 1;
    }

    let removed = neighbors_in_w[0];
    let n = g.order();
    let mut dist = vec![usize::MAX; n];
    dist[v] = 0;
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(v);
    while let Some(cur) = queue.pop_front() {
        for nb in g.neighbors(cur).iter() {
            if (cur == v && nb == removed) || (cur == removed && nb == v) {
                continue;
            }
            if dist[nb] == usize::MAX {
                dist[nb] = dist[cur] + 1;
                queue.push_back(nb);
            }
        }
    }

    let dist2 = w
        .iter()
        .filter_map(|u| (dist[u] != usize::MAX).then_some(dist[u]))
        .min()
        .unwrap_or(n);
    assert!(
        dist2 >= 2,
        "second_dist_to_set: distance to the frontier after removing the sole connecting edge \
         should never be less than 2 once the length-0/1 cases are ruled out"
    );
    dist2
}

/// Produces a total vertex order for `g`, starting from `preordered` (kept
/// as given) and appending the remaining vertices one at a time, each time
/// picking the vertex that maximizes the given `priorities` in order.
pub fn order_max_adjacent(
    g: &Graph,
    preordered: &[usize],
    priorities: &[Priority],
) -> Vec<usize> {
    let n = g.order();
    let mut frontier = BitSet::new(n);
    for &v in preordered {
        frontier.set(v);
    }

    let mut rng = rand::rng();
    let mut result = Vec::with_capacity(n - preordered.len());

    while frontier.popcount() < n {
        let mut vs: Vec<usize> = (0..n).filter(|&v| !frontier.get(v)).collect();

        for p in priorities.iter().rev() {
            match p {
                Priority::Within => {
                    vs.sort_by_key(|&v| g.neighbors(v).intersection(&frontier).popcount());
                }
                Priority::Degree => {
                    vs.sort_by_key(|&v| g.degree(v));
                }
                Priority::Dist2 => {
                    let d2: HashMap<usize, usize> = vs
                        .iter()
                        .map(|&v| (v, second_dist_to_set(g, v, &frontier)))
                        .collect();
                    vs.sort_by_key(|&v| Reverse(d2[&v]));
                }
                Priority::Random => {
                    vs.shuffle(&mut rng);
                }
            }
        }

        let v = *vs.last().expect("frontier is not yet full, vs is nonempty");
        result.push(v);
        frontier.set(v);
    }

    result
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
    fn parse_rejects_the_typo_spelling() {
        assert!(Priority::parse("random").is_ok());
        assert!(Priority::parse("ranfom").is_err());
        assert!(Priority::parse("bogus").is_err());
    }

    #[test]
    fn select_branch_vertex_prefers_most_assigned_neighbors() {
        let c4 = c_n(4);
        let mut f = PartialMap::new(4);
        f.assign(0, 0);
        // vertices 1 and 3 both have one assigned neighbor (vertex 0); vertex 2 has none.
        // tie between 1 and 3 broken by smallest index.
        assert_eq!(select_branch_vertex(&c4, &f), Some(1));
    }

    #[test]
    fn select_branch_vertex_falls_back_to_degree_then_index() {
        let k4 = k_n(4);
        let f = PartialMap::new(4);
        // all vertices tied on assigned-neighbor count (0) and degree (3); smallest index wins.
        assert_eq!(select_branch_vertex(&k4, &f), Some(0));
    }

    #[test]
    fn order_max_adjacent_covers_every_vertex_exactly_once() {
        let c16 = c_n(16);
        let order = order_max_adjacent(&c16, &[], &[Priority::Within, Priority::Degree]);
        assert_eq!(order.len(), 16);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn order_max_adjacent_respects_preordered_prefix() {
        let c16 = c_n(16);
        let order = order_max_adjacent(&c16, &[5, 2], &[Priority::Within, Priority::Degree]);
        assert_eq!(order.len(), 14);
        assert!(!order.contains(&5));
        assert!(!order.contains(&2));
    }

    #[test]
    fn second_dist_to_set_handles_zero_one_and_general_cases() {
        let c16 = c_n(16);
        let mut w = BitSet::new(16);
        w.set(0);
        assert_eq!(second_dist_to_set(&c16, 0, &w), 0);
        // vertex 1 has a single neighbor in w (vertex 0); after deleting that edge the
        // only remaining path from 1 to 0 goes the long way around the 16-cycle.
        assert_eq!(second_dist_to_set(&c16, 1, &w), 15);
    }
}
