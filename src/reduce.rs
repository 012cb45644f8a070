//! Image and core reduction (§4.7): repeatedly ask whether `G` admits a
//! homomorphism onto a proper subgraph of itself, shrinking it until it
//! can't shrink any further.

use crate::engine::{search, Cap, MaxDepth, SearchOptions};
use crate::graph::Graph;
use crate::partial::PartialMap;

/// Attempts to find a homomorphism from `g` onto `g` minus one vertex, for
/// each `v` in `candidates` (in the given order), stopping at the first
/// success.
///
/// On success, returns the induced subgraph of `g` on the image of that
/// homomorphism — a graph with strictly fewer vertices than `g` (if `g` has
/// at least one vertex) that `g` retracts onto. Returns `None` if no
/// candidate vertex can be removed this way, i.e. `g` is already a core
/// relative to `candidates`.
pub fn find_hom_image(g: &Graph, candidates: &[usize]) -> Option<Graph> {
    for &v in candidates {
        let kept: Vec<usize> = (0..g.order()).filter(|&x| x != v).collect();
        let target = g.induced_subgraph(&kept);

        let f0 = PartialMap::new(g.order());
        let opts = SearchOptions {
            cap: Cap::Limited(1),
            max_depth: MaxDepth::Unbounded,
            only_count: false,
            sym_prefix: 0,
            retract: false,
            order: Vec::new(),
        };
        let (results, _stats) = search(g, &target, &f0, &opts, None);
        let Some(maps) = results.into_maps() else {
            continue;
        };
        let Some(map) = maps.into_iter().next() else {
            continue;
        };

        let mut image: Vec<usize> = map
            .into_iter()
            .map(|target_idx| kept[target_idx.expect("find_hom_image searches without a depth cap")])
            .collect();
        image.sort_unstable();
        image.dedup();
        return Some(g.induced_subgraph(&image));
    }
    None
}

/// Computes the core of `g` (§4.7): the unique-up-to-isomorphism subgraph
/// that `g` retracts to and that has no further nontrivial hom-image.
///
/// Complete graphs short-circuit immediately — they are always their own
/// core (a consequence of [`Graph::is_complete`]'s simple-undirected-graph
/// assumption; see that method's docs). `vertex_transitive`, if true,
/// restricts the first shrinking attempt to a single candidate vertex,
/// since in a vertex-transitive graph every vertex is equivalent for this
/// purpose.
pub fn find_core(g: &Graph, vertex_transitive: bool) -> Graph {
    if g.is_complete() {
        return g.clone();
    }

    let mut current = g.clone();
    let mut first_iteration = true;
    loop {
        let candidates: Vec<usize> = if vertex_transitive && first_iteration {
            vec![0]
        } else {
            (0..current.order()).collect()
        };
        first_iteration = false;

        match find_hom_image(&current, &candidates) {
            Some(next) => current = next,
            None => return current,
        }
    }
}

/// Finds retracts of `g`: homomorphisms `g -> g` that restrict to the
/// identity on their image (§4.4, §4.7). The identity map is always among
/// the results.
pub fn find_retracts(
    g: &Graph,
    cap: Cap,
    only_count: bool,
    max_depth: MaxDepth,
    f0: &PartialMap,
) -> crate::engine::Results {
    let opts = SearchOptions {
        cap,
        max_depth,
        only_count,
        sym_prefix: 0,
        retract: true,
        order: Vec::new(),
    };
    let (results, _stats) = search(g, g, f0, &opts, None);
    results
}
