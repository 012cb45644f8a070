//! Raw homomorphism verification, independent of the search engine (§4.9).

use crate::graph::Graph;

/// `true` iff `map` (a total function `V(G) -> V(H)`, `map[v]` the image of
/// `v`) preserves every edge of `g`: for every edge `(v, w)` of `g`,
/// `(map[v], map[w])` must be an edge of `h`.
///
/// `map.len()` must equal `g.order()`; every entry must be a valid index
/// into `h`. This is a direct re-check, not an optimized one — it exists so
/// a caller can validate a map obtained from any source, not just this
/// crate's own search.
pub fn is_hom(g: &Graph, h: &Graph, map: &[usize]) -> bool {
    if map.len() != g.order() {
        return false;
    }
    if map.iter().any(|&u| u >= h.order()) {
        return false;
    }
    (0..g.order()).all(|v| {
        g.neighbors(v)
            .iter()
            .all(|w| h.has_edge(map[v], map[w]))
    })
}
