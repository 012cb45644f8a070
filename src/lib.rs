//! Graph-homomorphism search: a depth-first constraint-satisfaction engine
//! for finding maps `f: V(G) -> V(H)` that preserve every edge of `G`, plus
//! the derived structural algorithms built on top of it (retracts,
//! homomorphic images, cores) and a parallel driver for large searches.
//!
//! The engine itself ([`engine::search`]) works entirely in `0..n` integer
//! vertex ids; [`labels::LabeledGraph`] is the boundary where callers'
//! arbitrary hashable labels enter and leave.

pub mod candidates;
pub mod engine;
pub mod error;
pub mod fs;
pub mod graph;
pub mod heuristic;
pub mod labels;
pub mod parallel;
pub mod partial;
pub mod reduce;
pub mod stats;
pub mod symmetry;
pub mod verify;

use std::hash::Hash;

use engine::{search, Cap, MaxDepth, Results, SearchOptions};
use error::HomResult;
use graph::Graph;
use labels::LabeledGraph;
use partial::PartialMap;

/// Finds homomorphisms `G -> H`, starting from an optional partial map.
///
/// This is the crate's primary entry point (§6); `find_retracts`,
/// `find_core`, and `find_hom_image` in [`reduce`] are built from the same
/// [`engine::search`] this function calls.
#[allow(clippy::too_many_arguments)]
pub fn find_homomorphisms<L: Clone + Eq + Hash, M: Clone + Eq + Hash>(
    g: &LabeledGraph<L>,
    h: &LabeledGraph<M>,
    cap: Cap,
    only_count: bool,
    max_depth: MaxDepth,
    partmap: &[(L, M)],
) -> HomResult<Results> {
    let pairs = g.translate_partial_map(h, partmap)?;
    let f0 = PartialMap::from_pairs(g.graph().order(), &pairs);
    let opts = SearchOptions {
        cap,
        max_depth,
        only_count,
        sym_prefix: 0,
        retract: false,
        order: Vec::new(),
    };
    let (results, _stats) = search(g.graph(), h.graph(), &f0, &opts, None);
    Ok(results)
}

/// Finds retracts of `g`: see [`reduce::find_retracts`].
pub fn find_retracts<L: Clone + Eq + Hash>(
    g: &LabeledGraph<L>,
    cap: Cap,
    only_count: bool,
    max_depth: MaxDepth,
    partmap: &[(L, L)],
) -> HomResult<Results> {
    let pairs = g.translate_partial_map(g, partmap)?;
    let f0 = PartialMap::from_pairs(g.graph().order(), &pairs);
    Ok(reduce::find_retracts(g.graph(), cap, only_count, max_depth, &f0))
}

/// Computes the core of `g`: see [`reduce::find_core`].
pub fn find_core(g: &Graph, vertex_transitive: bool) -> Graph {
    reduce::find_core(g, vertex_transitive)
}

/// Finds a homomorphic image of `g`: see [`reduce::find_hom_image`].
pub fn find_hom_image(g: &Graph, candidates: &[usize]) -> Option<Graph> {
    reduce::find_hom_image(g, candidates)
}

/// Checks whether `map` is a homomorphism `g -> h`: see [`verify::is_hom`].
pub fn is_hom(g: &Graph, h: &Graph, map: &[usize]) -> bool {
    verify::is_hom(g, h, map)
}
