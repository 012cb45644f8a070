//! Translation between caller-supplied hashable vertex labels and the
//! engine's internal `0..n` integer ids.
//!
//! The core engine only ever sees [`crate::graph::Graph`] and plain
//! `usize` indices. This module is the sole place where arbitrary labels
//! enter and leave the crate.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::HomError;
use crate::graph::Graph;

/// A graph together with the bidirectional mapping from caller labels to the
/// `0..n` vertex ids used internally.
#[derive(Clone, Debug)]
pub struct LabeledGraph<L: Clone + Eq + Hash> {
    graph: Graph,
    index_of: HashMap<L, usize>,
    label_of: Vec<L>,
}

impl<L: Clone + Eq + Hash> LabeledGraph<L> {
    /// Builds a graph from an adjacency list keyed by arbitrary labels.
    ///
    /// Vertices are numbered in the order their labels first appear among
    /// the map's keys, sorted for determinism is not required — insertion
    /// order of `adjacency` is preserved.
    ///
    /// # Errors
    /// Returns [`HomError::MalformedGraph`] if an adjacency entry references
    /// a label that is not a key of `adjacency`, or if the usual [`Graph`]
    /// invariants (no self-loops, symmetric edges) are violated.
    pub fn new(adjacency: &[(L, Vec<L>)]) -> Result<Self, HomError> {
        let mut index_of = HashMap::with_capacity(adjacency.len());
        let mut label_of = Vec::with_capacity(adjacency.len());
        for (label, _) in adjacency {
            if index_of.contains_key(label) {
                return Err(HomError::MalformedGraph(
                    "duplicate vertex label in adjacency list".into(),
                ));
            }
            index_of.insert(label.clone(), label_of.len());
            label_of.push(label.clone());
        }

        let mut neighbors = vec![Vec::new(); label_of.len()];
        for (label, nbrs) in adjacency {
            let v = index_of[label];
            for u_label in nbrs {
                let &u = index_of.get(u_label).ok_or_else(|| {
                    HomError::MalformedGraph(format!(
                        "adjacency references unknown vertex label for neighbor of {v}"
                    ))
                })?;
                neighbors[v].push(u);
            }
        }

        let graph = Graph::new(&neighbors)?;
        Ok(LabeledGraph {
            graph,
            index_of,
            label_of,
        })
    }

    /// The underlying integer-indexed graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Translates a label to its internal index, if it belongs to this graph.
    pub fn index_of(&self, label: &L) -> Option<usize> {
        self.index_of.get(label).copied()
    }

    /// Translates an internal index back to its caller-supplied label.
    pub fn label_of(&self, index: usize) -> &L {
        &self.label_of[index]
    }

    /// Translates a partial map keyed by labels into one keyed by indices.
    ///
    /// # Errors
    /// Returns [`HomError::MalformedGraph`] if a source or target label is
    /// not a vertex of `self` / `target` respectively.
    pub fn translate_partial_map<M: Clone + Eq + Hash>(
        &self,
        target: &LabeledGraph<M>,
        partmap: &[(L, M)],
    ) -> Result<Vec<(usize, usize)>, HomError> {
        partmap
            .iter()
            .map(|(g_label, h_label)| {
                let gi = self.index_of(g_label).ok_or_else(|| {
                    HomError::MalformedGraph("partial map references unknown source vertex".into())
                })?;
                let hi = target.index_of(h_label).ok_or_else(|| {
                    HomError::MalformedGraph("partial map references unknown target vertex".into())
                })?;
                Ok((gi, hi))
            })
            .collect()
    }

    /// Translates a full index-keyed map back to labels, pairing each
    /// `self` vertex with the corresponding vertex of `target`.
    pub fn translate_map_to_labels<M: Clone + Eq + Hash>(
        &self,
        target: &LabeledGraph<M>,
        map: &[usize],
    ) -> Vec<(L, M)> {
        map.iter()
            .enumerate()
            .map(|(gi, &hi)| (self.label_of(gi).clone(), target.label_of(hi).clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_string_labels() {
        let g = LabeledGraph::new(&[
            ("A".to_string(), vec!["B".to_string()]),
            ("B".to_string(), vec!["A".to_string()]),
        ])
        .unwrap();
        assert_eq!(g.graph().order(), 2);
        assert_eq!(g.index_of(&"A".to_string()), Some(0));
        assert_eq!(g.label_of(1), "B");
    }

    #[test]
    fn rejects_unknown_neighbor_label() {
        let err = LabeledGraph::new(&[("A".to_string(), vec!["Z".to_string()])]).unwrap_err();
        assert!(matches!(err, HomError::MalformedGraph(_)));
    }

    #[test]
    fn rejects_duplicate_label() {
        let err = LabeledGraph::new(&[
            ("A".to_string(), vec![]),
            ("A".to_string(), vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, HomError::MalformedGraph(_)));
    }

    #[test]
    fn translates_partial_map_round_trip() {
        let g = LabeledGraph::new(&[
            ("A".to_string(), vec!["B".to_string()]),
            ("B".to_string(), vec!["A".to_string()]),
        ])
        .unwrap();
        let translated = g
            .translate_partial_map(&g, &[("A".to_string(), "B".to_string())])
            .unwrap();
        assert_eq!(translated, vec![(0, 1)]);

        let back = g.translate_map_to_labels(&g, &[1, 0]);
        assert_eq!(
            back,
            vec![("A".to_string(), "B".to_string()), ("B".to_string(), "A".to_string())]
        );
    }
}
