//! Graph and partial-map I/O for the CLI (§2a): adjacency-list JSON on disk,
//! the serde/serde_json counterpart to the host's binary adjacency-graph
//! loader.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{HomError, HomResult};
use crate::labels::LabeledGraph;

/// Loads a graph with `String` vertex labels from an adjacency-list JSON
/// file at `path`.
///
/// The on-disk shape is a JSON array of `[label, [neighbor_label, ...]]`
/// pairs, e.g. `[["A", ["B", "C"]], ["B", ["A"]], ["C", ["A"]]]`.
///
/// # Errors
/// Returns [`HomError::MalformedGraph`] if the file can't be read or
/// parsed, or if its contents violate the usual graph invariants (unknown
/// neighbor label, self-loop, asymmetric edge).
pub fn load_graph(path: &Path) -> HomResult<LabeledGraph<String>> {
    let file = File::open(path)
        .map_err(|e| HomError::MalformedGraph(format!("reading {}: {e}", path.display())))?;
    let raw: Vec<(String, Vec<String>)> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| HomError::MalformedGraph(format!("parsing {}: {e}", path.display())))?;
    LabeledGraph::new(&raw)
}

/// Writes `graph` to `path` as adjacency-list JSON, in the same shape
/// [`load_graph`] reads. Vertices are written in index order, each paired
/// with its neighbor labels also in index order.
///
/// # Errors
/// Returns [`HomError::MalformedGraph`] if the file can't be created or
/// written.
pub fn save_graph(graph: &LabeledGraph<String>, path: &Path) -> HomResult<()> {
    let g = graph.graph();
    let raw: Vec<(String, Vec<String>)> = (0..g.order())
        .map(|v| {
            let label = graph.label_of(v).clone();
            let neighbors = g
                .neighbors(v)
                .iter()
                .map(|u| graph.label_of(u).clone())
                .collect();
            (label, neighbors)
        })
        .collect();

    let file = File::create(path)
        .map_err(|e| HomError::MalformedGraph(format!("writing {}: {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &raw)
        .map_err(|e| HomError::MalformedGraph(format!("writing {}: {e}", path.display())))?;
    Ok(())
}

/// The on-disk shape of a partial map: a JSON object mapping source-vertex
/// labels to target-vertex labels.
///
/// ```json
/// {"0": "0", "2": "1"}
/// ```
pub fn load_partial_map(path: &Path) -> HomResult<Vec<(String, String)>> {
    let file = File::open(path)
        .map_err(|e| HomError::MalformedGraph(format!("reading {}: {e}", path.display())))?;
    let raw: std::collections::BTreeMap<String, String> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| HomError::MalformedGraph(format!("parsing {}: {e}", path.display())))?;
    Ok(raw.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trips_a_graph_through_json() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("homcore_fs_test_{}.json", std::process::id()));
        {
            let mut f = File::create(&path).unwrap();
            write!(f, r#"[["A", ["B"]], ["B", ["A"]]]"#).unwrap();
        }

        let g = load_graph(&path).unwrap();
        assert_eq!(g.graph().order(), 2);
        assert_eq!(g.index_of(&"A".to_string()), Some(0));

        save_graph(&g, &path).unwrap();
        let g2 = load_graph(&path).unwrap();
        assert_eq!(g2.graph().order(), 2);
        assert!(g2.graph().has_edge(0, 1));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_a_malformed_graph_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("homcore_fs_bad_{}.json", std::process::id()));
        {
            let mut f = File::create(&path).unwrap();
            write!(f, r#"[["A", ["Z"]]]"#).unwrap();
        }
        let err = load_graph(&path).unwrap_err();
        assert!(matches!(err, HomError::MalformedGraph(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn loads_a_partial_map_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("homcore_fs_partmap_{}.json", std::process::id()));
        {
            let mut f = File::create(&path).unwrap();
            write!(f, r#"{{"0": "0", "2": "1"}}"#).unwrap();
        }
        let pairs = load_partial_map(&path).unwrap();
        assert_eq!(pairs.len(), 2);
        std::fs::remove_file(&path).ok();
    }
}
