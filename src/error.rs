//! Error types shared across graph construction, the search engine, and the
//! parallel driver.

use thiserror::Error;

/// Everything that can go wrong building a graph, running a search, or
/// dispatching it across workers.
///
/// Searches that simply find no homomorphisms are not an error: they return
/// an empty [`crate::engine::Results`]. These variants are for contract
/// violations — malformed inputs and worker crashes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HomError {
    /// A self-loop, out-of-range vertex index, asymmetric edge, or unknown
    /// vertex label was found while building a graph or partial map.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// A parallel worker returned no data. Fatal for the whole search.
    #[error("worker returned no data")]
    WorkerFailure,

    /// An unknown branching priority name or a negative depth was supplied.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Result alias used throughout the crate.
pub type HomResult<T> = Result<T, HomError>;
