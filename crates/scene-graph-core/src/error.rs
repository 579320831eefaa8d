//! Error types for scene-graph-core.
//!
//! Graph-store errors indicate invariant breaches in the caller's usage
//! (missing nodes, duplicate insertion, malformed edges). They are never
//! swallowed: library code returns `Result` and propagates with `?`.

use thiserror::Error;

use crate::graph::LayerId;
use crate::types::NodeId;

/// Errors from layered-graph operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A referenced node is absent from the graph.
    ///
    /// This is a precondition violation: the upstream producer promised the
    /// node exists. Callers should treat it as fatal for the current cycle.
    #[error("node {0} not found")]
    MissingNode(NodeId),

    /// Attempted to insert a node id that already exists.
    #[error("node {0} already exists in layer {1:?}")]
    DuplicateNode(NodeId, LayerId),

    /// Edge endpoints do not form a valid edge.
    ///
    /// The endpoint fields are deliberately not named `source`: thiserror
    /// would treat such a field as the error's cause and require
    /// `NodeId: std::error::Error`.
    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        /// Originating endpoint.
        from: NodeId,
        /// Destination endpoint.
        to: NodeId,
        /// Why the edge was rejected.
        reason: String,
    },
}

/// Result type alias for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
