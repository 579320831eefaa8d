//! Nearest-node lookup over a layer snapshot.
//!
//! The spatial index proper is an external concern; this finder is the
//! reference collaborator behind the same interface: it snapshots a layer's
//! positions once per update cycle and answers k-nearest queries by linear
//! scan with a callback per neighbor.

use crate::graph::{LayerId, LayeredGraph};
use crate::similarity::euclidean_distance;
use crate::types::NodeId;

/// Linear-scan nearest-node finder over one layer.
#[derive(Debug, Clone)]
pub struct NearestNodeFinder {
    entries: Vec<(NodeId, [f64; 3], bool)>,
}

impl NearestNodeFinder {
    /// Snapshot `layer` of `graph` (id order).
    #[must_use]
    pub fn from_layer(graph: &LayeredGraph, layer: LayerId) -> Self {
        let entries = graph
            .layer_nodes(layer)
            .map(|id| {
                let attrs = graph.attrs(id).expect("layer nodes exist");
                (id, attrs.position, attrs.is_active)
            })
            .collect();
        Self { entries }
    }

    /// Number of candidate nodes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the snapshot holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke `callback(neighbor_id, rank, distance)` for up to `k` nearest
    /// neighbors of `position`, nearest first. With `archived_only` set,
    /// active nodes are excluded from the candidate set.
    ///
    /// Ties in distance resolve to the lower node id, keeping results
    /// deterministic.
    pub fn find<F>(&self, position: [f64; 3], k: usize, archived_only: bool, mut callback: F)
    where
        F: FnMut(NodeId, usize, f64),
    {
        let mut candidates: Vec<(f64, NodeId)> = self
            .entries
            .iter()
            .filter(|(_, _, is_active)| !archived_only || !is_active)
            .map(|(id, pos, _)| (euclidean_distance(position, *pos), *id))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (rank, (distance, id)) in candidates.into_iter().take(k).enumerate() {
            callback(id, rank, distance);
        }
    }
}
