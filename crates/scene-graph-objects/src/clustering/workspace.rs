//! Dense snapshot of one connected component.

use std::collections::BTreeMap;

use scene_graph_core::{GraphResult, LayerId, LayeredGraph, NodeId};

/// Index-space view of a single connected component.
///
/// Nodes are stored ascending by id and addressed by dense index from then
/// on; `edges` holds the component-internal adjacency as `(low, high)` index
/// pairs. The snapshot is immutable for the lifetime of one clustering run,
/// so later graph mutation cannot invalidate it.
#[derive(Debug, Clone)]
pub struct ComponentWorkspace {
    nodes: Vec<NodeId>,
    index: BTreeMap<NodeId, usize>,
    edges: Vec<(usize, usize)>,
    density: f64,
}

impl ComponentWorkspace {
    /// Snapshot `nodes` (one connected component of `layer`) out of `graph`.
    ///
    /// Only edges with both endpoints inside the component are kept. The edge
    /// density is `2m / (n * (n - 1))`, defined as `1.0` for components of
    /// one node or fewer.
    ///
    /// # Errors
    /// [`scene_graph_core::GraphError::MissingNode`] if any listed node is
    /// absent from the graph.
    pub fn from_graph(
        graph: &LayeredGraph,
        layer: LayerId,
        nodes: &[NodeId],
    ) -> GraphResult<Self> {
        let mut sorted: Vec<NodeId> = nodes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let index: BTreeMap<NodeId, usize> = sorted
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        let mut edges = Vec::new();
        for (&id, &i) in &index {
            let node_layer = graph.layer_of(id)?;
            debug_assert_eq!(node_layer, layer);
            for neighbor in graph.neighbors(id)? {
                if neighbor <= id {
                    continue;
                }
                if let Some(&j) = index.get(&neighbor) {
                    edges.push((i, j));
                }
            }
        }

        let n = sorted.len();
        let density = if n <= 1 {
            1.0
        } else {
            2.0 * edges.len() as f64 / (n as f64 * (n as f64 - 1.0))
        };

        Ok(Self {
            nodes: sorted,
            index,
            edges,
            density,
        })
    }

    /// Component nodes, ascending by id.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Dense index of a node inside this component.
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Component-internal edges as `(low, high)` index pairs.
    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Edge density of the component in `[0, 1]`.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Number of nodes in the component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the component is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
