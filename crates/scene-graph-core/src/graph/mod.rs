//! In-memory multi-layer scene graph.
//!
//! Nodes live in exactly one layer. Edges come in two shapes:
//!
//! - **Intra-layer adjacency**: undirected edges between two nodes of the
//!   same layer (segment↔segment overlap edges).
//! - **Cross-layer parent edges**: at most one parent per node, pointing into
//!   a coarser layer (object→place, segment→place). The parent side of a
//!   cross-layer insertion is derived from the layer coarseness order.
//!
//! All iteration is id-ordered (BTree-backed) so every traversal is
//! deterministic for a given graph content.

mod components;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::types::{NodeAttributes, NodeId};

/// Layer identifier, ordered fine-to-coarse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    /// Leaf-level perceptual observations.
    Segments,
    /// Aggregated entities produced from segments.
    Objects,
    /// Coarse spatial anchors.
    Places,
}

impl LayerId {
    /// Coarseness rank: higher = coarser.
    #[must_use]
    pub fn coarseness(&self) -> u8 {
        match self {
            LayerId::Segments => 0,
            LayerId::Objects => 1,
            LayerId::Places => 2,
        }
    }
}

/// Internal node record: attributes plus connectivity bookkeeping.
#[derive(Debug, Clone)]
struct NodeRecord {
    layer: LayerId,
    attrs: NodeAttributes,
    parent: Option<NodeId>,
    children: BTreeSet<NodeId>,
    siblings: BTreeSet<NodeId>,
}

/// In-memory layered graph store.
///
/// The aggregation core assumes exclusive write access for the duration of
/// one update cycle; no internal synchronization is provided.
#[derive(Debug, Default, Clone)]
pub struct LayeredGraph {
    nodes: BTreeMap<NodeId, NodeRecord>,
    layers: BTreeMap<LayerId, BTreeSet<NodeId>>,
}

impl LayeredGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node into `layer`.
    ///
    /// # Errors
    /// [`GraphError::DuplicateNode`] if the id is already present.
    pub fn insert_node(
        &mut self,
        layer: LayerId,
        id: NodeId,
        attrs: NodeAttributes,
    ) -> GraphResult<()> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id, layer));
        }
        self.nodes.insert(
            id,
            NodeRecord {
                layer,
                attrs,
                parent: None,
                children: BTreeSet::new(),
                siblings: BTreeSet::new(),
            },
        );
        self.layers.entry(layer).or_default().insert(id);
        Ok(())
    }

    /// Remove a node, unlinking all adjacency, parent, and child edges.
    ///
    /// Returns the removed attributes.
    ///
    /// # Errors
    /// [`GraphError::MissingNode`] if the id is absent.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<NodeAttributes> {
        let record = self.nodes.remove(&id).ok_or(GraphError::MissingNode(id))?;
        if let Some(layer_set) = self.layers.get_mut(&record.layer) {
            layer_set.remove(&id);
        }
        for sibling in &record.siblings {
            if let Some(other) = self.nodes.get_mut(sibling) {
                other.siblings.remove(&id);
            }
        }
        if let Some(parent) = record.parent {
            if let Some(parent_record) = self.nodes.get_mut(&parent) {
                parent_record.children.remove(&id);
            }
        }
        for child in &record.children {
            if let Some(child_record) = self.nodes.get_mut(child) {
                child_record.parent = None;
            }
        }
        Ok(record.attrs)
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Same-layer endpoints get an undirected adjacency edge; returns `false`
    /// when the edge already existed. Cross-layer endpoints get a parent edge
    /// on the finer node (replacing any previous parent); returns `true`.
    ///
    /// # Errors
    /// [`GraphError::MissingNode`] when either endpoint is absent, or
    /// [`GraphError::InvalidEdge`] for self-edges.
    pub fn insert_edge(&mut self, source: NodeId, target: NodeId) -> GraphResult<bool> {
        if source == target {
            return Err(GraphError::InvalidEdge {
                from: source,
                to: target,
                reason: "self-edges are not allowed".to_string(),
            });
        }
        let source_layer = self.record(source)?.layer;
        let target_layer = self.record(target)?.layer;

        if source_layer == target_layer {
            let inserted = self
                .nodes
                .get_mut(&source)
                .expect("checked above")
                .siblings
                .insert(target);
            self.nodes
                .get_mut(&target)
                .expect("checked above")
                .siblings
                .insert(source);
            return Ok(inserted);
        }

        // Cross-layer: the coarser endpoint becomes the parent.
        let (child, parent) = if source_layer.coarseness() < target_layer.coarseness() {
            (source, target)
        } else {
            (target, source)
        };
        if let Some(previous) = self.nodes.get(&child).expect("checked above").parent {
            if let Some(prev_record) = self.nodes.get_mut(&previous) {
                prev_record.children.remove(&child);
            }
        }
        self.nodes.get_mut(&child).expect("checked above").parent = Some(parent);
        self.nodes
            .get_mut(&parent)
            .expect("checked above")
            .children
            .insert(child);
        Ok(true)
    }

    /// Whether a node id is present.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Layer a node lives in.
    pub fn layer_of(&self, id: NodeId) -> GraphResult<LayerId> {
        Ok(self.record(id)?.layer)
    }

    /// Immutable attribute access.
    pub fn attrs(&self, id: NodeId) -> GraphResult<&NodeAttributes> {
        Ok(&self.record(id)?.attrs)
    }

    /// Mutable attribute access.
    pub fn attrs_mut(&mut self, id: NodeId) -> GraphResult<&mut NodeAttributes> {
        let record = self.nodes.get_mut(&id).ok_or(GraphError::MissingNode(id))?;
        Ok(&mut record.attrs)
    }

    /// Parent of a node, if any.
    pub fn parent(&self, id: NodeId) -> GraphResult<Option<NodeId>> {
        Ok(self.record(id)?.parent)
    }

    /// Children of a node, ascending by id.
    pub fn children(&self, id: NodeId) -> GraphResult<Vec<NodeId>> {
        Ok(self.record(id)?.children.iter().copied().collect())
    }

    /// Same-layer neighbors of a node, ascending by id.
    pub fn neighbors(&self, id: NodeId) -> GraphResult<Vec<NodeId>> {
        Ok(self.record(id)?.siblings.iter().copied().collect())
    }

    /// Node ids of a layer, ascending.
    pub fn layer_nodes(&self, layer: LayerId) -> impl Iterator<Item = NodeId> + '_ {
        self.layers
            .get(&layer)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of nodes in a layer.
    #[must_use]
    pub fn layer_len(&self, layer: LayerId) -> usize {
        self.layers.get(&layer).map_or(0, BTreeSet::len)
    }

    /// Undirected intra-layer edges of a layer as `(low, high)` pairs,
    /// ascending lexicographically.
    #[must_use]
    pub fn layer_edges(&self, layer: LayerId) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for id in self.layer_nodes(layer) {
            let record = &self.nodes[&id];
            for &sibling in record.siblings.iter() {
                if id < sibling {
                    edges.push((id, sibling));
                }
            }
        }
        edges
    }

    fn record(&self, id: NodeId) -> GraphResult<&NodeRecord> {
        self.nodes.get(&id).ok_or(GraphError::MissingNode(id))
    }
}
