//! Connected-component search over one layer with membership predicates.
//!
//! BFS with a VecDeque frontier and a visited set; seeds are taken in
//! ascending id order and members are reported sorted, so the component list
//! is deterministic for a given graph content.

use std::collections::{BTreeSet, VecDeque};

use crate::types::NodeId;

use super::{LayerId, LayeredGraph};

impl LayeredGraph {
    /// Connected components over the intra-layer adjacency of `layer`,
    /// restricted to nodes accepted by `node_ok` and edges accepted by
    /// `edge_ok` (evaluated on both endpoint orders as `(visited, next)`).
    ///
    /// Components are returned ordered by their smallest member id, members
    /// ascending.
    pub fn connected_components<F, G>(
        &self,
        layer: LayerId,
        mut node_ok: F,
        mut edge_ok: G,
    ) -> Vec<Vec<NodeId>>
    where
        F: FnMut(NodeId) -> bool,
        G: FnMut(NodeId, NodeId) -> bool,
    {
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        let mut components = Vec::new();

        for seed in self.layer_nodes(layer) {
            if visited.contains(&seed) || !node_ok(seed) {
                continue;
            }

            let mut members = BTreeSet::new();
            let mut frontier = VecDeque::new();
            frontier.push_back(seed);
            visited.insert(seed);

            while let Some(current) = frontier.pop_front() {
                members.insert(current);
                let neighbors = self
                    .neighbors(current)
                    .expect("frontier nodes exist in the graph");
                for next in neighbors {
                    if visited.contains(&next) || !node_ok(next) {
                        continue;
                    }
                    if !edge_ok(current, next) {
                        continue;
                    }
                    visited.insert(next);
                    frontier.push_back(next);
                }
            }

            components.push(members.into_iter().collect());
        }

        components
    }
}
