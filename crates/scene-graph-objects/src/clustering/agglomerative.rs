//! Greedy agglomerative information-bottleneck merging.

use std::collections::BTreeSet;

use tracing::debug;

use scene_graph_core::NodeId;

use crate::config::IbSelectorConfig;
use crate::probability::{weighted_js_divergence, PROB_EPSILON};
use crate::ComponentWorkspace;

/// One live cluster during the merge loop.
///
/// Clusters always live in the slot of their smallest member index, so slot
/// order doubles as a deterministic tie-break key.
#[derive(Debug, Clone)]
struct Cluster {
    /// Dense node indices, ascending.
    members: Vec<usize>,
    /// Size-weighted mean of the member posteriors.
    posterior: Vec<f64>,
    /// Slots of adjacent live clusters.
    neighbors: BTreeSet<usize>,
}

/// Cluster a component's segments by greedily merging adjacent clusters.
///
/// The cost of merging clusters `a` and `b` is the information lost by
/// collapsing them:
///
/// `cost(a, b) = (w_a + w_b) * JS_pi(p_a, p_b)` with `pi = (w_a, w_b)`
/// renormalized, where `w` is the cluster's share of the component and `p`
/// its posterior over tasks. Costs are normalized by
/// `global_information * density` so thresholds stay comparable across
/// components of different sizes and connectivity; a vanishing normalizer
/// leaves costs raw.
///
/// Merging proceeds lowest-cost-first while the normalized cost stays at or
/// below `selector.merge_threshold`, only ever across existing adjacency.
/// Ties break toward the pair with the smallest member ids. Returned clusters
/// are ordered by smallest member id, members ascending.
///
/// `posteriors` must be indexed like `workspace.nodes()`.
#[must_use]
pub fn cluster_agglomerative(
    workspace: &ComponentWorkspace,
    posteriors: &[Vec<f64>],
    selector: &IbSelectorConfig,
    global_information: f64,
) -> Vec<Vec<NodeId>> {
    let n = workspace.len();
    debug_assert_eq!(posteriors.len(), n);
    if n == 0 {
        return Vec::new();
    }

    let normalizer = global_information * workspace.density();

    let mut slots: Vec<Option<Cluster>> = (0..n)
        .map(|i| {
            Some(Cluster {
                members: vec![i],
                posterior: posteriors[i].clone(),
                neighbors: BTreeSet::new(),
            })
        })
        .collect();
    for &(i, j) in workspace.edges() {
        if let Some(cluster) = slots[i].as_mut() {
            cluster.neighbors.insert(j);
        }
        if let Some(cluster) = slots[j].as_mut() {
            cluster.neighbors.insert(i);
        }
    }

    loop {
        let Some((cost, a, b)) = cheapest_pair(&slots, n, normalizer) else {
            break;
        };
        if cost > selector.merge_threshold {
            break;
        }
        debug!(cost, low = a, high = b, "merging adjacent clusters");
        merge_into(&mut slots, a, b, n);
    }

    let clusters: Vec<Vec<NodeId>> = slots
        .into_iter()
        .flatten()
        .map(|cluster| {
            cluster
                .members
                .iter()
                .map(|&i| workspace.nodes()[i])
                .collect()
        })
        .collect();
    debug!(
        nodes = n,
        clusters = clusters.len(),
        "agglomerative merge finished"
    );
    clusters
}

/// Lowest-cost adjacent pair `(cost, low_slot, high_slot)`, ties broken by
/// slot order.
fn cheapest_pair(
    slots: &[Option<Cluster>],
    n: usize,
    normalizer: f64,
) -> Option<(f64, usize, usize)> {
    let mut best: Option<(f64, usize, usize)> = None;
    for (a, slot) in slots.iter().enumerate() {
        let Some(cluster) = slot else { continue };
        for &b in cluster.neighbors.range(a + 1..) {
            let Some(other) = slots[b].as_ref() else {
                continue;
            };
            let cost = merge_cost(cluster, other, n, normalizer);
            let candidate = (cost, a, b);
            let better = match best {
                None => true,
                Some((c, x, y)) => {
                    cost.total_cmp(&c).then_with(|| (a, b).cmp(&(x, y))).is_lt()
                }
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Normalized information loss of collapsing two clusters.
fn merge_cost(a: &Cluster, b: &Cluster, n: usize, normalizer: f64) -> f64 {
    let w_a = a.members.len() as f64 / n as f64;
    let w_b = b.members.len() as f64 / n as f64;
    let total = w_a + w_b;
    let raw = total * weighted_js_divergence(&a.posterior, &b.posterior, w_a / total, w_b / total);
    if normalizer <= PROB_EPSILON {
        raw
    } else {
        raw / normalizer
    }
}

/// Merge slot `b` into slot `a` (`a < b`), rewiring adjacency.
fn merge_into(slots: &mut [Option<Cluster>], a: usize, b: usize, n: usize) {
    let absorbed = slots[b]
        .take()
        .expect("cheapest_pair only yields live slots");
    for &neighbor in &absorbed.neighbors {
        if neighbor == a {
            continue;
        }
        if let Some(cluster) = slots[neighbor].as_mut() {
            cluster.neighbors.remove(&b);
            cluster.neighbors.insert(a);
        }
    }

    let survivor = slots[a]
        .as_mut()
        .expect("cheapest_pair only yields live slots");
    let w_a = survivor.members.len() as f64;
    let w_b = absorbed.members.len() as f64;
    for (p, q) in survivor.posterior.iter_mut().zip(absorbed.posterior.iter()) {
        *p = (w_a * *p + w_b * q) / (w_a + w_b);
    }
    survivor.members.extend(absorbed.members);
    survivor.members.sort_unstable();
    survivor.neighbors.extend(absorbed.neighbors);
    survivor.neighbors.remove(&a);
    survivor.neighbors.remove(&b);
    debug_assert!(survivor.members.len() <= n);
}
