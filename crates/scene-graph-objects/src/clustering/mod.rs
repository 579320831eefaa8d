//! Per-component clustering of segment nodes into object candidates.
//!
//! [`ComponentWorkspace`] snapshots one connected component (nodes, internal
//! edges, edge density) out of the host graph so the merge loop can run on
//! dense indices. [`cluster_agglomerative`] then greedily merges adjacent
//! clusters while the information-bottleneck cost stays under the configured
//! threshold.

mod agglomerative;
mod workspace;

pub use agglomerative::cluster_agglomerative;
pub use workspace::ComponentWorkspace;
