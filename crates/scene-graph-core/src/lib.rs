//! Scene Graph Core Library
//!
//! Provides the layered scene-graph substrate consumed by the object
//! aggregation core in `scene-graph-objects`:
//!
//! - Node identifiers ([`NodeId`], [`NodeSymbol`]) and layer identifiers
//!   ([`LayerId`])
//! - Node attributes: position, active flag, bounding box, semantic feature
//!   matrix, domain attributes
//! - The in-memory multi-layer graph store ([`LayeredGraph`]) with intra-layer
//!   adjacency and cross-layer parent edges
//! - Dense-vector similarity primitives
//! - Task embeddings plus pluggable distance metrics ([`TaskEmbeddingGroup`],
//!   [`EmbeddingDistance`])
//! - Nearest-node lookup over a layer snapshot ([`NearestNodeFinder`])
//! - The opaque domain-attribute reducer seam ([`AttributeReducer`])
//!
//! # Example
//!
//! ```
//! use scene_graph_core::graph::{LayerId, LayeredGraph};
//! use scene_graph_core::types::{NodeAttributes, NodeSymbol};
//!
//! let mut graph = LayeredGraph::new();
//! let id = NodeSymbol::new('S', 0).id();
//! graph
//!     .insert_node(LayerId::Segments, id, NodeAttributes::at([0.0, 0.0, 0.0]))
//!     .unwrap();
//! assert!(graph.contains(id));
//! ```

pub mod error;
pub mod graph;
pub mod nn;
pub mod reducer;
pub mod similarity;
pub mod tasks;
pub mod types;

pub use error::{GraphError, GraphResult};
pub use graph::{LayerId, LayeredGraph};
pub use nn::NearestNodeFinder;
pub use reducer::{AttributeReducer, DefaultReducer};
pub use similarity::SimilarityError;
pub use tasks::{BestScore, CosineDistance, EmbeddingDistance, TaskEmbedding, TaskEmbeddingGroup};
pub use types::{BoundingBox, FeatureMatrix, NodeAttributes, NodeId, NodeSymbol};
