//! Scene Graph Objects Library
//!
//! Incrementally converts raw perceptual segment observations into
//! object-level entities inside a layered scene graph, and keeps that
//! aggregation consistent as new observations arrive and as regions of the
//! graph transition from actively-observed to archived.
//!
//! # Architecture
//!
//! - [`IdTracker`]: recyclable integer identifiers for connected components
//! - [`overlap`]: pluggable geometric adjacency predicates
//! - [`probability`]: posteriors, mutual information, divergence
//! - [`clustering`]: per-component workspace + agglomerative
//!   information-bottleneck clustering
//! - [`ObjectUpdater`]: the per-cycle update driver
//!
//! # Update cycle
//!
//! One call to [`ObjectUpdater::call`] runs four phases in order: reconcile
//! object→place attachments, discover new segment adjacency edges (gated by
//! semantic relevance), tear down components touched by cross-component
//! edges, then re-detect components and cluster each into object nodes.
//! The cycle is single-threaded and runs to completion; only the pairwise
//! overlap test inside edge discovery uses data parallelism, with all graph
//! mutation kept sequential.

pub mod clustering;
pub mod config;
pub mod error;
pub mod id_tracker;
pub mod overlap;
pub mod probability;
pub mod updater;

pub use clustering::ComponentWorkspace;
pub use config::{IbSelectorConfig, ObjectUpdateConfig, OverlapPolicyConfig};
pub use error::{ConfigError, UpdateError, UpdateResult};
pub use id_tracker::IdTracker;
pub use overlap::{BoundingBoxOverlap, CentroidDistanceOverlap, IntersectionPolicy};
pub use updater::{MergeReport, ObjectUpdater, UpdateInfo};
