//! Core domain types: node identifiers and node attributes.

mod attributes;
mod symbol;

pub use attributes::{BoundingBox, FeatureMatrix, NodeAttributes};
pub use symbol::{NodeId, NodeSymbol};
