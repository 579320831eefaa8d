//! Opaque domain-attribute merging.
//!
//! The aggregation core averages position and feature itself; everything else
//! a deployment attaches to its nodes is merged through this seam. The
//! reducer must be order-insensitive enough for incremental use: it is called
//! once per extra cluster member, folding into the running merge.

use crate::types::NodeAttributes;

/// Folds one node's domain attributes into a running merged bundle.
pub trait AttributeReducer: Send + Sync {
    /// Merge `from` into `into`. Position and feature fields are owned by the
    /// caller and must not be touched here.
    fn merge(&self, from: &NodeAttributes, into: &mut NodeAttributes);
}

/// Default reducer: unions bounding volumes and max-merges keyed attributes.
///
/// Max-merge keeps the reducer commutative and idempotent, which makes the
/// merged result independent of cluster iteration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReducer;

impl AttributeReducer for DefaultReducer {
    fn merge(&self, from: &NodeAttributes, into: &mut NodeAttributes) {
        into.bounding_box = match (into.bounding_box, from.bounding_box) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };
        for (key, value) in &from.extra {
            into.extra
                .entry(key.clone())
                .and_modify(|v| *v = v.max(*value))
                .or_insert(*value);
        }
    }
}
