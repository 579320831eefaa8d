//! Pluggable geometric adjacency predicates.
//!
//! An intersection policy decides whether two nodes' attribute bundles are
//! geometrically close enough to get a candidate adjacency edge. Policies are
//! pure predicates: no side effects, no graph access. The concrete policy is
//! bound at construction time from [`crate::config::OverlapPolicyConfig`].

use scene_graph_core::similarity::euclidean_distance;
use scene_graph_core::NodeAttributes;

/// Boolean adjacency predicate over two attribute bundles.
pub trait IntersectionPolicy: Send + Sync {
    /// Whether the two bundles should be linked.
    fn call(&self, lhs: &NodeAttributes, rhs: &NodeAttributes) -> bool;
}

/// Axis-aligned bounding-box intersection with an expansion tolerance.
///
/// Both boxes are inflated by `tolerance`, translated so the joint minimum
/// corner sits at the origin, then tested with the standard AABB overlap
/// comparison (`lhs.min <= rhs.max` and `lhs.max >= rhs.min` componentwise).
/// Touching faces count as overlapping. Nodes without a bounding box never
/// overlap anything.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBoxOverlap {
    /// Corner inflation applied to both boxes before the test.
    pub tolerance: f64,
}

impl Default for BoundingBoxOverlap {
    fn default() -> Self {
        Self { tolerance: 0.0 }
    }
}

impl IntersectionPolicy for BoundingBoxOverlap {
    fn call(&self, lhs: &NodeAttributes, rhs: &NodeAttributes) -> bool {
        let (Some(lhs_box), Some(rhs_box)) = (lhs.bounding_box, rhs.bounding_box) else {
            return false;
        };
        let a = lhs_box.expanded(self.tolerance);
        let b = rhs_box.expanded(self.tolerance);

        // Translate so the joint minimum corner is the origin; pure
        // conditioning, the comparison is translation invariant.
        let mut origin = [0.0f64; 3];
        for i in 0..3 {
            origin[i] = a.min[i].min(b.min[i]);
        }
        (0..3).all(|i| {
            let a_min = a.min[i] - origin[i];
            let a_max = a.max[i] - origin[i];
            let b_min = b.min[i] - origin[i];
            let b_max = b.max[i] - origin[i];
            a_min <= b_max && a_max >= b_min
        })
    }
}

/// Centroid-distance alternative: link when positions are within
/// `max_distance` of each other.
#[derive(Debug, Clone, Copy)]
pub struct CentroidDistanceOverlap {
    /// Inclusive distance bound.
    pub max_distance: f64,
}

impl IntersectionPolicy for CentroidDistanceOverlap {
    fn call(&self, lhs: &NodeAttributes, rhs: &NodeAttributes) -> bool {
        euclidean_distance(lhs.position, rhs.position) <= self.max_distance
    }
}
