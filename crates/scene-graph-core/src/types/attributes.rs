//! Node attribute bundles: geometry, activity, semantic features.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with inclusive min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Create a bounding box from min/max corners.
    #[must_use]
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Componentwise `min <= max` check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.min[i] <= self.max[i])
    }

    /// Box inflated by `tolerance` on every face. Negative tolerance shrinks.
    #[must_use]
    pub fn expanded(&self, tolerance: f64) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] -= tolerance;
            out.max[i] += tolerance;
        }
        out
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }
}

/// Matrix of per-sample semantic feature vectors.
///
/// Each sample is one observation of the node's semantic feature; the
/// per-dimension mean across samples is the canonical summary used for
/// scoring. All samples must share a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FeatureMatrix {
    samples: Vec<Vec<f32>>,
}

impl FeatureMatrix {
    /// Build from sample columns. Samples with a dimension differing from
    /// the first are dropped with a warning rather than corrupting the mean.
    #[must_use]
    pub fn from_samples(samples: Vec<Vec<f32>>) -> Self {
        let dimension = samples.first().map(Vec::len).unwrap_or(0);
        let (kept, dropped): (Vec<_>, Vec<_>) =
            samples.into_iter().partition(|s| s.len() == dimension);
        if !dropped.is_empty() {
            tracing::warn!(
                dropped = dropped.len(),
                dimension,
                "dropping feature samples with mismatched dimension"
            );
        }
        Self { samples: kept }
    }

    /// Single-sample matrix.
    #[must_use]
    pub fn from_single(sample: Vec<f32>) -> Self {
        Self {
            samples: vec![sample],
        }
    }

    /// True when no samples are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() || self.dimension() == 0
    }

    /// Feature dimension (0 when empty).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.samples.first().map(Vec::len).unwrap_or(0)
    }

    /// Number of samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Per-dimension mean across samples. Empty vector when no samples.
    #[must_use]
    pub fn mean(&self) -> Vec<f32> {
        if self.samples.is_empty() {
            return Vec::new();
        }
        let dim = self.dimension();
        let mut out = vec![0.0f32; dim];
        for sample in &self.samples {
            for (acc, value) in out.iter_mut().zip(sample.iter()) {
                *acc += value;
            }
        }
        let n = self.samples.len() as f32;
        for value in &mut out {
            *value /= n;
        }
        out
    }
}

/// Attribute bundle shared by every node in the layered graph.
///
/// Segments carry all fields; places typically carry only position and the
/// active flag; objects carry the merged position/feature produced by the
/// aggregation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// 3D position (segment centroid, place anchor, or merged object centroid).
    pub position: [f64; 3],
    /// Active = still subject to revision; archived (false) = frozen.
    pub is_active: bool,
    /// Axis-aligned bounding volume, when known.
    pub bounding_box: Option<BoundingBox>,
    /// Per-sample semantic feature vectors.
    pub feature: FeatureMatrix,
    /// Opaque domain attributes, merged via an [`crate::AttributeReducer`].
    pub extra: BTreeMap<String, f64>,
}

impl NodeAttributes {
    /// Active node at `position` with no geometry or feature.
    #[must_use]
    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position,
            is_active: true,
            bounding_box: None,
            feature: FeatureMatrix::default(),
            extra: BTreeMap::new(),
        }
    }

    /// Builder: attach a bounding box.
    #[must_use]
    pub fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Builder: attach a feature matrix.
    #[must_use]
    pub fn with_feature(mut self, feature: FeatureMatrix) -> Self {
        self.feature = feature;
        self
    }

    /// Builder: set the active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Per-dimension mean of the feature samples.
    #[must_use]
    pub fn mean_feature(&self) -> Vec<f32> {
        self.feature.mean()
    }
}
