//! Dense vector similarity primitives.
//!
//! Core numeric helpers for feature scoring and nearest-neighbor distance.
//! Results are clamped to their valid ranges to absorb floating point error.

use thiserror::Error;

/// Errors from dense vector similarity computation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    /// Dimension mismatch between vectors.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension (from first vector)
        expected: usize,
        /// Actual dimension (from second vector)
        actual: usize,
    },

    /// Empty vector provided.
    #[error("empty vector provided")]
    EmptyVector,
}

/// L2 norm (magnitude) of a vector.
#[inline]
#[must_use]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[inline]
fn check_pair(a: &[f32], b: &[f32]) -> Result<(), SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Dot product of two equal-length vectors.
///
/// # Errors
/// [`SimilarityError::EmptyVector`] or [`SimilarityError::DimensionMismatch`].
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    check_pair(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Zero-magnitude input yields `0.0` rather than an error: a zero feature has
/// no direction and should score as maximally uninformative, which lets
/// confidence gates downstream reject it without a separate error path.
///
/// # Errors
/// [`SimilarityError::EmptyVector`] or [`SimilarityError::DimensionMismatch`].
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    check_pair(a, b)?;
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Euclidean distance between two points.
#[inline]
#[must_use]
pub fn euclidean_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
