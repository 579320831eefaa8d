//! Task embeddings and pluggable distance metrics.
//!
//! The aggregation core scores every segment/object feature against a fixed
//! group of task embeddings. The metric is a single-entry-point trait bound
//! at construction time; scores are opaque scalars compared only against
//! configured thresholds and normalized into posteriors.

use serde::{Deserialize, Serialize};

use crate::similarity::{cosine_similarity, dot_product, SimilarityError};

/// Scores one feature vector against one task embedding. Higher = closer.
pub trait EmbeddingDistance: Send + Sync {
    /// Score a feature against a task embedding.
    ///
    /// # Errors
    /// Propagates vector-shape errors ([`SimilarityError`]).
    fn score(&self, feature: &[f32], task: &[f32]) -> Result<f32, SimilarityError>;
}

/// Cosine similarity mapped from `[-1, 1]` to `[0, 1]`.
///
/// The mapping keeps scores non-negative so they can double as unnormalized
/// posterior mass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl EmbeddingDistance for CosineDistance {
    fn score(&self, feature: &[f32], task: &[f32]) -> Result<f32, SimilarityError> {
        Ok((cosine_similarity(feature, task)? + 1.0) / 2.0)
    }
}

/// Raw dot product. Useful when task embeddings are pre-normalized and
/// magnitude carries confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProductDistance;

impl EmbeddingDistance for DotProductDistance {
    fn score(&self, feature: &[f32], task: &[f32]) -> Result<f32, SimilarityError> {
        dot_product(feature, task)
    }
}

/// One named task embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEmbedding {
    /// Task label.
    pub name: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// Best-match result of scoring a feature against the task group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestScore {
    /// Index of the best-matching task.
    pub task: usize,
    /// Metric-defined confidence of the match.
    pub score: f32,
}

/// Fixed group of task embeddings, all sharing one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaskEmbedding>")]
#[serde(into = "Vec<TaskEmbedding>")]
pub struct TaskEmbeddingGroup {
    tasks: Vec<TaskEmbedding>,
}

impl TaskEmbeddingGroup {
    /// Build a group, validating that it is non-empty and dimensionally
    /// consistent.
    ///
    /// # Errors
    /// [`SimilarityError::EmptyVector`] for an empty group or empty task
    /// embedding, [`SimilarityError::DimensionMismatch`] for ragged
    /// embeddings.
    pub fn new(tasks: Vec<TaskEmbedding>) -> Result<Self, SimilarityError> {
        let dimension = tasks
            .first()
            .map(|t| t.embedding.len())
            .ok_or(SimilarityError::EmptyVector)?;
        if dimension == 0 {
            return Err(SimilarityError::EmptyVector);
        }
        for task in &tasks {
            if task.embedding.len() != dimension {
                return Err(SimilarityError::DimensionMismatch {
                    expected: dimension,
                    actual: task.embedding.len(),
                });
            }
        }
        Ok(Self { tasks })
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when the group holds no tasks (cannot happen post-construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Shared embedding dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.tasks.first().map_or(0, |t| t.embedding.len())
    }

    /// Task by index.
    #[must_use]
    pub fn task(&self, index: usize) -> Option<&TaskEmbedding> {
        self.tasks.get(index)
    }

    /// Score `feature` against every task, in task order.
    ///
    /// # Errors
    /// Propagates metric errors (shape mismatches).
    pub fn scores(
        &self,
        metric: &dyn EmbeddingDistance,
        feature: &[f32],
    ) -> Result<Vec<f32>, SimilarityError> {
        self.tasks
            .iter()
            .map(|task| metric.score(feature, &task.embedding))
            .collect()
    }

    /// Best-matching task and its score. Ties resolve to the lowest index.
    ///
    /// # Errors
    /// Propagates metric errors (shape mismatches).
    pub fn best_score(
        &self,
        metric: &dyn EmbeddingDistance,
        feature: &[f32],
    ) -> Result<BestScore, SimilarityError> {
        let scores = self.scores(metric, feature)?;
        let (task, score) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (i, s)| {
                if s > best.1 {
                    (i, s)
                } else {
                    best
                }
            });
        Ok(BestScore { task, score })
    }
}

impl TryFrom<Vec<TaskEmbedding>> for TaskEmbeddingGroup {
    type Error = SimilarityError;

    fn try_from(tasks: Vec<TaskEmbedding>) -> Result<Self, Self::Error> {
        Self::new(tasks)
    }
}

impl From<TaskEmbeddingGroup> for Vec<TaskEmbedding> {
    fn from(group: TaskEmbeddingGroup) -> Self {
        group.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> TaskEmbeddingGroup {
        TaskEmbeddingGroup::new(vec![
            TaskEmbedding {
                name: "chair".to_string(),
                embedding: vec![1.0, 0.0],
            },
            TaskEmbedding {
                name: "table".to_string(),
                embedding: vec![0.0, 1.0],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_best_score_picks_aligned_task() {
        let tasks = group();
        let best = tasks.best_score(&CosineDistance, &[0.9, 0.1]).unwrap();
        assert_eq!(best.task, 0);
        assert!(best.score > 0.9);
    }

    #[test]
    fn test_scores_are_in_task_order() {
        let tasks = group();
        let scores = tasks.scores(&CosineDistance, &[0.0, 1.0]).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let tasks = group();
        let best = tasks.best_score(&CosineDistance, &[1.0, 1.0]).unwrap();
        assert_eq!(best.task, 0, "equal scores must resolve to lowest index");
    }

    #[test]
    fn test_empty_group_rejected() {
        assert_eq!(
            TaskEmbeddingGroup::new(vec![]).unwrap_err(),
            SimilarityError::EmptyVector
        );
    }

    #[test]
    fn test_ragged_group_rejected() {
        let err = TaskEmbeddingGroup::new(vec![
            TaskEmbedding {
                name: "a".to_string(),
                embedding: vec![1.0, 0.0],
            },
            TaskEmbedding {
                name: "b".to_string(),
                embedding: vec![1.0],
            },
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SimilarityError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_group_deserializes_with_validation() {
        let json = r#"[{"name":"chair","embedding":[1.0,0.0]}]"#;
        let group: TaskEmbeddingGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.len(), 1);

        let ragged = r#"[{"name":"a","embedding":[1.0]},{"name":"b","embedding":[1.0,2.0]}]"#;
        assert!(serde_json::from_str::<TaskEmbeddingGroup>(ragged).is_err());
    }
}
