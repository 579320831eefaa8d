//! Error types for the aggregation core.

use thiserror::Error;

use scene_graph_core::{GraphError, SimilarityError};

/// Configuration validation failure. Fails fast with the offending field.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter is outside its allowed range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ConfigError {
    /// Build an [`ConfigError::InvalidParameter`] from a message.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Errors surfaced by one update cycle.
///
/// Anything here is a precondition violation in the host graph or the
/// configured collaborators — not a recoverable per-node condition. Data
/// quality anomalies (too-far neighbors, empty clusters, parentless objects)
/// are logged and skipped instead.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Host graph invariant breach (missing node, malformed edge).
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Feature/task vector shape mismatch during scoring or merging.
    #[error("scoring error: {0}")]
    Scoring(#[from] SimilarityError),
}

/// Result type alias for update-cycle operations.
pub type UpdateResult<T> = std::result::Result<T, UpdateError>;
