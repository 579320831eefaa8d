//! Configuration for the aggregation core.
//!
//! Validated once at driver construction and immutable thereafter. Values are
//! NOT auto-clamped by the builders; `validate()` fails fast with the
//! offending field.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::overlap::{BoundingBoxOverlap, CentroidDistanceOverlap, IntersectionPolicy};

/// Selection of the concrete overlap/edge-acceptance policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlapPolicyConfig {
    /// AABB intersection with corner inflation (default, zero inflation).
    BoundingBox {
        /// Corner inflation applied to both boxes.
        tolerance: f64,
    },
    /// Centroid distance threshold.
    CentroidDistance {
        /// Inclusive distance bound.
        max_distance: f64,
    },
}

impl Default for OverlapPolicyConfig {
    fn default() -> Self {
        Self::BoundingBox { tolerance: 0.0 }
    }
}

impl OverlapPolicyConfig {
    /// Instantiate the configured policy.
    #[must_use]
    pub fn create(&self) -> Box<dyn IntersectionPolicy> {
        match *self {
            Self::BoundingBox { tolerance } => Box::new(BoundingBoxOverlap { tolerance }),
            Self::CentroidDistance { max_distance } => {
                Box::new(CentroidDistanceOverlap { max_distance })
            }
        }
    }

    /// Validate parameter ranges.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] for negative tolerance or
    /// non-positive distance bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::BoundingBox { tolerance } => {
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(ConfigError::invalid_parameter(format!(
                        "overlap tolerance must be finite and >= 0, got {tolerance}"
                    )));
                }
            }
            Self::CentroidDistance { max_distance } => {
                if !max_distance.is_finite() || max_distance <= 0.0 {
                    return Err(ConfigError::invalid_parameter(format!(
                        "centroid max_distance must be finite and > 0, got {max_distance}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parameters of the information-bottleneck edge selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbSelectorConfig {
    /// Softmax temperature used when turning task scores into `p(y|x)`.
    pub temperature: f64,

    /// Normalized information-loss threshold: adjacent clusters merge while
    /// the minimum pair cost stays at or below this value.
    pub merge_threshold: f64,
}

impl Default for IbSelectorConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            merge_threshold: 0.1,
        }
    }
}

impl IbSelectorConfig {
    /// Validate parameter ranges.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] for non-positive temperature or a
    /// negative/non-finite threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(ConfigError::invalid_parameter(format!(
                "selector temperature must be finite and > 0, got {}",
                self.temperature
            )));
        }
        if !self.merge_threshold.is_finite() || self.merge_threshold < 0.0 {
            return Err(ConfigError::invalid_parameter(format!(
                "selector merge_threshold must be finite and >= 0, got {}",
                self.merge_threshold
            )));
        }
        Ok(())
    }
}

/// Configuration surface of the update driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectUpdateConfig {
    /// Namespace prefix for generated object node ids.
    pub prefix: char,

    /// Overlap/edge-acceptance policy.
    pub edge_policy: OverlapPolicyConfig,

    /// Clustering edge-selection parameters.
    pub selector: IbSelectorConfig,

    /// Minimum best-match score for a segment to participate at all;
    /// segments below it are permanently ignored.
    pub min_segment_score: f32,

    /// Minimum best-match score of a merged cluster for an object node to
    /// be materialized.
    pub min_object_score: f32,

    /// Maximum acceptable object→place attachment distance. A nearest
    /// neighbor beyond it is still linked but flagged as a data-quality
    /// warning. `<= 0` disables the bound.
    pub neighbor_max_distance: f64,
}

impl Default for ObjectUpdateConfig {
    fn default() -> Self {
        Self {
            prefix: 'O',
            edge_policy: OverlapPolicyConfig::default(),
            selector: IbSelectorConfig::default(),
            min_segment_score: 0.0,
            min_object_score: 0.0,
            neighbor_max_distance: 0.0,
        }
    }
}

impl ObjectUpdateConfig {
    /// Validate all fields.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.prefix.is_ascii_alphanumeric() {
            return Err(ConfigError::invalid_parameter(format!(
                "object id prefix must be ASCII alphanumeric, got {:?}",
                self.prefix
            )));
        }
        self.edge_policy.validate()?;
        self.selector.validate()?;
        if !self.min_segment_score.is_finite() {
            return Err(ConfigError::invalid_parameter(format!(
                "min_segment_score must be finite, got {}",
                self.min_segment_score
            )));
        }
        if !self.min_object_score.is_finite() {
            return Err(ConfigError::invalid_parameter(format!(
                "min_object_score must be finite, got {}",
                self.min_object_score
            )));
        }
        if !self.neighbor_max_distance.is_finite() {
            return Err(ConfigError::invalid_parameter(format!(
                "neighbor_max_distance must be finite, got {}",
                self.neighbor_max_distance
            )));
        }
        Ok(())
    }

    /// Builder: set score thresholds.
    #[must_use]
    pub fn with_scores(mut self, min_segment_score: f32, min_object_score: f32) -> Self {
        self.min_segment_score = min_segment_score;
        self.min_object_score = min_object_score;
        self
    }

    /// Builder: set the object id prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: char) -> Self {
        self.prefix = prefix;
        self
    }

    /// Builder: set the neighbor attachment bound.
    #[must_use]
    pub fn with_neighbor_max_distance(mut self, distance: f64) -> Self {
        self.neighbor_max_distance = distance;
        self
    }

    /// Builder: set the overlap policy.
    #[must_use]
    pub fn with_edge_policy(mut self, policy: OverlapPolicyConfig) -> Self {
        self.edge_policy = policy;
        self
    }

    /// Builder: set the selector parameters.
    #[must_use]
    pub fn with_selector(mut self, selector: IbSelectorConfig) -> Self {
        self.selector = selector;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ObjectUpdateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.prefix, 'O');
        assert_eq!(
            config.edge_policy,
            OverlapPolicyConfig::BoundingBox { tolerance: 0.0 }
        );
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let config = ObjectUpdateConfig::default().with_selector(IbSelectorConfig {
            temperature: 0.0,
            merge_threshold: 0.1,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let config = ObjectUpdateConfig::default()
            .with_edge_policy(OverlapPolicyConfig::BoundingBox { tolerance: -1.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_alphanumeric_prefix_rejected() {
        let config = ObjectUpdateConfig::default().with_prefix('\n');
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ObjectUpdateConfig = serde_json::from_str(
            r#"{
                "prefix": "B",
                "min_segment_score": 0.4,
                "edge_policy": {"type": "centroid_distance", "max_distance": 2.5}
            }"#,
        )
        .unwrap();
        assert_eq!(config.prefix, 'B');
        assert_eq!(config.min_segment_score, 0.4);
        assert_eq!(
            config.edge_policy,
            OverlapPolicyConfig::CentroidDistance { max_distance: 2.5 }
        );
        assert_eq!(config.selector, IbSelectorConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders_do_not_auto_clamp() {
        let config = ObjectUpdateConfig::default().with_neighbor_max_distance(f64::NAN);
        assert!((config.neighbor_max_distance).is_nan());
        assert!(config.validate().is_err());
    }
}
