//! Projector configuration
//!
//! Every field has a default, so a JSON document only needs to name what it
//! changes:
//!
//! ```rust
//! use projector_core::{ProjectionMethod, ProjectorConfig};
//!
//! let config = ProjectorConfig::from_json(r#"{"method": "sammon", "sammon": {"epsilon": 0.2}}"#).unwrap();
//! assert_eq!(config.method, ProjectionMethod::Sammon);
//! assert_eq!(config.sammon.epsilon, 0.2);
//! assert_eq!(config.tolerance, 0.1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::projection::ProjectionMethod;

/// Sammon mapping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SammonConfig {
    /// Gradient descent learning rate ("magic factor")
    pub epsilon: f64,
}

impl Default for SammonConfig {
    fn default() -> Self {
        Self { epsilon: 0.5 }
    }
}

/// Coordinate projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateConfig {
    /// Upstairs dimensions mapped to the low-dimensional x and y axes
    pub axes: [usize; 2],
    /// Use the two most-variant dimensions instead of `axes`
    pub auto_find: bool,
}

impl Default for CoordinateConfig {
    fn default() -> Self {
        Self {
            axes: [0, 1],
            auto_find: true,
        }
    }
}

/// Top-level projector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Projection method used until the host switches
    pub method: ProjectionMethod,
    /// Points closer than this to a stored point are rejected as duplicates
    /// (negative disables the check)
    pub tolerance: f64,
    /// Magnitude used when nudging coincident points apart (must be positive)
    pub perturbation: f64,
    pub sammon: SammonConfig,
    pub coordinate: CoordinateConfig,
    /// Seed for perturbation and randomize; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            method: ProjectionMethod::default(),
            tolerance: 0.1,
            perturbation: 0.1,
            sammon: SammonConfig::default(),
            coordinate: CoordinateConfig::default(),
            seed: None,
        }
    }
}

impl ProjectorConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ProjectionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance.is_nan() {
            return Err(ProjectionError::InvalidConfig(
                "tolerance must be a number".to_string(),
            ));
        }
        if !(self.perturbation > 0.0 && self.perturbation.is_finite()) {
            return Err(ProjectionError::InvalidConfig(format!(
                "perturbation must be finite and positive, got {}",
                self.perturbation
            )));
        }
        if !(self.sammon.epsilon > 0.0 && self.sammon.epsilon.is_finite()) {
            return Err(ProjectionError::InvalidConfig(format!(
                "sammon.epsilon must be finite and positive, got {}",
                self.sammon.epsilon
            )));
        }
        let [x, y] = self.coordinate.axes;
        if x == y {
            return Err(ProjectionError::InvalidConfig(format!(
                "coordinate.axes must name two different dimensions, got [{}, {}]",
                x, y
            )));
        }
        Ok(())
    }

    /// `validate`, plus checks that depend on the upstairs vector length.
    pub fn validate_for_dimensions(&self, dimensions: usize) -> Result<()> {
        self.validate()?;
        if self.coordinate.auto_find || dimensions < 2 {
            return Ok(());
        }
        if let Some(axis) = self.coordinate.axes.iter().find(|&&axis| axis >= dimensions) {
            return Err(ProjectionError::InvalidConfig(format!(
                "coordinate axis {} is out of range for {}-dimensional vectors",
                axis, dimensions
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        let config = ProjectorConfig::from_json("{}").unwrap();
        assert_eq!(config, ProjectorConfig::default());
        assert_eq!(config.method, ProjectionMethod::NnSubspace);
    }

    #[test]
    fn partial_document() {
        let config = ProjectorConfig::from_json(
            r#"{"tolerance": -1, "coordinate": {"axes": [2, 0]}, "seed": 11}"#,
        )
        .unwrap();
        assert_eq!(config.tolerance, -1.0);
        assert_eq!(config.coordinate.axes, [2, 0]);
        assert!(config.coordinate.auto_find);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.perturbation, 0.1);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ProjectorConfig::from_json(r#"{"perturbation": -0.5}"#).is_err());
        assert!(ProjectorConfig::from_json(r#"{"perturbation": 0}"#).is_err());
        assert!(ProjectorConfig::from_json(r#"{"sammon": {"epsilon": 0}}"#).is_err());
        assert!(ProjectorConfig::from_json(r#"{"coordinate": {"axes": [1, 1]}}"#).is_err());
        assert!(matches!(
            ProjectorConfig::from_json(r#"{"method": "tsne"}"#),
            Err(ProjectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn fixed_axes_must_exist() {
        let config = ProjectorConfig::from_json(
            r#"{"coordinate": {"axes": [0, 5], "auto_find": false}}"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate_for_dimensions(3),
            Err(ProjectionError::InvalidConfig(_))
        ));
        assert!(config.validate_for_dimensions(6).is_ok());
        // a single dimension never reads the configured axes
        assert!(config.validate_for_dimensions(1).is_ok());

        let auto = ProjectorConfig::from_json(r#"{"coordinate": {"axes": [0, 5]}}"#).unwrap();
        assert!(auto.validate_for_dimensions(3).is_ok());
    }

    #[test]
    fn method_names() {
        let config = ProjectorConfig::from_json(r#"{"method": "triangulate"}"#).unwrap();
        assert_eq!(config.method, ProjectionMethod::Triangulate);
    }
}
