//! Fixed-length numeric vectors
//!
//! A `DataPoint` is the unit stored in every dataset, upstairs or downstairs.
//! Its length never changes after construction; replacing a point means
//! building a new one.

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// An immutable-length vector of `f64` components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPoint {
    components: Vec<f64>,
}

impl DataPoint {
    /// Create a point from its components.
    pub fn new(components: Vec<f64>) -> Self {
        Self { components }
    }

    /// Create a point with `dimensions` zero components.
    pub fn zeros(dimensions: usize) -> Self {
        Self {
            components: vec![0.0; dimensions],
        }
    }

    /// Number of components.
    pub fn dimension(&self) -> usize {
        self.components.len()
    }

    /// Component at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.components.get(index).copied()
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    pub fn into_components(self) -> Vec<f64> {
        self.components
    }

    fn check_dimension(&self, other: &DataPoint) -> Result<()> {
        if self.dimension() != other.dimension() {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        Ok(())
    }

    /// Squared Euclidean distance, or `DimensionMismatch` when `other` has a
    /// different length.
    pub fn try_distance_squared(&self, other: &DataPoint) -> Result<f64> {
        self.check_dimension(other)?;
        Ok(self.distance_squared(other))
    }

    /// Euclidean distance, or `DimensionMismatch` when `other` has a
    /// different length.
    pub fn try_distance(&self, other: &DataPoint) -> Result<f64> {
        self.try_distance_squared(other).map(f64::sqrt)
    }

    /// Squared Euclidean distance.
    ///
    /// # Panics
    ///
    /// If the points have different dimensions. Datasets never compare points
    /// of different lengths; use `try_distance_squared` for unchecked input.
    pub fn distance_squared(&self, other: &DataPoint) -> f64 {
        assert_eq!(
            self.dimension(),
            other.dimension(),
            "vector dimension mismatch: {} vs {}",
            self.dimension(),
            other.dimension()
        );

        self.components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// Euclidean distance. Panics like `distance_squared`.
    pub fn distance(&self, other: &DataPoint) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// True when `other` lies within `tolerance` of this point.
    ///
    /// A negative tolerance never matches, nor does a point of another
    /// dimension.
    pub fn is_within(&self, other: &DataPoint, tolerance: f64) -> bool {
        tolerance >= 0.0 && matches!(self.try_distance(other), Ok(d) if d <= tolerance)
    }

    /// True if any component is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.components.iter().any(|c| !c.is_finite())
    }
}

impl From<Vec<f64>> for DataPoint {
    fn from(components: Vec<f64>) -> Self {
        Self::new(components)
    }
}

impl From<&[f64]> for DataPoint {
    fn from(components: &[f64]) -> Self {
        Self::new(components.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for DataPoint {
    fn from(components: [f64; N]) -> Self {
        Self::new(components.to_vec())
    }
}

impl std::fmt::Display for DataPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "]")
    }
}
