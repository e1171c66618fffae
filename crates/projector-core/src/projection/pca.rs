//! Principal component projection
//!
//! Centered points are projected onto the two eigenvectors of the sample
//! covariance matrix with the largest eigenvalues. Each eigenvector is
//! oriented so its largest-magnitude component is positive, which keeps the
//! picture from flipping between recomputations.

use nalgebra::{DMatrix, SymmetricEigen};
use tracing::{debug, warn};

use super::{leading_components, Projection, ProjectionMethod, LOW_DIMENSIONS};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::point::DataPoint;

const MAX_SWEEPS: usize = 1_000;

#[derive(Debug, Clone, Default)]
pub struct Pca {
    explained_variance: Vec<f64>,
}

impl Pca {
    pub fn new() -> Self {
        Self::default()
    }

    /// Eigenvalues of the retained components, largest first.
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Leading unit eigenvectors as rows, or `None` when the
    /// decomposition does not converge.
    fn principal_axes(&mut self, covariance: DMatrix<f64>) -> Option<Vec<Vec<f64>>> {
        let eigen = SymmetricEigen::try_new(covariance, f64::EPSILON, MAX_SWEEPS)?;
        let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let mut axes = Vec::with_capacity(LOW_DIMENSIONS);
        self.explained_variance.clear();
        for &column in order.iter().take(LOW_DIMENSIONS) {
            let mut axis: Vec<f64> = eigen.eigenvectors.column(column).iter().copied().collect();
            let dominant = axis
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            if dominant < 0.0 {
                axis.iter_mut().for_each(|v| *v = -*v);
            }
            axes.push(axis);
            self.explained_variance.push(eigen.eigenvalues[column]);
        }
        Some(axes)
    }

    fn fallback(&mut self, upstairs: &Dataset, downstairs: &mut Dataset) -> Result<()> {
        self.explained_variance.clear();
        downstairs.clear();
        for index in 0..upstairs.len() {
            downstairs.add_point(leading_components(upstairs, index)?)?;
        }
        Ok(())
    }
}

impl Projection for Pca {
    fn method(&self) -> ProjectionMethod {
        ProjectionMethod::Pca
    }

    fn init(&mut self, _upstairs: &mut Dataset, _downstairs: &mut Dataset) -> Result<()> {
        Ok(())
    }

    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        if upstairs.len() < 2 || upstairs.dimensions() < LOW_DIMENSIONS {
            return self.fallback(upstairs, downstairs);
        }
        if upstairs.points().iter().any(DataPoint::has_non_finite) {
            warn!("non-finite components, projecting leading coordinates instead");
            return self.fallback(upstairs, downstairs);
        }

        let Some(axes) = self.principal_axes(upstairs.covariance_matrix()) else {
            warn!("covariance eigen-decomposition did not converge");
            return self.fallback(upstairs, downstairs);
        };
        debug!(variance = ?self.explained_variance, "principal components");

        let mean = upstairs.mean_point();
        downstairs.clear();
        for point in upstairs.points() {
            let image: Vec<f64> = axes
                .iter()
                .map(|axis| {
                    point
                        .components()
                        .iter()
                        .zip(mean.components())
                        .zip(axis)
                        .map(|((x, m), a)| (x - m) * a)
                        .sum()
                })
                .collect();
            downstairs.add_point(DataPoint::new(image))?;
        }
        Ok(())
    }

    /// Every new point can move the principal axes.
    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, _index: usize) -> Result<()> {
        self.project(upstairs, downstairs)
    }
}
