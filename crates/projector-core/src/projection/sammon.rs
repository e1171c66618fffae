//! Sammon mapping
//!
//! Gradient descent on the stress
//!
//! ```text
//! E = (1/Σd*) · Σ_{i<j} (d*_ij − d_ij)² / d*_ij
//! ```
//!
//! where `d*` are upstairs distances (snapshotted by `init`) and `d` are the
//! current downstairs distances. Every step moves all points using the
//! coordinates from before the step.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, trace};

use super::{leading_components, Projection, ProjectionMethod, LOW_DIMENSIONS};
use crate::cache::{pair_slot, required_capacity};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::point::DataPoint;

#[derive(Debug, Clone)]
pub struct Sammon {
    epsilon: f64,
    perturbation: f64,
    /// Upstairs distances in triangular order
    dstar: Vec<f64>,
    dstar_sum: f64,
    error: f64,
}

impl Sammon {
    pub fn new(epsilon: f64, perturbation: f64) -> Self {
        Self {
            epsilon,
            perturbation,
            dstar: Vec::new(),
            dstar_sum: 0.0,
            error: 0.0,
        }
    }

    /// Learning rate applied to each gradient step.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Stress after the most recent `init` or `iterate`.
    pub fn error(&self) -> f64 {
        self.error
    }

    fn dstar(&self, i: usize, j: usize) -> f64 {
        self.dstar[pair_slot(i, j)]
    }

    fn stress(&self, downstairs: &mut Dataset) -> f64 {
        if self.dstar_sum <= 0.0 {
            return 0.0;
        }
        let current = downstairs.pairwise_distances();
        let total: f64 = self
            .dstar
            .iter()
            .zip(&current)
            .filter(|(target, _)| **target > 0.0)
            .map(|(target, d)| (target - d).powi(2) / target)
            .sum();
        total / self.dstar_sum
    }

    /// New position of point `m` given the pre-step configuration.
    fn step(&self, rows: &[Vec<f64>], m: usize) -> DataPoint {
        let ym = &rows[m];
        let mut gradient = vec![0.0; ym.len()];
        for (i, yi) in rows.iter().enumerate() {
            if i == m {
                continue;
            }
            let target = self.dstar(i, m);
            let d = yi
                .iter()
                .zip(ym)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            if target == 0.0 || d == 0.0 {
                continue;
            }
            let weight = (target - d) / (target * d);
            for (g, (a, b)) in gradient.iter_mut().zip(yi.iter().zip(ym)) {
                *g += weight * (a - b);
            }
        }
        let scale = 2.0 / self.dstar_sum;
        ym.iter()
            .zip(gradient)
            .map(|(y, g)| y - self.epsilon * scale * g)
            .collect::<Vec<_>>()
            .into()
    }

    fn seed(&self, upstairs: &Dataset, downstairs: &mut Dataset) -> Result<()> {
        downstairs.clear();
        for index in 0..upstairs.len() {
            downstairs.add_point(leading_components(upstairs, index)?)?;
        }
        Ok(())
    }
}

impl Projection for Sammon {
    fn method(&self) -> ProjectionMethod {
        ProjectionMethod::Sammon
    }

    fn init(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        if downstairs.len() != upstairs.len() {
            debug!(
                upstairs = upstairs.len(),
                downstairs = downstairs.len(),
                "seeding downstairs from leading components"
            );
            self.seed(upstairs, downstairs)?;
        }
        downstairs.perturb_overlapping_points(self.perturbation);
        self.dstar = upstairs.pairwise_distances();
        self.dstar_sum = self.dstar.iter().sum();
        self.error = self.stress(downstairs);
        trace!(points = upstairs.len(), error = self.error, "sammon init");
        Ok(())
    }

    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        self.init(upstairs, downstairs)
    }

    /// Start the new point on top of its nearest earlier neighbor's image,
    /// or at the origin when it is the first.
    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize) -> Result<()> {
        if downstairs.len() != index {
            return self.seed(upstairs, downstairs);
        }
        let placed = if index == 0 {
            DataPoint::zeros(LOW_DIMENSIONS)
        } else {
            let target = upstairs.point(index)?.clone();
            let nearest = upstairs.k_nearest_among(1, &target, index)?;
            match nearest.first() {
                Some(&(neighbor, _)) => downstairs.point(neighbor)?.clone(),
                None => DataPoint::zeros(LOW_DIMENSIONS),
            }
        };
        downstairs.add_point(placed)?;
        Ok(())
    }

    fn is_iterable(&self) -> bool {
        true
    }

    fn iterate(&mut self, _upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<f64> {
        let n = downstairs.len();
        if n < 2 || self.dstar.len() != required_capacity(n) || self.dstar_sum <= 0.0 {
            return Ok(self.error);
        }

        let rows = downstairs.to_rows();
        #[cfg(feature = "parallel")]
        let updated: Vec<DataPoint> = (0..n).into_par_iter().map(|m| self.step(&rows, m)).collect();
        #[cfg(not(feature = "parallel"))]
        let updated: Vec<DataPoint> = (0..n).map(|m| self.step(&rows, m)).collect();

        downstairs.replace_points(updated)?;
        self.error = self.stress(downstairs);
        Ok(self.error)
    }
}
