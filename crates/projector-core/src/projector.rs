//! Projector: the host-facing entry point
//!
//! Owns the upstairs dataset (points as the host supplied them), the
//! downstairs dataset (their 2-D images, index-aligned) and the current
//! projection algorithm.

use tracing::{debug, info, warn};

use crate::config::ProjectorConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::index::Insertion;
use crate::point::DataPoint;
use crate::projection::{Algorithm, Projection, ProjectionMethod, LOW_DIMENSIONS};

#[derive(Debug, Clone)]
pub struct Projector {
    config: ProjectorConfig,
    upstairs: Dataset,
    downstairs: Dataset,
    algorithm: Algorithm,
    error: f64,
    current_point: Option<usize>,
}

impl Projector {
    /// Create a projector for `dimensions`-component vectors.
    pub fn new(dimensions: usize, config: ProjectorConfig) -> Result<Self> {
        config.validate_for_dimensions(dimensions)?;
        let (upstairs, downstairs) = match config.seed {
            Some(seed) => (
                Dataset::with_seed(dimensions, seed),
                Dataset::with_seed(LOW_DIMENSIONS, seed.wrapping_add(1)),
            ),
            None => (Dataset::new(dimensions), Dataset::new(LOW_DIMENSIONS)),
        };
        let algorithm = Algorithm::new(config.method, &config);
        debug!(dimensions, method = %config.method, "projector created");
        Ok(Self {
            config,
            upstairs,
            downstairs,
            algorithm,
            error: 0.0,
            current_point: None,
        })
    }

    /// Add a vector and project it.
    ///
    /// Returns `false` when the vector lies within the configured tolerance
    /// of a stored one; the stored point becomes the current point and
    /// nothing else changes.
    ///
    /// If the algorithm fails to place the vector it is removed again and the
    /// error is returned; upstairs and downstairs stay index-aligned.
    pub fn add_datapoint(&mut self, vector: impl Into<DataPoint>) -> Result<bool> {
        let insertion = self
            .upstairs
            .add_point_with_tolerance(vector.into(), self.config.tolerance)?;
        match insertion {
            Insertion::Added { index } => {
                if let Err(err) = self.place(index) {
                    warn!(index, error = %err, "projection failed, dropping vector");
                    self.roll_back(index);
                    return Err(err);
                }
                self.error = 0.0;
                self.current_point = Some(index);
                Ok(true)
            }
            Insertion::Duplicate { existing } => {
                debug!(existing, "vector already present");
                self.current_point = Some(existing);
                Ok(false)
            }
        }
    }

    fn place(&mut self, index: usize) -> Result<()> {
        self.algorithm
            .add_datapoint(&mut self.upstairs, &mut self.downstairs, index)?;
        if self.algorithm.is_iterable() {
            self.algorithm.init(&mut self.upstairs, &mut self.downstairs)?;
        }
        Ok(())
    }

    /// Remove the point at `index` and every image placed for it.
    fn roll_back(&mut self, index: usize) {
        self.upstairs.truncate(index);
        self.downstairs.truncate(index);
        if self.downstairs.len() == index {
            return;
        }
        // A reseeding algorithm may have rewritten fewer images than points
        if let Err(err) = self.algorithm.project(&mut self.upstairs, &mut self.downstairs) {
            warn!(error = %err, "re-projection failed, clearing images");
            self.downstairs.fill_zero_points(index);
        }
    }

    /// Run `times` optimization steps. Returns the error after the last one,
    /// or the current error when the algorithm does not iterate.
    pub fn iterate(&mut self, times: usize) -> Result<f64> {
        if !self.algorithm.is_iterable() {
            return Ok(self.error);
        }
        for _ in 0..times {
            self.error = self.algorithm.iterate(&mut self.upstairs, &mut self.downstairs)?;
        }
        Ok(self.error)
    }

    /// Switch algorithms, re-projecting every stored point.
    ///
    /// On failure the previous algorithm and images are kept.
    pub fn set_method(&mut self, method: ProjectionMethod) -> Result<()> {
        let mut algorithm = Algorithm::new(method, &self.config);
        let mut downstairs = self.downstairs.clone();
        algorithm.init(&mut self.upstairs, &mut downstairs)?;
        algorithm.project(&mut self.upstairs, &mut downstairs)?;
        self.downstairs = downstairs;
        self.algorithm = algorithm;
        self.config.method = method;
        self.error = 0.0;
        info!(method = %method, points = self.len(), "projection method changed");
        Ok(())
    }

    /// Switch algorithms by name, e.g. `"sammon"` or `"nn_subspace"`.
    pub fn set_method_by_name(&mut self, name: &str) -> Result<()> {
        self.set_method(name.parse()?)
    }

    /// Forget every point.
    pub fn reset(&mut self) {
        self.upstairs.clear();
        self.downstairs.clear();
        self.algorithm = Algorithm::new(self.config.method, &self.config);
        self.error = 0.0;
        self.current_point = None;
    }

    /// Upstairs vector length.
    pub fn dimensions(&self) -> usize {
        self.upstairs.dimensions()
    }

    pub fn len(&self) -> usize {
        self.upstairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstairs.is_empty()
    }

    /// Projected image of point `index`.
    pub fn point(&self, index: usize) -> Option<&DataPoint> {
        self.downstairs.point(index).ok()
    }

    /// Projected images as `[x, y]` pairs in insertion order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.downstairs
            .points()
            .iter()
            .map(|p| [p.get(0).unwrap_or(0.0), p.get(1).unwrap_or(0.0)])
            .collect()
    }

    pub fn upstairs(&self) -> &Dataset {
        &self.upstairs
    }

    pub fn downstairs(&self) -> &Dataset {
        &self.downstairs
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Error reported by the last iteration (0 after an add or a switch).
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Most recently added or re-submitted point.
    pub fn current_point(&self) -> Option<usize> {
        self.current_point
    }

    pub fn method(&self) -> ProjectionMethod {
        self.algorithm.method()
    }

    pub fn is_iterable(&self) -> bool {
        self.algorithm.is_iterable()
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }
}
