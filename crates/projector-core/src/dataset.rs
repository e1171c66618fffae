//! Dataset: a spatial index plus a memoized pairwise-distance cache
//!
//! Statistics are computed by direct iteration on demand; nothing is
//! maintained incrementally, so variance and covariance queries cost
//! `O(N·D)` and `O(N·D²)` respectively, and the min/max/sum distance
//! reductions cost `O(N²)`.

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::cache::DistanceCache;
use crate::error::{ProjectionError, Result};
use crate::index::{Insertion, SpatialIndex};
use crate::point::DataPoint;

/// Tolerance value that disables the uniqueness check on insertion.
pub const NO_TOLERANCE: f64 = -1.0;

/// A growing collection of equal-length points with cached distances.
#[derive(Debug, Clone)]
pub struct Dataset {
    dimensions: usize,
    index: SpatialIndex,
    distances: DistanceCache,
    rng: ChaCha8Rng,
}

impl Dataset {
    /// Create an empty dataset for points of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self::with_rng(dimensions, ChaCha8Rng::from_entropy())
    }

    /// Create an empty dataset whose randomized operations are reproducible.
    pub fn with_seed(dimensions: usize, seed: u64) -> Self {
        Self::with_rng(dimensions, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(dimensions: usize, rng: ChaCha8Rng) -> Self {
        Self {
            dimensions,
            index: SpatialIndex::new(dimensions),
            distances: DistanceCache::new(),
            rng,
        }
    }

    /// Create a dataset pre-populated with `count` zero vectors.
    pub fn with_zero_points(dimensions: usize, count: usize) -> Self {
        let mut dataset = Self::new(dimensions);
        dataset.fill_zero_points(count);
        dataset
    }

    pub(crate) fn fill_zero_points(&mut self, count: usize) {
        let points = vec![DataPoint::zeros(self.dimensions); count];
        // Dimensions match by construction
        if let Ok(index) = SpatialIndex::from_points(self.dimensions, points) {
            self.index = index;
        }
        self.distances.clear();
        self.distances.ensure_points(count);
    }

    /// Reseed the generator used by `randomize` and perturbation.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Entries currently allocated in the distance cache.
    pub fn cache_capacity(&self) -> usize {
        self.distances.capacity()
    }

    /// Check a point against this dataset's dimension.
    ///
    /// A single-component point is accepted by any dataset and broadcast to
    /// every dimension.
    fn conform(&self, point: DataPoint) -> Result<DataPoint> {
        let actual = point.dimension();
        if actual == self.dimensions {
            return Ok(point);
        }
        if actual == 1 {
            let value = point.components()[0];
            return Ok(DataPoint::new(vec![value; self.dimensions]));
        }
        Err(ProjectionError::DimensionMismatch {
            expected: self.dimensions,
            actual,
        })
    }

    /// Insert unconditionally.
    pub fn add_point(&mut self, point: DataPoint) -> Result<Insertion> {
        self.add_point_with_tolerance(point, NO_TOLERANCE)
    }

    /// Insert unless a stored point lies within `tolerance`.
    pub fn add_point_with_tolerance(&mut self, point: DataPoint, tolerance: f64) -> Result<Insertion> {
        let point = self.conform(point)?;
        let insertion = self.index.insert(point, tolerance)?;
        if insertion.is_added() {
            self.distances.ensure_points(self.index.len());
        }
        Ok(insertion)
    }

    pub fn point(&self, index: usize) -> Result<&DataPoint> {
        self.index.get(index)
    }

    /// Component `dimension` of the point at `index`.
    pub fn component(&self, index: usize, dimension: usize) -> Result<f64> {
        let point = self.index.get(index)?;
        point
            .get(dimension)
            .ok_or(ProjectionError::IndexOutOfRange {
                index: dimension,
                len: self.dimensions,
            })
    }

    /// Replace the point at `index`, forgetting its cached distances.
    pub fn set_point(&mut self, index: usize, point: DataPoint) -> Result<()> {
        let point = self.conform(point)?;
        self.index.set(index, point)?;
        self.distances.invalidate_point(index, self.index.len());
        Ok(())
    }

    /// Replace every point in one pass. Used by iterative optimizers.
    pub(crate) fn replace_points(&mut self, points: Vec<DataPoint>) -> Result<()> {
        self.index.replace_all(points)?;
        self.distances.invalidate_all();
        Ok(())
    }

    /// Drop every point at position `len` or later with its cached distances.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.distances.truncate(len);
        self.index.truncate(len);
    }

    /// Stored points in position order.
    pub fn points(&self) -> &[DataPoint] {
        self.index.points()
    }

    /// Copy of every point's components, in position order.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.points().iter().map(|p| p.components().to_vec()).collect()
    }

    fn check_pair(&self, i: usize, j: usize) -> Result<()> {
        let len = self.len();
        for index in [i, j] {
            if index >= len {
                return Err(ProjectionError::IndexOutOfRange { index, len });
            }
        }
        Ok(())
    }

    /// Distance between points `i` and `j`, memoized.
    pub fn distance(&mut self, i: usize, j: usize) -> Result<f64> {
        self.check_pair(i, j)?;
        if i == j {
            return Ok(0.0);
        }
        if let Some(cached) = self.distances.get(i, j) {
            return Ok(cached);
        }
        let points = self.index.points();
        let value = points[i].distance(&points[j]);
        self.distances.put(i, j, value);
        Ok(value)
    }

    /// Distance between points `i` and `j` without touching the cache
    /// beyond reading it.
    pub fn peek_distance(&self, i: usize, j: usize) -> Result<f64> {
        self.check_pair(i, j)?;
        if i == j {
            return Ok(0.0);
        }
        if let Some(cached) = self.distances.get(i, j) {
            return Ok(cached);
        }
        let points = self.index.points();
        Ok(points[i].distance(&points[j]))
    }

    /// Legacy distance lookup: invalid indices log a warning and yield 0.
    pub fn distance_or_zero(&mut self, i: usize, j: usize) -> f64 {
        match self.distance(i, j) {
            Ok(value) => value,
            Err(e) => {
                warn!("distance({}, {}) failed: {}", i, j, e);
                0.0
            }
        }
    }

    /// Position of the stored point closest to `point`.
    pub fn closest_index(&self, point: &DataPoint) -> Option<usize> {
        self.index.nearest(point)
    }

    /// The `k` nearest stored positions, or `None` unless `k < len()`.
    pub fn k_nearest_neighbors(&self, k: usize, point: &DataPoint) -> Option<Vec<usize>> {
        match self.index.k_nearest(k, point) {
            Ok(found) => Some(found),
            Err(e) => {
                debug!("k-nearest query unavailable: {}", e);
                None
            }
        }
    }

    /// The `k` nearest positions among positions `< limit`, with distances.
    pub fn k_nearest_among(&self, k: usize, point: &DataPoint, limit: usize) -> Result<Vec<(usize, f64)>> {
        self.index.k_nearest_among(k, point, limit)
    }

    /// Compute and memoize every pairwise distance.
    pub fn calculate_distances(&mut self) {
        let n = self.len();
        self.distances.ensure_points(n);
        let points = self.index.points();
        for i in 1..n {
            for j in 0..i {
                if self.distances.get(i, j).is_none() {
                    self.distances.put(i, j, points[i].distance(&points[j]));
                }
            }
        }
    }

    /// Every pairwise distance in triangular order: `(1,0), (2,0), (2,1), ...`
    pub fn pairwise_distances(&mut self) -> Vec<f64> {
        self.calculate_distances();
        let n = self.len();
        let points = self.index.points();
        let mut out = Vec::with_capacity(crate::cache::required_capacity(n));
        for i in 1..n {
            for j in 0..i {
                let value = self
                    .distances
                    .get(i, j)
                    .unwrap_or_else(|| points[i].distance(&points[j]));
                out.push(value);
            }
        }
        out
    }

    pub fn minimum_distance(&mut self) -> f64 {
        self.pairwise_distances()
            .into_iter()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    pub fn maximum_distance(&mut self) -> f64 {
        self.pairwise_distances()
            .into_iter()
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    pub fn sum_distances(&mut self) -> f64 {
        self.pairwise_distances().into_iter().sum()
    }

    fn check_dimension_index(&self, dimension: usize) -> Result<()> {
        if dimension >= self.dimensions {
            return Err(ProjectionError::IndexOutOfRange {
                index: dimension,
                len: self.dimensions,
            });
        }
        Ok(())
    }

    /// Mean of component `dimension` over all points (0 when empty).
    pub fn mean(&self, dimension: usize) -> Result<f64> {
        self.check_dimension_index(dimension)?;
        if self.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = self.points().iter().map(|p| p.components()[dimension]).sum();
        Ok(sum / self.len() as f64)
    }

    /// Mean of every component.
    pub fn mean_point(&self) -> DataPoint {
        let mut sums = vec![0.0; self.dimensions];
        for point in self.points() {
            for (sum, value) in sums.iter_mut().zip(point.components()) {
                *sum += value;
            }
        }
        if !self.is_empty() {
            let n = self.len() as f64;
            sums.iter_mut().for_each(|s| *s /= n);
        }
        DataPoint::new(sums)
    }

    /// Sample covariance of components `i` and `j` (0 with fewer than 2 points).
    pub fn covariance(&self, i: usize, j: usize) -> Result<f64> {
        self.check_dimension_index(i)?;
        self.check_dimension_index(j)?;
        let n = self.len();
        if n < 2 {
            return Ok(0.0);
        }
        let mean_i = self.mean(i)?;
        let mean_j = self.mean(j)?;
        let sum: f64 = self
            .points()
            .iter()
            .map(|p| {
                let c = p.components();
                (c[i] - mean_i) * (c[j] - mean_j)
            })
            .sum();
        Ok(sum / (n - 1) as f64)
    }

    pub fn variance(&self, dimension: usize) -> Result<f64> {
        self.covariance(dimension, dimension)
    }

    /// Full `D × D` sample covariance matrix.
    pub fn covariance_matrix(&self) -> DMatrix<f64> {
        let d = self.dimensions;
        let n = self.len();
        let mut matrix = DMatrix::zeros(d, d);
        if n < 2 {
            return matrix;
        }
        let mean = self.mean_point();
        let mean = mean.components();
        for point in self.points() {
            let c = point.components();
            for i in 0..d {
                let di = c[i] - mean[i];
                for j in i..d {
                    matrix[(i, j)] += di * (c[j] - mean[j]);
                }
            }
        }
        let divisor = (n - 1) as f64;
        for i in 0..d {
            for j in i..d {
                let value = matrix[(i, j)] / divisor;
                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
        matrix
    }

    /// Dimension with the `k`-th largest variance, `k` counted from 1.
    ///
    /// Ties keep the lower dimension first.
    pub fn kth_variant_dimension(&self, k: usize) -> Result<usize> {
        if k == 0 || k > self.dimensions {
            return Err(ProjectionError::IndexOutOfRange {
                index: k,
                len: self.dimensions,
            });
        }
        let mut ranked: Vec<(usize, f64)> = (0..self.dimensions)
            .map(|d| self.variance(d).map(|v| (d, v)))
            .collect::<Result<_>>()?;
        // Stable sort keeps first-encountered order among equal variances
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked[k - 1].0)
    }

    /// Nudge apart every pair of coincident points (or points whose distance
    /// is NaN) by `Uniform(-0.5, 0.5) * factor` per component.
    ///
    /// The later point of each pair moves. Returns how many points moved.
    pub fn perturb_overlapping_points(&mut self, factor: f64) -> usize {
        let n = self.len();
        let mut moved = 0;
        for i in 1..n {
            let overlaps = (0..i).any(|j| {
                let d = self.peek_distance(i, j).unwrap_or(f64::NAN);
                d == 0.0 || d.is_nan()
            });
            if !overlaps {
                continue;
            }

            let current = self.points()[i].components().to_vec();
            let mut nudged = Vec::with_capacity(current.len());
            for c in current {
                let nudge = (self.rng.gen::<f64>() - 0.5) * factor;
                // Non-finite components are replaced rather than shifted
                nudged.push(if c.is_finite() { c + nudge } else { nudge });
            }

            if self.set_point(i, DataPoint::new(nudged)).is_ok() {
                moved += 1;
            }
        }
        if moved > 0 {
            debug!(moved, factor, "perturbed overlapping points");
        }
        moved
    }

    /// Replace every component with `Uniform(0, upper_bound)`.
    pub fn randomize(&mut self, upper_bound: f64) {
        let (count, dimensions) = (self.len(), self.dimensions);
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let components: Vec<f64> = (0..dimensions)
                .map(|_| self.rng.gen::<f64>() * upper_bound)
                .collect();
            points.push(DataPoint::new(components));
        }
        if let Err(e) = self.replace_points(points) {
            warn!("randomize failed: {}", e);
        }
        debug!(points = self.len(), upper_bound, "randomized dataset");
    }

    /// Become a copy of `other`: same dimension, same points in the same
    /// order, with a cache of our own.
    pub fn mirror(&mut self, other: &Dataset) {
        self.dimensions = other.dimensions;
        self.index = other.index.clone();
        self.distances = DistanceCache::new();
        self.distances.ensure_points(self.index.len());
        debug!(
            points = self.len(),
            dimensions = self.dimensions,
            "mirrored dataset"
        );
    }

    /// Remove every point and cached distance.
    pub fn clear(&mut self) {
        self.index.clear();
        self.distances.clear();
    }
}
