//! Spatial index over a growing point set
//!
//! Points are addressed by insertion position for the lifetime of the index
//! (until `clear`). New points append and are immediately searchable.
//! Queries run against an incremental k-d tree; after positional
//! replacement the tree is marked stale and queries fall back to an exact
//! linear scan until the next mutation through `&mut self` rebuilds it.
//!
//! Incremental insertion of a trajectory tends to produce a skewed tree, so
//! the tree is rebuilt balanced whenever the point count doubles since the
//! last rebuild.

mod kdtree;

use tracing::trace;

use crate::error::{ProjectionError, Result};
use crate::point::DataPoint;
use kdtree::{Candidate, KdTree, Neighborhood};

/// Outcome of inserting a point with a uniqueness tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The point was stored at `index`.
    Added { index: usize },
    /// A stored point at `existing` lies within tolerance; nothing was stored.
    Duplicate { existing: usize },
}

impl Insertion {
    /// Position of the newly added point.
    pub fn added(&self) -> Option<usize> {
        match self {
            Self::Added { index } => Some(*index),
            Self::Duplicate { .. } => None,
        }
    }

    /// Position of the conflicting point for a rejected insertion.
    pub fn existing(&self) -> Option<usize> {
        match self {
            Self::Added { .. } => None,
            Self::Duplicate { existing } => Some(*existing),
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added { .. })
    }
}

/// Minimum size before doubling-triggered rebalancing kicks in.
const REBALANCE_FLOOR: usize = 32;

/// Incremental nearest-neighbor index over points of one dimensionality.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    dimensions: usize,
    points: Vec<DataPoint>,
    tree: KdTree,
    stale: bool,
    rebalance_at: usize,
}

impl SpatialIndex {
    /// Create an empty index for points of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            points: Vec::new(),
            tree: KdTree::new(dimensions),
            stale: false,
            rebalance_at: REBALANCE_FLOOR,
        }
    }

    /// Bulk-load an index from a point list, preserving order.
    pub fn from_points(dimensions: usize, points: Vec<DataPoint>) -> Result<Self> {
        let mut index = Self::new(dimensions);
        for point in &points {
            index.check_dimension(point)?;
        }
        index.points = points;
        index.rebuild();
        Ok(index)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stored points in position order.
    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.points.iter()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    fn check_dimension(&self, point: &DataPoint) -> Result<()> {
        if point.dimension() != self.dimensions {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.dimensions,
                actual: point.dimension(),
            });
        }
        Ok(())
    }

    fn check_position(&self, index: usize) -> Result<()> {
        if index >= self.points.len() {
            return Err(ProjectionError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(())
    }

    /// Insert `point` at the next position unless a stored point lies within
    /// `tolerance`. A negative tolerance disables the check.
    pub fn insert(&mut self, point: DataPoint, tolerance: f64) -> Result<Insertion> {
        self.check_dimension(&point)?;

        if tolerance >= 0.0 {
            if let Some(existing) = self.nearest(&point) {
                if point.is_within(&self.points[existing], tolerance) {
                    trace!(existing, tolerance, "insert rejected as duplicate");
                    return Ok(Insertion::Duplicate { existing });
                }
            }
        }

        if self.stale {
            self.rebuild();
        }

        let index = self.points.len();
        self.points.push(point);
        self.tree.insert(&self.points, index);

        if self.points.len() >= self.rebalance_at {
            self.rebuild();
        }

        Ok(Insertion::Added { index })
    }

    /// Point at `index`.
    pub fn get(&self, index: usize) -> Result<&DataPoint> {
        self.check_position(index)?;
        Ok(&self.points[index])
    }

    /// Replace the point at `index`.
    pub fn set(&mut self, index: usize, point: DataPoint) -> Result<()> {
        self.check_position(index)?;
        self.check_dimension(&point)?;
        self.points[index] = point;
        self.stale = true;
        Ok(())
    }

    /// Replace every point at once. The count must be unchanged.
    pub(crate) fn replace_all(&mut self, points: Vec<DataPoint>) -> Result<()> {
        if points.len() != self.points.len() {
            return Err(ProjectionError::IndexOutOfRange {
                index: points.len(),
                len: self.points.len(),
            });
        }
        for point in &points {
            self.check_dimension(point)?;
        }
        self.points = points;
        self.rebuild();
        Ok(())
    }

    /// Drop every point at position `len` or later.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.points.len() {
            return;
        }
        self.points.truncate(len);
        self.rebuild();
    }

    /// Append every point of `other`, preserving relative order.
    pub fn add_all(&mut self, other: &SpatialIndex) -> Result<()> {
        if other.dimensions != self.dimensions {
            return Err(ProjectionError::DimensionMismatch {
                expected: self.dimensions,
                actual: other.dimensions,
            });
        }
        self.points.extend(other.points.iter().cloned());
        self.rebuild();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.tree.clear();
        self.stale = false;
        self.rebalance_at = REBALANCE_FLOOR;
    }

    /// Rebuild the tree balanced over the current coordinates.
    pub fn rebuild(&mut self) {
        self.tree.rebuild(&self.points);
        self.stale = false;
        self.rebalance_at = (self.points.len() * 2).max(REBALANCE_FLOOR);
        trace!(
            points = self.tree.len(),
            depth = self.tree.depth(),
            "index rebuilt"
        );
    }

    /// Position of the closest stored point, lowest position on ties.
    pub fn nearest(&self, point: &DataPoint) -> Option<usize> {
        if self.points.is_empty() || point.dimension() != self.dimensions {
            return None;
        }
        self.search(1, point, &|_| true)
            .first()
            .map(|c| c.position)
    }

    /// The `k` closest positions in ascending distance order.
    ///
    /// Fails with `InsufficientPoints` unless `k < len()`.
    pub fn k_nearest(&self, k: usize, point: &DataPoint) -> Result<Vec<usize>> {
        self.check_dimension(point)?;
        if k >= self.points.len() {
            return Err(ProjectionError::InsufficientPoints {
                requested: k,
                available: self.points.len(),
            });
        }
        Ok(self.search(k, point, &|_| true).into_iter().map(|c| c.position).collect())
    }

    /// The `k` closest positions among positions `< limit`, with distances.
    ///
    /// Used to place the point stored at `limit` relative to the points that
    /// preceded it.
    pub fn k_nearest_among(&self, k: usize, point: &DataPoint, limit: usize) -> Result<Vec<(usize, f64)>> {
        self.check_dimension(point)?;
        let available = limit.min(self.points.len());
        if k > available {
            return Err(ProjectionError::InsufficientPoints {
                requested: k,
                available,
            });
        }
        Ok(self
            .search(k, point, &|p| p < available)
            .into_iter()
            .map(|c| (c.position, c.distance_squared.sqrt()))
            .collect())
    }

    fn search(&self, k: usize, point: &DataPoint, accept: &dyn Fn(usize) -> bool) -> Vec<Candidate> {
        let mut neighborhood = Neighborhood::new(k, accept);
        if self.stale {
            for (position, stored) in self.points.iter().enumerate() {
                neighborhood.consider(position, point.distance_squared(stored));
            }
        } else {
            self.tree.search(&self.points, point, &mut neighborhood);
        }
        neighborhood.into_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(n: usize) -> SpatialIndex {
        let mut index = SpatialIndex::new(2);
        for i in 0..n {
            index
                .insert(DataPoint::from([i as f64, 0.0]), -1.0)
                .unwrap();
        }
        index
    }

    #[test]
    fn truncate_drops_trailing_positions() {
        let mut index = line(40);
        index.truncate(10);
        assert_eq!(index.len(), 10);
        assert_eq!(index.nearest(&DataPoint::from([35.0, 0.0])), Some(9));
        index.truncate(20);
        assert_eq!(index.len(), 10);
        let next = index.insert(DataPoint::from([0.5, 0.0]), -1.0).unwrap();
        assert_eq!(next, Insertion::Added { index: 10 });
    }

    #[test]
    fn insert_appends_positions() {
        let mut index = SpatialIndex::new(2);
        let first = index.insert(DataPoint::from([0.0, 0.0]), -1.0).unwrap();
        let second = index.insert(DataPoint::from([1.0, 0.0]), -1.0).unwrap();
        assert_eq!(first, Insertion::Added { index: 0 });
        assert_eq!(second, Insertion::Added { index: 1 });
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn insert_within_tolerance_is_rejected() {
        let mut index = SpatialIndex::new(2);
        index.insert(DataPoint::from([1.0, 1.0]), 0.0).unwrap();
        let result = index.insert(DataPoint::from([1.0, 1.0]), 0.0).unwrap();
        assert_eq!(result, Insertion::Duplicate { existing: 0 });
        assert_eq!(index.len(), 1);

        let near = index.insert(DataPoint::from([1.0, 1.05]), 0.1).unwrap();
        assert_eq!(near.existing(), Some(0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn negative_tolerance_always_inserts() {
        let mut index = SpatialIndex::new(2);
        index.insert(DataPoint::from([1.0, 1.0]), -1.0).unwrap();
        let result = index.insert(DataPoint::from([1.0, 1.0]), -1.0).unwrap();
        assert!(result.is_added());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn wrong_dimension_rejected() {
        let mut index = SpatialIndex::new(2);
        let result = index.insert(DataPoint::from([1.0, 2.0, 3.0]), -1.0);
        assert!(matches!(
            result,
            Err(ProjectionError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn get_and_set_out_of_range() {
        let mut index = line(3);
        assert!(matches!(
            index.get(3),
            Err(ProjectionError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(index.set(5, DataPoint::from([0.0, 0.0])).is_err());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn nearest_breaks_ties_by_position() {
        let index = line(5);
        // Equidistant from positions 1 and 2
        assert_eq!(index.nearest(&DataPoint::from([1.5, 0.0])), Some(1));
        assert_eq!(index.nearest(&DataPoint::from([3.9, 0.0])), Some(4));
        assert_eq!(SpatialIndex::new(2).nearest(&DataPoint::from([0.0, 0.0])), None);
    }

    #[test]
    fn k_nearest_ordering_and_prefix() {
        let index = line(8);
        let query = DataPoint::from([3.2, 0.5]);
        let three = index.k_nearest(3, &query).unwrap();
        let four = index.k_nearest(4, &query).unwrap();
        assert_eq!(three, vec![3, 4, 2]);
        assert_eq!(&four[..3], &three[..]);
    }

    #[test]
    fn k_nearest_requires_more_points_than_k() {
        let index = line(3);
        assert!(matches!(
            index.k_nearest(3, &DataPoint::from([0.0, 0.0])),
            Err(ProjectionError::InsufficientPoints { requested: 3, available: 3 })
        ));
        assert_eq!(index.k_nearest(2, &DataPoint::from([0.0, 0.0])).unwrap(), vec![0, 1]);
    }

    #[test]
    fn k_nearest_among_prefix_only() {
        let index = line(6);
        let query = index.get(5).unwrap().clone();
        let found = index.k_nearest_among(2, &query, 5).unwrap();
        assert_eq!(found, vec![(4, 1.0), (3, 2.0)]);
        assert!(index.k_nearest_among(6, &query, 5).is_err());
    }

    #[test]
    fn set_keeps_queries_exact() {
        let mut index = line(5);
        index.set(0, DataPoint::from([10.0, 0.0])).unwrap();
        assert_eq!(index.nearest(&DataPoint::from([9.0, 0.0])), Some(0));

        // Insert after set rebuilds and stays exact
        index.insert(DataPoint::from([9.5, 0.0]), -1.0).unwrap();
        assert_eq!(index.k_nearest(2, &DataPoint::from([9.6, 0.0])).unwrap(), vec![5, 0]);
    }

    #[test]
    fn add_all_preserves_order() {
        let source = line(4);
        let mut target = SpatialIndex::new(2);
        target.insert(DataPoint::from([-1.0, -1.0]), -1.0).unwrap();
        target.add_all(&source).unwrap();
        assert_eq!(target.len(), 5);
        assert_eq!(target.get(1).unwrap(), source.get(0).unwrap());
        assert_eq!(target.get(4).unwrap(), source.get(3).unwrap());
    }

    #[test]
    fn long_trajectory_stays_searchable() {
        // Crosses several doubling rebuilds
        let mut index = SpatialIndex::new(3);
        for i in 0..200 {
            let t = i as f64 * 0.1;
            index
                .insert(DataPoint::from([t.cos(), t.sin(), t]), -1.0)
                .unwrap();
        }
        let query = DataPoint::from([(5.0f64).cos(), (5.0f64).sin(), 5.0]);
        assert_eq!(index.nearest(&query), Some(50));
    }
}
