//! Lower-triangular memo of pairwise distances
//!
//! `d(i, j)` for `i > j` lives at `i(i-1)/2 + j` in a flat array. Unset
//! entries hold a negative sentinel. Capacity grows by a factor of four
//! whenever the triangle for the current point count no longer fits.

const UNSET: f64 = -1.0;
const INITIAL_CAPACITY: usize = 16;
const GROWTH_FACTOR: usize = 4;

/// Offset of the first entry of row `i`.
pub(crate) fn row_offset(i: usize) -> usize {
    i * i.saturating_sub(1) / 2
}

/// Offset of the unordered pair `{i, j}`, `i != j`.
pub(crate) fn pair_slot(i: usize, j: usize) -> usize {
    let (hi, lo) = if i > j { (i, j) } else { (j, i) };
    row_offset(hi) + lo
}

/// Entries needed to hold every pair among `n` points.
pub(crate) fn required_capacity(n: usize) -> usize {
    row_offset(n)
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DistanceCache {
    entries: Vec<f64>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn slot(i: usize, j: usize) -> usize {
        pair_slot(i, j)
    }

    /// Make room for every pair among `points` points.
    pub fn ensure_points(&mut self, points: usize) {
        let needed = required_capacity(points);
        if needed <= self.entries.len() {
            return;
        }
        let mut capacity = self.entries.len().max(INITIAL_CAPACITY);
        while capacity < needed {
            capacity *= GROWTH_FACTOR;
        }
        self.entries.resize(capacity, UNSET);
    }

    /// Memoized distance for an unordered pair of distinct indices.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let value = *self.entries.get(Self::slot(i, j))?;
        (value >= 0.0).then_some(value)
    }

    pub fn put(&mut self, i: usize, j: usize, distance: f64) {
        let slot = Self::slot(i, j);
        if let Some(entry) = self.entries.get_mut(slot) {
            // NaN distances are never memoized so they stay visibly unset
            *entry = if distance.is_nan() { UNSET } else { distance };
        }
    }

    /// Forget every pair involving `index` among `points` points.
    pub fn invalidate_point(&mut self, index: usize, points: usize) {
        for other in 0..points {
            if other != index {
                let slot = Self::slot(index, other);
                if let Some(entry) = self.entries.get_mut(slot) {
                    *entry = UNSET;
                }
            }
        }
    }

    /// Forget every pair involving a point at position `points` or later.
    pub fn truncate(&mut self, points: usize) {
        let kept = required_capacity(points).min(self.entries.len());
        self.entries[kept..].fill(UNSET);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.fill(UNSET);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
