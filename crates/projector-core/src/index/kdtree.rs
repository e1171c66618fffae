//! Incremental k-d tree over positions of an external point list
//!
//! The tree stores positions only; coordinates are always read from the
//! point slice owned by `SpatialIndex`. Nodes live in an arena and the split
//! axis cycles with depth. Points equal to a split coordinate go right on
//! insertion, and may sit on either side after a balanced rebuild, so the
//! search prunes a far side only when its axis gap exceeds the current
//! worst candidate. A NaN split coordinate bounds nothing, so both sides of
//! such a node are always searched. NaN distances rank after every number.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::point::DataPoint;

#[derive(Debug, Clone)]
struct Node {
    position: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// A search hit, ordered by distance then position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub distance_squared: f64,
    pub position: usize,
}

impl Candidate {
    pub fn new(position: usize, distance_squared: f64) -> Self {
        // One NaN bit pattern, so every NaN sorts last under total_cmp
        let distance_squared = if distance_squared.is_nan() {
            f64::NAN
        } else {
            distance_squared
        };
        Self {
            distance_squared,
            position,
        }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then(self.position.cmp(&other.position))
    }
}

/// Bounded max-heap of the best `k` candidates seen so far.
pub(crate) struct Neighborhood<'f> {
    k: usize,
    heap: BinaryHeap<Candidate>,
    accept: &'f dyn Fn(usize) -> bool,
}

impl<'f> Neighborhood<'f> {
    pub fn new(k: usize, accept: &'f dyn Fn(usize) -> bool) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
            accept,
        }
    }

    /// Whether a subtree whose nearest possible point is `gap_squared` away
    /// could still improve the result.
    fn reaches(&self, gap_squared: f64) -> bool {
        if self.heap.len() < self.k {
            return true;
        }
        match self.heap.peek() {
            Some(worst) => {
                worst.distance_squared.is_nan() || gap_squared <= worst.distance_squared
            }
            None => false,
        }
    }

    pub fn consider(&mut self, position: usize, distance_squared: f64) {
        if self.k == 0 || !(self.accept)(position) {
            return;
        }
        let candidate = Candidate::new(position, distance_squared);
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    /// Positions in ascending (distance, position) order.
    pub fn into_sorted(self) -> Vec<Candidate> {
        self.heap.into_sorted_vec()
    }
}

fn coordinate(point: &DataPoint, axis: usize) -> f64 {
    point.get(axis).unwrap_or(0.0)
}

/// Arena-backed k-d tree keyed by coordinate ranges.
#[derive(Debug, Clone, Default)]
pub(crate) struct KdTree {
    nodes: Vec<Node>,
    root: Option<usize>,
    dimensions: usize,
}

impl KdTree {
    pub fn new(dimensions: usize) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn axis_at(&self, depth: usize) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            depth % self.dimensions
        }
    }

    /// Insert `position`, whose coordinates are `points[position]`.
    pub fn insert(&mut self, points: &[DataPoint], position: usize) {
        let new_index = self.nodes.len();
        let point = &points[position];

        let Some(mut current) = self.root else {
            self.nodes.push(Node {
                position,
                axis: self.axis_at(0),
                left: None,
                right: None,
            });
            self.root = Some(new_index);
            return;
        };

        let mut depth = 0;
        loop {
            depth += 1;
            let node = &self.nodes[current];
            let split = coordinate(&points[node.position], node.axis);
            let go_left = coordinate(point, node.axis) < split;
            let next = if go_left { node.left } else { node.right };

            match next {
                Some(child) => current = child,
                None => {
                    let axis = self.axis_at(depth);
                    self.nodes.push(Node {
                        position,
                        axis,
                        left: None,
                        right: None,
                    });
                    let parent = &mut self.nodes[current];
                    if go_left {
                        parent.left = Some(new_index);
                    } else {
                        parent.right = Some(new_index);
                    }
                    return;
                }
            }
        }
    }

    /// Discard the current shape and build a balanced tree over all points.
    pub fn rebuild(&mut self, points: &[DataPoint]) {
        self.clear();
        self.nodes.reserve(points.len());
        let mut positions: Vec<usize> = (0..points.len()).collect();
        self.root = self.build(points, &mut positions, 0);
    }

    fn build(&mut self, points: &[DataPoint], positions: &mut [usize], depth: usize) -> Option<usize> {
        if positions.is_empty() {
            return None;
        }

        let axis = self.axis_at(depth);
        let median = positions.len() / 2;
        positions.select_nth_unstable_by(median, |&a, &b| {
            coordinate(&points[a], axis)
                .total_cmp(&coordinate(&points[b], axis))
                .then(a.cmp(&b))
        });

        let index = self.nodes.len();
        self.nodes.push(Node {
            position: positions[median],
            axis,
            left: None,
            right: None,
        });

        let (lower, upper) = positions.split_at_mut(median);
        let left = self.build(points, lower, depth + 1);
        let right = self.build(points, &mut upper[1..], depth + 1);
        let node = &mut self.nodes[index];
        node.left = left;
        node.right = right;
        Some(index)
    }

    /// Depth of the deepest leaf, 0 for an empty tree.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], node: Option<usize>) -> usize {
            match node {
                Some(i) => 1 + walk(nodes, nodes[i].left).max(walk(nodes, nodes[i].right)),
                None => 0,
            }
        }
        walk(&self.nodes, self.root)
    }

    /// Collect the best candidates for `target` into `neighborhood`.
    pub fn search(&self, points: &[DataPoint], target: &DataPoint, neighborhood: &mut Neighborhood<'_>) {
        self.search_node(points, target, self.root, neighborhood);
    }

    fn search_node(
        &self,
        points: &[DataPoint],
        target: &DataPoint,
        node: Option<usize>,
        neighborhood: &mut Neighborhood<'_>,
    ) {
        let Some(index) = node else {
            return;
        };
        let node = &self.nodes[index];
        let stored = &points[node.position];
        neighborhood.consider(node.position, target.distance_squared(stored));

        let gap = coordinate(target, node.axis) - coordinate(stored, node.axis);
        let (near, far) = if gap < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.search_node(points, target, near, neighborhood);
        if !gap.is_finite() || neighborhood.reaches(gap * gap) {
            self.search_node(points, target, far, neighborhood);
        }
    }
}
