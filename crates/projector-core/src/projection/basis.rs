//! Orthonormal basis of the plane through three anchor points
//!
//! Built by Gram–Schmidt: `e1` points from the first anchor to the second,
//! `e2` is the part of (third − first) orthogonal to `e1`. Either vector is
//! absent when its source has (numerically) zero length.

use crate::point::DataPoint;

/// Norms at or below this are treated as zero.
const DEGENERATE_NORM: f64 = 1e-10;

fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalized(v: Vec<f64>) -> Option<Vec<f64>> {
    let norm = dot(&v, &v).sqrt();
    if norm <= DEGENERATE_NORM || !norm.is_finite() {
        return None;
    }
    Some(v.into_iter().map(|c| c / norm).collect())
}

/// An origin plus up to two orthonormal directions.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneBasis {
    origin: Vec<f64>,
    e1: Option<Vec<f64>>,
    e2: Option<Vec<f64>>,
}

impl PlaneBasis {
    /// Basis of the plane through `first`, `second` and `third`, anchored at
    /// `first`.
    pub fn from_anchors(first: &DataPoint, second: &DataPoint, third: &DataPoint) -> Self {
        let origin = first.components().to_vec();
        let e1 = normalized(difference(second.components(), &origin));

        let e2 = e1.as_ref().and_then(|e1| {
            let offset = difference(third.components(), &origin);
            let along = dot(&offset, e1);
            let residual = offset
                .iter()
                .zip(e1)
                .map(|(o, e)| o - along * e)
                .collect();
            normalized(residual)
        });

        Self { origin, e1, e2 }
    }

    /// True when the first two anchors coincide.
    pub fn is_degenerate(&self) -> bool {
        self.e1.is_none()
    }

    /// True when the anchors span a plane rather than a line.
    pub fn is_planar(&self) -> bool {
        self.e2.is_some()
    }

    /// Coordinates of `point` relative to the origin along `e1` and `e2`.
    /// Missing directions contribute 0.
    pub fn coordinates(&self, point: &DataPoint) -> (f64, f64) {
        let offset = difference(point.components(), &self.origin);
        let c1 = self.e1.as_ref().map_or(0.0, |e| dot(&offset, e));
        let c2 = self.e2.as_ref().map_or(0.0, |e| dot(&offset, e));
        (c1, c2)
    }

    /// The point `origin + c1·e1 + c2·e2`.
    pub fn point_at(&self, c1: f64, c2: f64) -> DataPoint {
        let mut out = self.origin.clone();
        for (direction, scale) in [(&self.e1, c1), (&self.e2, c2)] {
            if let Some(e) = direction {
                for (o, v) in out.iter_mut().zip(e) {
                    *o += scale * v;
                }
            }
        }
        DataPoint::new(out)
    }

    /// Fill in missing directions of a 2-D basis: `e1` defaults to the x
    /// axis, `e2` to `e1` rotated a quarter turn counter-clockwise.
    pub fn completed_in_plane(mut self) -> Self {
        if self.origin.len() != 2 {
            return self;
        }
        let e1 = self.e1.get_or_insert_with(|| vec![1.0, 0.0]).clone();
        self.e2.get_or_insert_with(|| vec![-e1[1], e1[0]]);
        self
    }
}
