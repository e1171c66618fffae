//! Online placement of new points from their already-placed neighbors
//!
//! Both methods place point `i` using only points `0..i`, so replaying the
//! upstairs dataset from scratch reproduces the incremental result exactly.

use tracing::trace;

use super::basis::PlaneBasis;
use super::{Projection, ProjectionMethod, LOW_DIMENSIONS};
use crate::dataset::Dataset;
use crate::error::{ProjectionError, Result};
use crate::point::DataPoint;

type Placement = fn(&mut Dataset, &Dataset, usize) -> Result<DataPoint>;

/// The first point sits at the origin, the second on the x axis at its
/// upstairs distance from the first.
fn seed_position(upstairs: &mut Dataset, downstairs: &Dataset, index: usize) -> Result<Option<DataPoint>> {
    match index {
        0 => Ok(Some(DataPoint::zeros(LOW_DIMENSIONS))),
        1 => {
            let distance = upstairs.distance(0, 1)?;
            let first = downstairs.point(0)?;
            let x = first.get(0).unwrap_or(0.0) + distance;
            let y = first.get(1).unwrap_or(0.0);
            Ok(Some(DataPoint::from([x, y])))
        }
        _ => Ok(None),
    }
}

/// `(d1·q1 + d2·q2) / (d1 + d2)` over the two nearest earlier neighbors,
/// weighted by their raw upstairs distances.
fn interpolate(upstairs: &mut Dataset, downstairs: &Dataset, index: usize) -> Result<DataPoint> {
    let target = upstairs.point(index)?.clone();
    let nearest = upstairs.k_nearest_among(2, &target, index)?;
    let &[(first, _), (second, _)] = nearest.as_slice() else {
        return Err(ProjectionError::InsufficientPoints {
            requested: 2,
            available: nearest.len(),
        });
    };

    let d1 = upstairs.distance(index, first)?;
    let d2 = upstairs.distance(index, second)?;
    let q1 = downstairs.point(first)?;
    let q2 = downstairs.point(second)?;

    let total = d1 + d2;
    if total == 0.0 {
        return Ok(q1.clone());
    }
    let components = q1
        .components()
        .iter()
        .zip(q2.components())
        .map(|(a, b)| (d1 * a + d2 * b) / total)
        .collect();
    Ok(DataPoint::new(components))
}

fn place_triangulated(upstairs: &mut Dataset, downstairs: &Dataset, index: usize) -> Result<DataPoint> {
    match seed_position(upstairs, downstairs, index)? {
        Some(seeded) => Ok(seeded),
        None => interpolate(upstairs, downstairs, index),
    }
}

fn place_in_subspace(upstairs: &mut Dataset, downstairs: &Dataset, index: usize) -> Result<DataPoint> {
    if let Some(seeded) = seed_position(upstairs, downstairs, index)? {
        return Ok(seeded);
    }
    if index < 3 {
        return interpolate(upstairs, downstairs, index);
    }

    let target = upstairs.point(index)?.clone();
    let nearest = upstairs.k_nearest_among(3, &target, index)?;
    let &[(a, _), (b, _), (c, _)] = nearest.as_slice() else {
        return Err(ProjectionError::InsufficientPoints {
            requested: 3,
            available: nearest.len(),
        });
    };

    let upper = PlaneBasis::from_anchors(upstairs.point(a)?, upstairs.point(b)?, upstairs.point(c)?);
    if upper.is_degenerate() {
        trace!(index, a, b, "coincident anchors, interpolating");
        return interpolate(upstairs, downstairs, index);
    }
    if !upper.is_planar() {
        trace!(index, "collinear anchors, placing along one axis");
    }

    let (c1, c2) = upper.coordinates(&target);
    let lower = PlaneBasis::from_anchors(downstairs.point(a)?, downstairs.point(b)?, downstairs.point(c)?)
        .completed_in_plane();
    Ok(lower.point_at(c1, c2))
}

/// Place every upstairs point again, in order.
fn replay(upstairs: &mut Dataset, downstairs: &mut Dataset, place: Placement) -> Result<()> {
    downstairs.clear();
    for index in 0..upstairs.len() {
        let placed = place(upstairs, downstairs, index)?;
        downstairs.add_point(placed)?;
    }
    Ok(())
}

fn extend(upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize, place: Placement) -> Result<()> {
    if downstairs.len() != index {
        trace!(index, placed = downstairs.len(), "downstairs out of step, replaying");
        return replay(upstairs, downstairs, place);
    }
    let placed = place(upstairs, downstairs, index)?;
    trace!(index, point = %placed, "placed");
    downstairs.add_point(placed)?;
    Ok(())
}

/// Nearest-neighbor subspace placement.
///
/// From the fourth point on, the new point is expressed in the plane of its
/// three nearest earlier neighbors and mapped into the plane of their
/// downstairs images.
#[derive(Debug, Clone, Default)]
pub struct NnSubspace;

impl NnSubspace {
    pub fn new() -> Self {
        Self
    }
}

impl Projection for NnSubspace {
    fn method(&self) -> ProjectionMethod {
        ProjectionMethod::NnSubspace
    }

    fn init(&mut self, _upstairs: &mut Dataset, _downstairs: &mut Dataset) -> Result<()> {
        Ok(())
    }

    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        replay(upstairs, downstairs, place_in_subspace)
    }

    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize) -> Result<()> {
        extend(upstairs, downstairs, index, place_in_subspace)
    }
}

/// Two-neighbor interpolation placement.
#[derive(Debug, Clone, Default)]
pub struct Triangulate;

impl Triangulate {
    pub fn new() -> Self {
        Self
    }
}

impl Projection for Triangulate {
    fn method(&self) -> ProjectionMethod {
        ProjectionMethod::Triangulate
    }

    fn init(&mut self, _upstairs: &mut Dataset, _downstairs: &mut Dataset) -> Result<()> {
        Ok(())
    }

    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        replay(upstairs, downstairs, place_triangulated)
    }

    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize) -> Result<()> {
        extend(upstairs, downstairs, index, place_triangulated)
    }
}
