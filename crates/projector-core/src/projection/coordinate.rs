//! Coordinate projection: read two upstairs dimensions directly

use tracing::debug;

use super::{Projection, ProjectionMethod};
use crate::config::CoordinateConfig;
use crate::dataset::Dataset;
use crate::error::{ProjectionError, Result};
use crate::point::DataPoint;

#[derive(Debug, Clone)]
pub struct Coordinate {
    config: CoordinateConfig,
    /// Axes used by the last projection, `None` for the y axis of 1-D data
    axes: Option<(usize, Option<usize>)>,
}

impl Coordinate {
    pub fn new(config: CoordinateConfig) -> Self {
        Self { config, axes: None }
    }

    /// Upstairs dimensions mapped to x and y by the most recent projection.
    pub fn axes(&self) -> Option<(usize, Option<usize>)> {
        self.axes
    }

    fn resolve_axes(&self, upstairs: &Dataset) -> Result<(usize, Option<usize>)> {
        let dimensions = upstairs.dimensions();
        if dimensions < 2 {
            return Ok((0, None));
        }
        if self.config.auto_find {
            return Ok((
                upstairs.kth_variant_dimension(1)?,
                Some(upstairs.kth_variant_dimension(2)?),
            ));
        }
        let [x, y] = self.config.axes;
        for axis in [x, y] {
            if axis >= dimensions {
                return Err(ProjectionError::IndexOutOfRange {
                    index: axis,
                    len: dimensions,
                });
            }
        }
        Ok((x, Some(y)))
    }

    fn image(point: &DataPoint, (x, y): (usize, Option<usize>)) -> DataPoint {
        let x = point.get(x).unwrap_or(0.0);
        let y = y.and_then(|axis| point.get(axis)).unwrap_or(0.0);
        DataPoint::from([x, y])
    }
}

impl Projection for Coordinate {
    fn method(&self) -> ProjectionMethod {
        ProjectionMethod::Coordinate
    }

    fn init(&mut self, upstairs: &mut Dataset, _downstairs: &mut Dataset) -> Result<()> {
        self.axes = Some(self.resolve_axes(upstairs)?);
        Ok(())
    }

    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        let axes = self.resolve_axes(upstairs)?;
        if self.axes != Some(axes) {
            debug!(x = axes.0, y = ?axes.1, "coordinate axes");
        }
        self.axes = Some(axes);
        downstairs.clear();
        for point in upstairs.points() {
            downstairs.add_point(Self::image(point, axes))?;
        }
        Ok(())
    }

    /// With automatic axes the ranking may change, so everything is redone.
    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize) -> Result<()> {
        if self.config.auto_find || downstairs.len() != index {
            return self.project(upstairs, downstairs);
        }
        let axes = match self.axes {
            Some(axes) => axes,
            None => {
                let axes = self.resolve_axes(upstairs)?;
                self.axes = Some(axes);
                axes
            }
        };
        let image = Self::image(upstairs.point(index)?, axes);
        downstairs.add_point(image)?;
        Ok(())
    }
}
