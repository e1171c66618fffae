//! Projection algorithms
//!
//! Each algorithm turns the upstairs (high-dimensional) dataset into an
//! index-aligned downstairs (2-D) dataset. The Projector owns both datasets
//! and hands them to the algorithm on every call, so algorithm state holds
//! only what the algorithm itself derives.
//!
//! | method | iterative | add_datapoint |
//! |---|---|---|
//! | `NnSubspace` | no | places the new point from its 3 nearest earlier neighbors |
//! | `Triangulate` | no | interpolates between its 2 nearest earlier neighbors |
//! | `Sammon` | yes | seeds at the nearest neighbor, refined by `iterate` |
//! | `Coordinate` | no | reads two upstairs axes |
//! | `Pca` | no | recomputes principal axes |

mod basis;
mod coordinate;
mod incremental;
mod pca;
mod sammon;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ProjectorConfig;
use crate::dataset::Dataset;
use crate::error::{ProjectionError, Result};
use crate::point::DataPoint;

pub use basis::PlaneBasis;
pub use coordinate::Coordinate;
pub use incremental::{NnSubspace, Triangulate};
pub use pca::Pca;
pub use sammon::Sammon;

/// Dimension of every downstairs dataset.
pub const LOW_DIMENSIONS: usize = 2;

/// Selectable projection methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    Coordinate,
    Pca,
    Sammon,
    #[default]
    NnSubspace,
    Triangulate,
}

impl ProjectionMethod {
    pub const ALL: [ProjectionMethod; 5] = [
        Self::Coordinate,
        Self::Pca,
        Self::Sammon,
        Self::NnSubspace,
        Self::Triangulate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Coordinate => "coordinate",
            Self::Pca => "pca",
            Self::Sammon => "sammon",
            Self::NnSubspace => "nn_subspace",
            Self::Triangulate => "triangulate",
        }
    }

    pub fn is_iterable(&self) -> bool {
        matches!(self, Self::Sammon)
    }
}

impl std::fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProjectionMethod {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match normalized.as_str() {
            "coordinate" => Ok(Self::Coordinate),
            "pca" => Ok(Self::Pca),
            "sammon" => Ok(Self::Sammon),
            "nnsubspace" | "nn" => Ok(Self::NnSubspace),
            "triangulate" | "triangulation" => Ok(Self::Triangulate),
            _ => Err(ProjectionError::UnknownMethod(s.to_string())),
        }
    }
}

/// Common contract of every projection algorithm.
pub trait Projection {
    fn method(&self) -> ProjectionMethod;

    /// Re-derive algorithm-local state from the current datasets.
    fn init(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()>;

    /// Recompute the whole downstairs dataset.
    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()>;

    /// Extend downstairs for the upstairs point just stored at `index`.
    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize) -> Result<()>;

    fn is_iterable(&self) -> bool {
        false
    }

    /// One optimization step; returns the error after the step.
    fn iterate(&mut self, _upstairs: &mut Dataset, _downstairs: &mut Dataset) -> Result<f64> {
        Ok(0.0)
    }
}

/// The current algorithm and its state.
#[derive(Debug, Clone)]
pub enum Algorithm {
    Coordinate(Coordinate),
    Pca(Pca),
    Sammon(Sammon),
    NnSubspace(NnSubspace),
    Triangulate(Triangulate),
}

impl Algorithm {
    /// Fresh algorithm state for `method` configured from `config`.
    pub fn new(method: ProjectionMethod, config: &ProjectorConfig) -> Self {
        match method {
            ProjectionMethod::Coordinate => Self::Coordinate(Coordinate::new(config.coordinate.clone())),
            ProjectionMethod::Pca => Self::Pca(Pca::new()),
            ProjectionMethod::Sammon => {
                Self::Sammon(Sammon::new(config.sammon.epsilon, config.perturbation))
            }
            ProjectionMethod::NnSubspace => Self::NnSubspace(NnSubspace::new()),
            ProjectionMethod::Triangulate => Self::Triangulate(Triangulate::new()),
        }
    }

    fn inner(&self) -> &dyn Projection {
        match self {
            Self::Coordinate(a) => a,
            Self::Pca(a) => a,
            Self::Sammon(a) => a,
            Self::NnSubspace(a) => a,
            Self::Triangulate(a) => a,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Projection {
        match self {
            Self::Coordinate(a) => a,
            Self::Pca(a) => a,
            Self::Sammon(a) => a,
            Self::NnSubspace(a) => a,
            Self::Triangulate(a) => a,
        }
    }
}

impl Projection for Algorithm {
    fn method(&self) -> ProjectionMethod {
        self.inner().method()
    }

    fn init(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        self.inner_mut().init(upstairs, downstairs)
    }

    fn project(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<()> {
        self.inner_mut().project(upstairs, downstairs)
    }

    fn add_datapoint(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset, index: usize) -> Result<()> {
        self.inner_mut().add_datapoint(upstairs, downstairs, index)
    }

    fn is_iterable(&self) -> bool {
        self.inner().is_iterable()
    }

    fn iterate(&mut self, upstairs: &mut Dataset, downstairs: &mut Dataset) -> Result<f64> {
        self.inner_mut().iterate(upstairs, downstairs)
    }
}

/// Downstairs seed for an upstairs point: its first two components, padded
/// with zero when the upstairs dimension is 1.
pub(crate) fn leading_components(upstairs: &Dataset, index: usize) -> Result<DataPoint> {
    let point = upstairs.point(index)?;
    let x = point.get(0).unwrap_or(0.0);
    let y = point.get(1).unwrap_or(0.0);
    Ok(DataPoint::from([x, y]))
}
