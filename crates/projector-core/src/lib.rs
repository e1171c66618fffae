//! Projector Core Engine
//!
//! Maintains a growing set of high-dimensional vectors (the "upstairs"
//! dataset) and a 2-D image of it (the "downstairs" dataset) for plotting
//! state trajectories as point clouds.
//!
//! # Features
//!
//! - `parallel` - Parallel Sammon gradient steps via rayon
//!
//! # Example
//!
//! ```rust
//! use projector_core::{ProjectionMethod, Projector, ProjectorConfig};
//!
//! let mut projector = Projector::new(3, ProjectorConfig::default()).unwrap();
//! projector.add_datapoint([0.0, 0.0, 0.0]).unwrap();
//! projector.add_datapoint([3.0, 0.0, 0.0]).unwrap();
//! assert_eq!(projector.coordinates(), vec![[0.0, 0.0], [3.0, 0.0]]);
//!
//! projector.set_method(ProjectionMethod::Sammon).unwrap();
//! let stress = projector.iterate(10).unwrap();
//! assert!(stress.is_finite());
//! ```

mod cache;

pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod point;
pub mod projection;
pub mod projector;
pub mod shared;

// Re-export main types at crate root
pub use config::{CoordinateConfig, ProjectorConfig, SammonConfig};
pub use dataset::{Dataset, NO_TOLERANCE};
pub use error::{ProjectionError, Result};
pub use index::{Insertion, SpatialIndex};
pub use point::DataPoint;
pub use projection::{
    Algorithm, Coordinate, NnSubspace, Pca, PlaneBasis, Projection, ProjectionMethod, Sammon,
    Triangulate, LOW_DIMENSIONS,
};
pub use projector::Projector;
pub use shared::SharedProjector;
