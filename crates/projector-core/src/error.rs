//! Projection engine error types

use thiserror::Error;

/// Errors that can occur while maintaining or projecting a dataset
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// Point dimension does not match the dataset dimension
    #[error("dimension mismatch: dataset has {expected} dimensions, point has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Positional access outside the current size
    #[error("index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    /// Neighbor query asked for more points than are available
    #[error("insufficient points: requested {requested} neighbors, {available} available")]
    InsufficientPoints { requested: usize, available: usize },

    /// Projection method name not recognized
    #[error("unknown projection method '{0}', expected one of: coordinate, pca, sammon, nn_subspace, triangulate")]
    UnknownMethod(String),

    /// Configuration value rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for projection engine operations
pub type Result<T> = std::result::Result<T, ProjectionError>;
