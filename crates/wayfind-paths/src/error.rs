use thiserror::Error;

use wayfind_core::Point;

/// Argument-validation failures raised when building graphs, sessions and
/// schedulers.
///
/// "No path" is never an error: searches report it as `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("cost buffer holds {actual} cells but a {width}x{height} grid needs {expected}")]
    CostLengthMismatch {
        width: i32,
        height: i32,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("edge cost must be finite and non-negative, got {0}")]
    InvalidCost(f32),

    #[error("spatial index cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    #[error("{0} is outside the grid")]
    OutOfBounds(Point),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, PathError>;
