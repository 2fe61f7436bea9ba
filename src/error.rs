//! Error type shared by the degradation, restoration and evaluation kernels.

use thiserror::Error;

/// Errors reported by the restoration kernels.
///
/// All variants are deterministic input-validation failures. They are raised
/// before any output buffer is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestoreError {
    #[error("Invalid parameter '{name}': {value} (expected an integer in {min}..={max})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        min: u8,
        max: u8,
    },

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Degenerate metric: RMSE before restoration is {rmse_before}, improvement is undefined")]
    DegenerateMetric { rmse_before: f64, rmse_after: f64 },

    #[error("Invalid pixel buffer: {reason}")]
    InvalidBuffer { reason: String },
}

pub type Result<T> = std::result::Result<T, RestoreError>;
