//! Quality metrics: RMSE before and after restoration.
//!
//! Errors are measured over R, G and B only; alpha never contributes.

use std::fmt;

use ndarray::ArrayView3;

use crate::error::{RestoreError, Result};
use crate::filters::core::{check_rgba, check_same_dims, COLOR_CHANNELS};

/// Comparison of the degraded and restored images against the original.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetrics {
    pub rmse_before: f64,
    pub rmse_after: f64,
    /// Relative RMSE reduction in percent. Negative if restoration made things worse.
    pub improvement_percent: f64,
}

impl fmt::Display for QualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE before: {:.2}, after: {:.2}, improvement: {:.2}%",
            self.rmse_before, self.rmse_after, self.improvement_percent
        )
    }
}

/// Sum of squared R, G, B differences between two same-sized images.
fn sum_squared_diff(a: &ArrayView3<u8>, b: &ArrayView3<u8>) -> f64 {
    let (height, width, _) = a.dim();
    let mut sum = 0.0f64;

    for y in 0..height {
        for x in 0..width {
            for c in 0..COLOR_CHANNELS {
                let d = a[[y, x, c]] as f64 - b[[y, x, c]] as f64;
                sum += d * d;
            }
        }
    }

    sum
}

fn rmse_from_sum(sum: f64, pixel_count: usize) -> f64 {
    if pixel_count == 0 {
        return 0.0;
    }
    (sum / (pixel_count * COLOR_CHANNELS) as f64).sqrt()
}

/// Root-mean-square error over R, G and B between two RGBA images.
///
/// # Arguments
/// * `a` - RGBA image (height, width, 4)
/// * `b` - RGBA image with the same dimensions
pub fn rmse(a: ArrayView3<u8>, b: ArrayView3<u8>) -> Result<f64> {
    let dims = check_rgba(&a)?;
    check_same_dims(dims, check_rgba(&b)?)?;
    Ok(rmse_from_sum(sum_squared_diff(&a, &b), dims.0 * dims.1))
}

/// Compare degraded and restored images against the original.
///
/// Fails with `DegenerateMetric` when the degraded image equals the original
/// (RMSE before = 0), since the improvement ratio is then undefined.
///
/// # Arguments
/// * `original` - Clean RGBA image
/// * `degraded` - Output of the degradation stage
/// * `restored` - Output of the restoration stage
pub fn evaluate(
    original: ArrayView3<u8>,
    degraded: ArrayView3<u8>,
    restored: ArrayView3<u8>,
) -> Result<QualityMetrics> {
    let rmse_before = rmse(original, degraded)?;
    let rmse_after = rmse(original, restored)?;

    if rmse_before == 0.0 {
        return Err(RestoreError::DegenerateMetric {
            rmse_before,
            rmse_after,
        });
    }

    let improvement_percent = (rmse_before - rmse_after) / rmse_before * 100.0;

    Ok(QualityMetrics {
        rmse_before,
        rmse_after,
        improvement_percent,
    })
}
