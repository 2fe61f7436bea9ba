//! Typed parameters for a degradation/restoration run.
//!
//! Parameters are validated once, at construction. Kernels receiving a
//! [`DegradationParams`] can rely on both values being in range.

use crate::error::{RestoreError, Result};

/// Upper bound of the noise amplitude slider.
pub const MAX_NOISE_LEVEL: u8 = 100;

/// Upper bound of the missing-pixel percentage slider.
pub const MAX_MISSING_PERCENT: u8 = 50;

const DEFAULT_NOISE_LEVEL: u8 = 30;
const DEFAULT_MISSING_PERCENT: u8 = 20;

/// How missing-pixel positions are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSampling {
    /// Draw `missing_count` indices independently. Collisions are kept, so the
    /// number of distinct punched pixels may fall short of the target.
    #[default]
    WithReplacement,
    /// Punch exactly `missing_count` distinct pixels (shuffled index prefix).
    WithoutReplacement,
}

/// Noise amplitude and missing-pixel fraction for one degradation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationParams {
    noise_level: u8,
    missing_percent: u8,
    sampling: MissingSampling,
}

impl DegradationParams {
    /// Create validated parameters.
    ///
    /// # Arguments
    /// * `noise_level` - Symmetric additive noise amplitude (0-100)
    /// * `missing_percent` - Target percentage of pixels to punch out (0-50)
    pub fn new(noise_level: i64, missing_percent: i64) -> Result<Self> {
        Ok(Self {
            noise_level: check_range("noise_level", noise_level as f64, MAX_NOISE_LEVEL)?,
            missing_percent: check_range(
                "missing_percent",
                missing_percent as f64,
                MAX_MISSING_PERCENT,
            )?,
            sampling: MissingSampling::default(),
        })
    }

    /// Create parameters from floating point slider values.
    ///
    /// NaN, infinite and non-integral values are rejected.
    pub fn from_f64(noise_level: f64, missing_percent: f64) -> Result<Self> {
        Ok(Self {
            noise_level: check_range("noise_level", noise_level, MAX_NOISE_LEVEL)?,
            missing_percent: check_range("missing_percent", missing_percent, MAX_MISSING_PERCENT)?,
            sampling: MissingSampling::default(),
        })
    }

    pub fn with_sampling(mut self, sampling: MissingSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn noise_level(&self) -> u8 {
        self.noise_level
    }

    pub fn missing_percent(&self) -> u8 {
        self.missing_percent
    }

    pub fn sampling(&self) -> MissingSampling {
        self.sampling
    }

    /// Number of missing-pixel draws for an image of `pixel_count` pixels.
    pub fn missing_count(&self, pixel_count: usize) -> usize {
        pixel_count * self.missing_percent as usize / 100
    }
}

impl Default for DegradationParams {
    fn default() -> Self {
        Self {
            noise_level: DEFAULT_NOISE_LEVEL,
            missing_percent: DEFAULT_MISSING_PERCENT,
            sampling: MissingSampling::default(),
        }
    }
}

fn check_range(name: &'static str, value: f64, max: u8) -> Result<u8> {
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > max as f64 {
        return Err(RestoreError::InvalidParameter {
            name,
            value,
            min: 0,
            max,
        });
    }
    Ok(value as u8)
}

/// How the restoration stage decides which pixels are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// Classify by value: R=G=B=0 means missing. Compatible with buffers that
    /// carry no side information, but cannot tell punched pixels from real black.
    #[default]
    Sentinel,
    /// Use the mask recorded by the degradation stage.
    Explicit,
}

/// Settings for a full degrade/restore/evaluate run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineConfig {
    pub params: DegradationParams,
    /// Seed for the degradation RNG. `None` draws a seed from the OS.
    pub seed: Option<u64>,
    pub mask_mode: MaskMode,
}

impl PipelineConfig {
    pub fn new(params: DegradationParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mask_mode(mut self, mask_mode: MaskMode) -> Self {
        self.mask_mode = mask_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_interactive_tool() {
        let params = DegradationParams::default();
        assert_eq!(params.noise_level(), 30);
        assert_eq!(params.missing_percent(), 20);
        assert_eq!(params.sampling(), MissingSampling::WithReplacement);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(DegradationParams::new(0, 0).is_ok());
        assert!(DegradationParams::new(100, 50).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = DegradationParams::new(101, 10).unwrap_err();
        assert!(matches!(
            err,
            RestoreError::InvalidParameter { name: "noise_level", max: 100, .. }
        ));

        let err = DegradationParams::new(10, -1).unwrap_err();
        assert!(matches!(
            err,
            RestoreError::InvalidParameter { name: "missing_percent", .. }
        ));

        assert!(DegradationParams::new(10, 51).is_err());
        assert!(DegradationParams::new(-5, 10).is_err());
    }

    #[test]
    fn test_from_f64_rejects_nan_and_fractions() {
        assert!(DegradationParams::from_f64(f64::NAN, 10.0).is_err());
        assert!(DegradationParams::from_f64(10.0, f64::INFINITY).is_err());
        assert!(DegradationParams::from_f64(10.5, 10.0).is_err());

        let params = DegradationParams::from_f64(42.0, 7.0).unwrap();
        assert_eq!(params.noise_level(), 42);
        assert_eq!(params.missing_percent(), 7);
    }

    #[test]
    fn test_missing_count_floors() {
        let params = DegradationParams::new(0, 20).unwrap();
        assert_eq!(params.missing_count(100), 20);
        assert_eq!(params.missing_count(7), 1);
        assert_eq!(params.missing_count(4), 0);
    }
}
