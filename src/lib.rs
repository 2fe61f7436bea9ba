//! ImageRestore Rust Extensions
//!
//! Synthetic image degradation and local-estimator restoration, with Python
//! bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! All kernels work on RGBA u8 images of shape (height, width, 4), row-major
//! (the same layout as a flat canvas `ImageData` buffer). Decoding, encoding
//! and display are left to the host.
//!
//! ## Pipeline
//! 1. [`filters::degrade`] - uniform noise plus missing-pixel punch-outs
//! 2. [`filters::restore`] - Gaussian-weighted 3x3 estimator that fills holes
//!    and smooths noise
//! 3. [`filters::quality`] - RMSE before/after and relative improvement
//!
//! [`pipeline::run_pipeline`] chains all three with a seeded RNG.
//!
//! ## Logging
//! Kernels emit `tracing` events (per-stage statistics at `debug`, pipeline
//! summary at `info`). Installing a subscriber is up to the host.

pub mod config;
pub mod error;
pub mod filters;
pub mod pipeline;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{DegradationParams, MaskMode, MissingSampling, PipelineConfig};
pub use error::{RestoreError, Result};
pub use filters::core::{MissingMask, PixelBuffer};
pub use filters::degrade::{degrade, degrade_with_mask};
pub use filters::quality::{evaluate, rmse, QualityMetrics};
pub use filters::restore::{restore, restore_with_mask, restore_with_report, RestoreReport};
pub use pipeline::{run_pipeline, PipelineOutput};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::config::{DegradationParams, MissingSampling};
    use crate::error::RestoreError;
    use crate::filters::core::MissingMask;
    use crate::filters::{degrade as degrade_mod, quality, restore as restore_mod};

    fn to_py(err: RestoreError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    // ========================================================================
    // Degradation
    // ========================================================================

    /// Add uniform noise and punch out missing pixels (RGBA u8).
    ///
    /// # Arguments
    /// * `image` - RGBA image (H, W, 4)
    /// * `noise_level` - Noise amplitude (0-100)
    /// * `missing_percent` - Percentage of pixels to punch out (0-50)
    /// * `seed` - Random seed; `None` draws one from the OS
    /// * `distinct` - Punch exactly the requested number of distinct pixels
    #[pyfunction]
    #[pyo3(signature = (image, noise_level=30, missing_percent=20, seed=None, distinct=false))]
    pub fn degrade<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        noise_level: i64,
        missing_percent: i64,
        seed: Option<u64>,
        distinct: bool,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let sampling = if distinct {
            MissingSampling::WithoutReplacement
        } else {
            MissingSampling::WithReplacement
        };
        let params = DegradationParams::new(noise_level, missing_percent)
            .map_err(to_py)?
            .with_sampling(sampling);
        let mut rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };

        let result = degrade_mod::degrade(image.as_array(), &params, &mut rng).map_err(to_py)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Restoration
    // ========================================================================

    /// Restore a degraded RGBA u8 image. Black pixels are treated as missing.
    #[pyfunction]
    pub fn restore<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = image.as_array();
        let result = py
            .allow_threads(|| restore_mod::restore(input))
            .map_err(to_py)?;
        Ok(result.into_pyarray(py))
    }

    /// Restore a degraded RGBA u8 image using an explicit (H, W) bool mask.
    #[pyfunction]
    pub fn restore_masked<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        mask: PyReadonlyArray2<'py, bool>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = image.as_array();
        let mask = MissingMask::from_array(mask.as_array().to_owned());
        let result = py
            .allow_threads(|| restore_mod::restore_with_mask(input, &mask))
            .map_err(to_py)?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Quality
    // ========================================================================

    /// Compare degraded and restored images against the original.
    ///
    /// Returns `(rmse_before, rmse_after, improvement_percent)`.
    #[pyfunction]
    pub fn evaluate<'py>(
        original: PyReadonlyArray3<'py, u8>,
        degraded: PyReadonlyArray3<'py, u8>,
        restored: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<(f64, f64, f64)> {
        let metrics = quality::evaluate(
            original.as_array(),
            degraded.as_array(),
            restored.as_array(),
        )
        .map_err(to_py)?;
        Ok((
            metrics.rmse_before,
            metrics.rmse_after,
            metrics.improvement_percent,
        ))
    }

    /// ImageRestore Rust extension module
    #[pymodule]
    pub fn imagerestore_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(degrade, m)?)?;
        m.add_function(wrap_pyfunction!(restore, m)?)?;
        m.add_function(wrap_pyfunction!(restore_masked, m)?)?;
        m.add_function(wrap_pyfunction!(evaluate, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::imagerestore_rust;
