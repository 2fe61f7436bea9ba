//! WebAssembly exports for the restoration kernels.
//!
//! These functions are exposed to JavaScript via wasm-bindgen and work on
//! flat RGBA byte arrays (length = width * height * 4), as produced by
//! `CanvasRenderingContext2D.getImageData`.

use ndarray::Array3;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use wasm_bindgen::prelude::*;

use crate::config::{DegradationParams, MissingSampling};
use crate::error::RestoreError;
use crate::filters::core::{from_flat_rgba, into_flat_rgba, MissingMask};
use crate::filters::degrade::{degrade, degrade_with_mask};
use crate::filters::quality::evaluate;
use crate::filters::restore::{restore, restore_with_mask};

fn to_js(err: RestoreError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn load(data: &[u8], width: usize, height: usize) -> Result<Array3<u8>, JsValue> {
    from_flat_rgba(data, width, height).map_err(to_js)
}

// ============================================================================
// Degradation
// ============================================================================

/// Add noise and punch out missing pixels.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `noise_level` - Noise amplitude (0-100)
/// * `missing_percent` - Percentage of pixels to punch out (0-50)
/// * `seed` - Random seed for reproducible results
///
/// # Returns
/// Flat array of degraded RGBA bytes
#[wasm_bindgen]
pub fn degrade_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    noise_level: f64,
    missing_percent: f64,
    seed: u64,
) -> Result<Vec<u8>, JsValue> {
    let params = DegradationParams::from_f64(noise_level, missing_percent).map_err(to_js)?;
    let input = load(data, width, height)?;
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let result = degrade(input.view(), &params, &mut rng).map_err(to_js)?;
    Ok(into_flat_rgba(result))
}

/// Degraded image plus the mask of punched pixels.
#[wasm_bindgen]
pub struct DegradedImage {
    data: Vec<u8>,
    mask: Vec<u8>,
}

#[wasm_bindgen]
impl DegradedImage {
    /// Flat RGBA bytes of the degraded image.
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// One byte per pixel, row-major: 1 = punched, 0 = untouched.
    #[wasm_bindgen(getter)]
    pub fn mask(&self) -> Vec<u8> {
        self.mask.clone()
    }
}

/// Add noise and punch out missing pixels, also returning the punch mask.
///
/// # Arguments
/// * `distinct` - Punch exactly the requested number of distinct pixels
///
/// Other arguments as for `degrade_rgba_wasm`.
#[wasm_bindgen]
pub fn degrade_rgba_masked_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    noise_level: f64,
    missing_percent: f64,
    seed: u64,
    distinct: bool,
) -> Result<DegradedImage, JsValue> {
    let sampling = if distinct {
        MissingSampling::WithoutReplacement
    } else {
        MissingSampling::WithReplacement
    };
    let params = DegradationParams::from_f64(noise_level, missing_percent)
        .map_err(to_js)?
        .with_sampling(sampling);
    let input = load(data, width, height)?;
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let (result, mask) = degrade_with_mask(input.view(), &params, &mut rng).map_err(to_js)?;
    Ok(DegradedImage {
        data: into_flat_rgba(result),
        mask: mask.to_flat(),
    })
}

// ============================================================================
// Restoration
// ============================================================================

/// Restore a degraded image (black pixels are treated as missing).
#[wasm_bindgen]
pub fn restore_rgba_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = load(data, width, height)?;
    let result = restore(input.view()).map_err(to_js)?;
    Ok(into_flat_rgba(result))
}

/// Restore a degraded image using an explicit mask (one byte per pixel,
/// non-zero = missing). Black pixels outside the mask stay present.
#[wasm_bindgen]
pub fn restore_rgba_masked_wasm(
    data: &[u8],
    mask: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, JsValue> {
    let input = load(data, width, height)?;
    let mask = MissingMask::from_flat(mask, width, height).map_err(to_js)?;
    let result = restore_with_mask(input.view(), &mask).map_err(to_js)?;
    Ok(into_flat_rgba(result))
}

// ============================================================================
// Quality
// ============================================================================

/// Compare degraded and restored images against the original.
///
/// # Returns
/// `[rmse_before, rmse_after, improvement_percent]`
#[wasm_bindgen]
pub fn evaluate_rgba_wasm(
    original: &[u8],
    degraded: &[u8],
    restored: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<f64>, JsValue> {
    let original = load(original, width, height)?;
    let degraded = load(degraded, width, height)?;
    let restored = load(restored, width, height)?;

    let metrics = evaluate(original.view(), degraded.view(), restored.view()).map_err(to_js)?;
    Ok(vec![
        metrics.rmse_before,
        metrics.rmse_after,
        metrics.improvement_percent,
    ])
}
