//! Degradation: additive noise followed by missing-pixel punch-outs.
//!
//! The random source is always passed in by the caller, so a seeded
//! generator reproduces the same corrupted image.
//!
//! ## Order of operations
//!
//! 1. One uniform noise value per pixel, added to R, G and B alike
//! 2. Punch-outs set R=G=B=0, A=255
//!
//! Punching runs after the noise pass, so punched pixels carry no noise.
//!
//! ## Sentinel caveat
//!
//! With replacement, at most `floor(N * p / 100)` pixels are punched. Counting
//! black pixels afterwards only respects that bound if the noise pass cannot
//! clamp a dark pixel to (0, 0, 0); such pixels are indistinguishable from
//! holes. Use the mask from [`degrade_with_mask`] for the exact punched set.

use ndarray::ArrayView3;
use rand::Rng;

use crate::config::{DegradationParams, MissingSampling};
use crate::error::{RestoreError, Result};
use crate::filters::core::{check_rgba, MissingMask, PixelBuffer, COLOR_CHANNELS};

/// Degrade an RGBA u8 image with noise and missing pixels.
///
/// # Arguments
/// * `input` - RGBA image (height, width, 4)
/// * `params` - Noise amplitude and missing-pixel percentage
/// * `rng` - Random source for the noise and punch-out draws
///
/// # Returns
/// Newly allocated degraded image with the same dimensions
pub fn degrade<R: Rng + ?Sized>(
    input: ArrayView3<u8>,
    params: &DegradationParams,
    rng: &mut R,
) -> Result<PixelBuffer> {
    degrade_with_mask(input, params, rng).map(|(output, _)| output)
}

/// Degrade an image and also return the mask of punched pixels.
///
/// The mask records exactly the pixels the punch-out pass touched, which lets
/// restoration tell them apart from pixels that were black to begin with.
pub fn degrade_with_mask<R: Rng + ?Sized>(
    input: ArrayView3<u8>,
    params: &DegradationParams,
    rng: &mut R,
) -> Result<(PixelBuffer, MissingMask)> {
    let (height, width) = check_rgba(&input)?;
    let pixel_count = height * width;
    if pixel_count > u32::MAX as usize {
        return Err(RestoreError::InvalidBuffer {
            reason: format!("{width}x{height} exceeds the addressable pixel count"),
        });
    }

    let mut output = input.to_owned();
    add_uniform_noise(&mut output, params.noise_level(), rng);
    let mask = punch_missing(&mut output, params, rng);

    tracing::debug!(
        width,
        height,
        noise_level = params.noise_level(),
        requested = params.missing_count(pixel_count),
        punched = mask.count(),
        "Degraded image"
    );

    Ok((output, mask))
}

// ============================================================================
// Noise
// ============================================================================

/// Add monochrome uniform noise in `[-level, +level]` to every pixel.
///
/// Alpha is untouched. Results are rounded and clamped to 0-255.
fn add_uniform_noise<R: Rng + ?Sized>(image: &mut PixelBuffer, level: u8, rng: &mut R) {
    if level == 0 {
        return;
    }

    let (height, width, _) = image.dim();
    let amplitude = level as f32;

    for y in 0..height {
        for x in 0..width {
            let noise: f32 = rng.gen_range(-amplitude..=amplitude);
            for c in 0..COLOR_CHANNELS {
                let v = image[[y, x, c]] as f32 + noise;
                image[[y, x, c]] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

// ============================================================================
// Missing Pixels
// ============================================================================

fn punch_missing<R: Rng + ?Sized>(
    image: &mut PixelBuffer,
    params: &DegradationParams,
    rng: &mut R,
) -> MissingMask {
    let (height, width, _) = image.dim();
    let pixel_count = height * width;
    let missing_count = params.missing_count(pixel_count);
    let mut mask = MissingMask::new(height, width);

    // u32 ranges keep seeded draws identical on 32-bit (WASM) and 64-bit targets
    match params.sampling() {
        MissingSampling::WithReplacement => {
            for _ in 0..missing_count {
                let idx = rng.gen_range(0..pixel_count as u32) as usize;
                punch(image, &mut mask, idx / width, idx % width);
            }
        }
        MissingSampling::WithoutReplacement => {
            // Partial Fisher-Yates: the first `missing_count` slots become a
            // uniform sample of distinct indices.
            let mut indices: Vec<u32> = (0..pixel_count as u32).collect();
            for i in 0..missing_count {
                let j = rng.gen_range(i as u32..pixel_count as u32) as usize;
                indices.swap(i, j);
                let idx = indices[i] as usize;
                punch(image, &mut mask, idx / width, idx % width);
            }
        }
    }

    mask
}

#[inline]
fn punch(image: &mut PixelBuffer, mask: &mut MissingMask, y: usize, x: usize) {
    image[[y, x, 0]] = 0;
    image[[y, x, 1]] = 0;
    image[[y, x, 2]] = 0;
    image[[y, x, 3]] = 255;
    mask.set_missing(y, x);
}
