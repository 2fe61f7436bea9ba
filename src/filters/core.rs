//! Core utilities shared by the degradation, restoration and quality kernels.
//!
//! This module provides:
//! - RGBA buffer validation and flat-slice conversion
//! - The black-pixel "missing" sentinel and the explicit [`MissingMask`]
//! - Gaussian spatial weights for the 3x3 restoration window

use ndarray::{Array2, Array3, ArrayView3};

use crate::error::{RestoreError, Result};

/// Channels per pixel in a [`PixelBuffer`] (R, G, B, A).
pub const RGBA_CHANNELS: usize = 4;

/// Color channels that take part in noise, restoration and error metrics.
pub const COLOR_CHANNELS: usize = 3;

/// Radius of the restoration neighborhood (3x3 window).
pub const WINDOW_RADIUS: isize = 1;

/// RGBA u8 image of shape (height, width, 4), row-major.
pub type PixelBuffer = Array3<u8>;

/// Validate that `image` is an RGBA buffer and return `(height, width)`.
pub fn check_rgba(image: &ArrayView3<u8>) -> Result<(usize, usize)> {
    let (height, width, channels) = image.dim();
    if channels != RGBA_CHANNELS {
        return Err(RestoreError::InvalidBuffer {
            reason: format!("expected {RGBA_CHANNELS} channels, got {channels}"),
        });
    }
    Ok((height, width))
}

/// Fail with `DimensionMismatch` unless both `(height, width)` pairs agree.
pub fn check_same_dims(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(RestoreError::DimensionMismatch {
            expected_width: expected.1,
            expected_height: expected.0,
            width: actual.1,
            height: actual.0,
        });
    }
    Ok(())
}

/// Wrap a flat RGBA byte sequence as a [`PixelBuffer`].
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn from_flat_rgba(data: &[u8], width: usize, height: usize) -> Result<PixelBuffer> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(RGBA_CHANNELS))
        .ok_or_else(|| RestoreError::InvalidBuffer {
            reason: format!("{width}x{height} RGBA exceeds the addressable size"),
        })?;
    if data.len() != expected {
        return Err(RestoreError::InvalidBuffer {
            reason: format!(
                "{width}x{height} RGBA needs {expected} bytes, got {}",
                data.len()
            ),
        });
    }
    Array3::from_shape_vec((height, width, RGBA_CHANNELS), data.to_vec()).map_err(|e| {
        RestoreError::InvalidBuffer {
            reason: e.to_string(),
        }
    })
}

/// Flatten a [`PixelBuffer`] back into row-major RGBA bytes.
pub fn into_flat_rgba(image: PixelBuffer) -> Vec<u8> {
    if image.is_standard_layout() {
        image.into_raw_vec_and_offset().0
    } else {
        image.iter().copied().collect()
    }
}

/// A pixel is missing iff R = G = B = 0. Alpha is ignored.
#[inline]
pub fn is_missing_rgb(image: &ArrayView3<u8>, y: usize, x: usize) -> bool {
    image[[y, x, 0]] == 0 && image[[y, x, 1]] == 0 && image[[y, x, 2]] == 0
}

/// Gaussian weight for a neighbor at integer offset `(dx, dy)`.
///
/// `exp(-dist^2 / 2)` with `dist = sqrt(dx^2 + dy^2)`; the center weighs 1.
#[inline]
pub fn spatial_weight(dx: isize, dy: isize) -> f64 {
    let dist = ((dx * dx + dy * dy) as f64).sqrt();
    (-dist * dist / 2.0).exp()
}

/// Unnormalized spatial weights of the restoration window, indexed
/// `[dy + radius, dx + radius]`.
pub fn window_weights() -> Array2<f64> {
    let size = (WINDOW_RADIUS * 2 + 1) as usize;
    Array2::from_shape_fn((size, size), |(row, col)| {
        spatial_weight(col as isize - WINDOW_RADIUS, row as isize - WINDOW_RADIUS)
    })
}

/// Explicit per-pixel missing flags, shape (height, width). `true` = missing.
///
/// Unlike the black-pixel sentinel, a mask distinguishes punched pixels from
/// pixels that are genuinely black in the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMask {
    mask: Array2<bool>,
}

impl MissingMask {
    /// A mask of the given size with no missing pixels.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            mask: Array2::from_elem((height, width), false),
        }
    }

    pub fn from_array(mask: Array2<bool>) -> Self {
        Self { mask }
    }

    /// Classify every pixel of `image` with the black-pixel sentinel.
    pub fn from_sentinel(image: ArrayView3<u8>) -> Result<Self> {
        let (height, width) = check_rgba(&image)?;
        let mask = Array2::from_shape_fn((height, width), |(y, x)| is_missing_rgb(&image, y, x));
        Ok(Self { mask })
    }

    /// Wrap one byte per pixel (non-zero = missing), row-major.
    pub fn from_flat(data: &[u8], width: usize, height: usize) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| RestoreError::InvalidBuffer {
            reason: format!("{width}x{height} mask exceeds the addressable size"),
        })?;
        if data.len() != expected {
            return Err(RestoreError::InvalidBuffer {
                reason: format!(
                    "{width}x{height} mask needs {expected} bytes, got {}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            mask: Array2::from_shape_fn((height, width), |(y, x)| data[y * width + x] != 0),
        })
    }

    /// One byte per pixel, row-major: 1 = missing, 0 = present.
    pub fn to_flat(&self) -> Vec<u8> {
        self.mask.iter().map(|&m| m as u8).collect()
    }

    /// `(height, width)` of the mask.
    pub fn dim(&self) -> (usize, usize) {
        self.mask.dim()
    }

    #[inline]
    pub fn is_missing(&self, y: usize, x: usize) -> bool {
        self.mask[[y, x]]
    }

    pub fn set_missing(&mut self, y: usize, x: usize) {
        self.mask[[y, x]] = true;
    }

    /// Number of pixels flagged missing.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn into_array(self) -> Array2<bool> {
        self.mask
    }
}
