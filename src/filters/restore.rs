//! Spatial restoration: Gaussian-weighted 3x3 local estimator.
//!
//! Every pixel is re-estimated from the pixels of its 3x3 window that are not
//! missing, weighted by `exp(-dist^2 / 2)`:
//! - **Missing pixels** are filled from their present neighbors. A hole with
//!   no present neighbor stays black; this is a normal outcome, not an error.
//! - **Present pixels** are averaged with their present neighbors and
//!   themselves, which doubles as the noise reduction step.
//!
//! Out-of-bounds offsets are skipped (no padding, no wraparound). Only R, G
//! and B are estimated; alpha is copied from the input.
//!
//! All reads come from the frozen input and each output row is written by one
//! task, so rows are processed in parallel with rayon.

use ndarray::{Array2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::error::Result;
use crate::filters::core::{
    check_rgba, check_same_dims, is_missing_rgb, window_weights, MissingMask, PixelBuffer,
    COLOR_CHANNELS, WINDOW_RADIUS,
};

/// Pixel counts gathered during a restoration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    /// Pixels classified missing in the input.
    pub missing: usize,
    /// Missing pixels left as-is because no neighbor qualified.
    pub unfilled: usize,
}

impl RestoreReport {
    pub fn filled(&self) -> usize {
        self.missing - self.unfilled
    }
}

/// Restore an RGBA u8 image, classifying missing pixels by the black sentinel.
///
/// # Arguments
/// * `input` - Degraded RGBA image (height, width, 4)
///
/// # Returns
/// Newly allocated restored image with the same dimensions
pub fn restore(input: ArrayView3<u8>) -> Result<PixelBuffer> {
    restore_with_report(input, None).map(|(output, _)| output)
}

/// Restore an RGBA u8 image using an explicit missing-pixel mask.
///
/// Pixels that are black in the source but not flagged in `mask` are treated
/// as present.
pub fn restore_with_mask(input: ArrayView3<u8>, mask: &MissingMask) -> Result<PixelBuffer> {
    restore_with_report(input, Some(mask)).map(|(output, _)| output)
}

/// Restore an image and report how many holes were found and left unfilled.
///
/// With `mask = None` the black-pixel sentinel decides which pixels are missing.
pub fn restore_with_report(
    input: ArrayView3<u8>,
    mask: Option<&MissingMask>,
) -> Result<(PixelBuffer, RestoreReport)> {
    let dims = check_rgba(&input)?;

    let (output, report) = match mask {
        Some(mask) => {
            check_same_dims(dims, mask.dim())?;
            estimate(&input, |y, x| mask.is_missing(y, x))
        }
        None => estimate(&input, |y, x| is_missing_rgb(&input, y, x)),
    };

    tracing::debug!(
        width = dims.1,
        height = dims.0,
        missing = report.missing,
        filled = report.filled(),
        "Restored image"
    );
    if report.unfilled > 0 {
        tracing::warn!(
            unfilled = report.unfilled,
            "Restoration left pixels without a present neighbor unfilled"
        );
    }

    Ok((output, report))
}

fn estimate<F>(input: &ArrayView3<u8>, is_missing: F) -> (PixelBuffer, RestoreReport)
where
    F: Fn(usize, usize) -> bool + Sync,
{
    let (_, width, _) = input.dim();
    let weights = window_weights();
    let mut output = input.to_owned();

    let (missing, unfilled) = output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .map(|(y, mut row)| {
            let mut missing = 0usize;
            let mut unfilled = 0usize;

            for x in 0..width {
                let center_missing = is_missing(y, x);
                let value = weighted_mean(
                    input,
                    &weights,
                    y,
                    x,
                    !center_missing,
                    |sy, sx| !is_missing(sy, sx),
                );

                match value {
                    Some(rgb) => {
                        for c in 0..COLOR_CHANNELS {
                            row[[x, c]] = rgb[c];
                        }
                    }
                    None if center_missing => unfilled += 1,
                    None => {}
                }
                if center_missing {
                    missing += 1;
                }
            }

            (missing, unfilled)
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    (output, RestoreReport { missing, unfilled })
}

/// Weighted mean of the eligible pixels in the window around `(y, x)`.
///
/// `include_center` decides whether the center pixel may contribute at all;
/// `eligible` filters every other position. Returns `None` if no position
/// contributed.
fn weighted_mean<E>(
    input: &ArrayView3<u8>,
    weights: &Array2<f64>,
    y: usize,
    x: usize,
    include_center: bool,
    eligible: E,
) -> Option<[u8; COLOR_CHANNELS]>
where
    E: Fn(usize, usize) -> bool,
{
    let (height, width, _) = input.dim();
    let mut sum = [0.0f64; COLOR_CHANNELS];
    let mut weight_sum = 0.0f64;

    for dy in -WINDOW_RADIUS..=WINDOW_RADIUS {
        let sy = y as isize + dy;
        if sy < 0 || sy >= height as isize {
            continue;
        }

        for dx in -WINDOW_RADIUS..=WINDOW_RADIUS {
            let sx = x as isize + dx;
            if sx < 0 || sx >= width as isize {
                continue;
            }
            if dx == 0 && dy == 0 && !include_center {
                continue;
            }

            let (sy, sx) = (sy as usize, sx as usize);
            if !eligible(sy, sx) {
                continue;
            }

            let weight = weights[[(dy + WINDOW_RADIUS) as usize, (dx + WINDOW_RADIUS) as usize]];
            for c in 0..COLOR_CHANNELS {
                sum[c] += input[[sy, sx, c]] as f64 * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        let mut rgb = [0u8; COLOR_CHANNELS];
        for c in 0..COLOR_CHANNELS {
            rgb[c] = (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
        }
        Some(rgb)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestoreError;
    use ndarray::Array3;

    fn flat_image(height: usize, width: usize, rgba: [u8; 4]) -> Array3<u8> {
        Array3::from_shape_fn((height, width, 4), |(_, _, c)| rgba[c])
    }

    fn punch(img: &mut Array3<u8>, y: usize, x: usize) {
        img[[y, x, 0]] = 0;
        img[[y, x, 1]] = 0;
        img[[y, x, 2]] = 0;
        img[[y, x, 3]] = 255;
    }

    fn rgb(img: &Array3<u8>, y: usize, x: usize) -> [u8; 3] {
        [img[[y, x, 0]], img[[y, x, 1]], img[[y, x, 2]]]
    }

    #[test]
    fn test_isolated_hole_is_filled() {
        let mut img = flat_image(5, 5, [100, 150, 200, 255]);
        punch(&mut img, 2, 2);

        let (result, report) = restore_with_report(img.view(), None).unwrap();
        assert_eq!(rgb(&result, 2, 2), [100, 150, 200]);
        assert_eq!(report, RestoreReport { missing: 1, unfilled: 0 });
        // Flat present pixels are unchanged by smoothing
        assert_eq!(rgb(&result, 0, 0), [100, 150, 200]);
        assert_eq!(rgb(&result, 2, 1), [100, 150, 200]);
    }

    #[test]
    fn test_corner_hole_block_leaves_enclosed_pixels_black() {
        let mut img = flat_image(6, 6, [80, 90, 100, 255]);
        for y in 0..3 {
            for x in 0..3 {
                punch(&mut img, y, x);
            }
        }

        let (result, report) = restore_with_report(img.view(), None).unwrap();
        // These four see only other holes within their windows
        for (y, x) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(rgb(&result, y, x), [0, 0, 0], "pixel ({y}, {x})");
        }
        for (y, x) in [(0, 2), (1, 2), (2, 0), (2, 1), (2, 2)] {
            assert_eq!(rgb(&result, y, x), [80, 90, 100], "pixel ({y}, {x})");
        }
        assert_eq!(report.missing, 9);
        assert_eq!(report.unfilled, 4);
        assert_eq!(report.filled(), 5);
    }

    #[test]
    fn test_hole_weights_edges_over_corners() {
        let mut img = flat_image(3, 3, [200, 200, 200, 255]);
        for (y, x) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
            for c in 0..3 {
                img[[y, x, c]] = 100;
            }
        }
        punch(&mut img, 1, 1);

        let result = restore(img.view()).unwrap();
        // (4*e^-0.5*100 + 4*e^-1*200) / (4*e^-0.5 + 4*e^-1) = 137.75
        assert_eq!(rgb(&result, 1, 1), [138, 138, 138]);
    }

    #[test]
    fn test_present_pixels_are_smoothed() {
        let mut img = Array3::<u8>::zeros((1, 3, 4));
        for (x, v) in [30u8, 60, 90].into_iter().enumerate() {
            for c in 0..3 {
                img[[0, x, c]] = v;
            }
            img[[0, x, 3]] = 255;
        }

        let result = restore(img.view()).unwrap();
        // (30 + 60*e^-0.5) / (1 + e^-0.5) = 41.33
        assert_eq!(result[[0, 0, 0]], 41);
        assert_eq!(result[[0, 1, 0]], 60);
        // (90 + 60*e^-0.5) / (1 + e^-0.5) = 78.67
        assert_eq!(result[[0, 2, 0]], 79);
    }

    #[test]
    fn test_present_pixels_ignore_holes() {
        let mut img = flat_image(3, 3, [90, 90, 90, 255]);
        punch(&mut img, 1, 1);

        let result = restore(img.view()).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(rgb(&result, y, x), [90, 90, 90]);
            }
        }
    }

    #[test]
    fn test_alpha_copied_from_input() {
        let mut img = flat_image(4, 4, [50, 60, 70, 128]);
        punch(&mut img, 1, 2);

        let result = restore(img.view()).unwrap();
        assert_eq!(result[[0, 0, 3]], 128);
        assert_eq!(result[[1, 2, 3]], 255);
    }

    #[test]
    fn test_deterministic() {
        let img = Array3::from_shape_fn((17, 13, 4), |(y, x, c)| {
            if (y * 13 + x) % 5 == 0 && c < 3 {
                0
            } else {
                ((y * 31 + x * 17 + c * 7) % 256) as u8
            }
        });

        let a = restore(img.view()).unwrap();
        let b = restore(img.view()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dim(), img.dim());
    }

    #[test]
    fn test_explicit_mask_keeps_real_black() {
        let mut img = flat_image(3, 3, [90, 90, 90, 255]);
        punch(&mut img, 1, 1);

        // Sentinel mode treats the black center as a hole
        let sentinel = restore(img.view()).unwrap();
        assert_eq!(rgb(&sentinel, 1, 1), [90, 90, 90]);

        // With an empty mask it is a present (black) pixel and gets smoothed
        let mask = MissingMask::new(3, 3);
        let (masked, report) = restore_with_report(img.view(), Some(&mask)).unwrap();
        // 90 * (4e^-0.5 + 4e^-1) / (1 + 4e^-0.5 + 4e^-1) = 71.62
        assert_eq!(rgb(&masked, 1, 1), [72, 72, 72]);
        assert_eq!(report.missing, 0);
    }

    #[test]
    fn test_explicit_mask_fills_flagged_pixel() {
        let img = flat_image(3, 3, [40, 40, 40, 255]);
        let mut mask = MissingMask::new(3, 3);
        mask.set_missing(0, 0);

        let result = restore_with_mask(img.view(), &mask).unwrap();
        assert_eq!(rgb(&result, 0, 0), [40, 40, 40]);
    }

    #[test]
    fn test_mask_survives_flat_bytes() {
        let mut img = flat_image(4, 4, [70, 70, 70, 255]);
        punch(&mut img, 1, 1);
        for c in 0..3 {
            img[[3, 3, c]] = 0;
        }
        let mut mask = MissingMask::new(4, 4);
        mask.set_missing(1, 1);

        let bytes = mask.to_flat();
        let decoded = MissingMask::from_flat(&bytes, 4, 4).unwrap();
        assert_eq!(decoded, mask);

        let result = restore_with_mask(img.view(), &decoded).unwrap();
        assert_eq!(result, restore_with_mask(img.view(), &mask).unwrap());
        assert_eq!(rgb(&result, 1, 1), [70, 70, 70]);
        // Unflagged black pixel is smoothed, not filled
        assert_ne!(rgb(&result, 3, 3), [70, 70, 70]);
    }

    #[test]
    fn test_mask_dimension_mismatch() {
        let img = flat_image(3, 4, [40, 40, 40, 255]);
        let mask = MissingMask::new(4, 3);

        assert!(matches!(
            restore_with_mask(img.view(), &mask),
            Err(RestoreError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_non_rgba() {
        let img = Array3::<u8>::zeros((3, 3, 1));
        assert!(matches!(
            restore(img.view()),
            Err(RestoreError::InvalidBuffer { .. })
        ));
    }

    #[test]
    fn test_single_hole_image_unfilled() {
        let mut img = flat_image(1, 1, [0, 0, 0, 255]);
        punch(&mut img, 0, 0);

        let (result, report) = restore_with_report(img.view(), None).unwrap();
        assert_eq!(result, img);
        assert_eq!(report.unfilled, 1);
    }
}
