//! Numeric kernels for degradation, restoration and quality evaluation.
//!
//! ## Buffer Format
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | RGBA8 | (H, W, 4) | u8 | Red, green, blue, alpha, 0-255, row-major |
//!
//! ## Architecture
//!
//! All kernels follow these principles:
//! - **Fresh outputs** - Inputs are borrowed views, outputs are new buffers
//! - **Color only** - Noise, restoration and error metrics touch R, G, B; alpha is carried
//! - **Explicit randomness** - Random draws come from a caller-supplied RNG
//! - **Thread-safe** - Restoration rows run in parallel with rayon
//!
//! ## Kernels
//!
//! - **degrade**: uniform monochrome noise, then missing-pixel punch-outs
//! - **restore**: Gaussian-weighted 3x3 estimator (sentinel or explicit mask)
//! - **quality**: RMSE before/after and relative improvement

pub mod core;
pub mod degrade;
pub mod quality;
pub mod restore;
