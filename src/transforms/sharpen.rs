//! Sharpening operators, from gentlest to strongest.
//!
//! - [`sharpness`]: extrapolate away from a 3x3 smoothed copy.
//! - [`edge_enhance`]: mix in a Laplacian-boosted copy at a small ratio.
//! - [`unsharp_mask`]: classic `orig + amount * (orig - gaussian(orig))`.
//! - [`detail_boost`]: amplify the residual against an edge-preserving
//!   smoothed copy, which targets texture rather than edges.

use super::denoise::{BilateralParams, bilateral};
use super::kernel::{EDGE_ENHANCE, SMOOTH, filter3x3};
use super::{combine, extrapolate, mix};
use crate::raster::Raster;
use image::imageops;

/// Mix ratio of the edge-enhanced copy at full strength.
pub const EDGE_MIX: f32 = 0.3;

/// Unsharp-mask parameters.
///
/// - `radius`: sigma of the Gaussian blur
/// - `percent`: amount of the difference added back (100 = 1x)
/// - `threshold`: differences at or below this many levels are left alone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpParams {
    pub radius: f32,
    pub percent: f32,
    pub threshold: f32,
}

/// Scale sharpness: `f > 1` sharpens, `f < 1` softens, `f == 1` is identity.
pub fn sharpness(raster: &Raster, factor: f32) -> Raster {
    let smoothed = filter3x3(raster, &SMOOTH);
    extrapolate(&smoothed, raster, factor)
}

/// Blend with a Laplacian-boosted copy at `EDGE_MIX * strength`.
pub fn edge_enhance(raster: &Raster, strength: f32) -> Raster {
    let boosted = filter3x3(raster, &EDGE_ENHANCE);
    mix(raster, &boosted, (EDGE_MIX * strength).clamp(0.0, 1.0))
}

/// Unsharp mask with a per-sample threshold.
///
/// The blurred copy comes from `imageops::blur`; `imageops::unsharpen` has
/// no amount, so the thresholded difference is scaled here.
pub fn unsharp_mask(raster: &Raster, params: UnsharpParams) -> Raster {
    if params.radius <= 0.0 || raster.is_empty() {
        return raster.clone();
    }
    let blurred = Raster::from(imageops::blur(raster.as_image(), params.radius));
    let amount = params.percent / 100.0;
    combine(raster, &blurred, |p, b| {
        let diff = p - b;
        if diff.abs() > params.threshold {
            p + amount * diff
        } else {
            p
        }
    })
}

/// Add back the high-frequency residual amplified by `1 + strength`.
pub fn detail_boost(raster: &Raster, strength: f32) -> Raster {
    let base = bilateral(raster, BilateralParams::detail_base());
    let gain = 1.0 + strength.max(0.0);
    extrapolate(&base, raster, 1.0 + gain)
}
