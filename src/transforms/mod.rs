//! The transform library: pure `&Raster -> Raster` operations.
//!
//! | Operation | Module |
//! |---|---|
//! | Auto-contrast, brightness, contrast, color | [`tone`] |
//! | Adaptive (tiled) contrast | [`clahe`] |
//! | Sharpness, edge enhance, unsharp mask, detail boost | [`sharpen`] |
//! | Edge-preserving denoise | [`denoise`] |
//! | Gaussian blur, 3x3 kernels, ring blur | [`kernel`] |
//! | Named one-shot filters | [`filters`] |
//! | Alpha blend | [`blend`] (here) |
//!
//! No transform writes to its input: every call allocates and returns a new
//! raster, so a caller can always fall back to the value it passed in.

pub mod clahe;
pub mod denoise;
pub mod filters;
pub mod kernel;
pub mod sharpen;
pub mod tone;

pub use clahe::{ClaheParams, adaptive_contrast};
pub use denoise::{BilateralParams, bilateral, denoise};
pub use filters::{FilterKind, apply_filter};
pub use kernel::gaussian_blur;
pub use sharpen::{UnsharpParams, detail_boost, edge_enhance, sharpness, unsharp_mask};
pub use tone::{auto_contrast, brightness, color, contrast};

use crate::error::{EnhanceError, Result};
use crate::raster::{Raster, clamp_u8};

/// `out = a * (1 - alpha) + b * alpha` per sample.
///
/// Both rasters must have identical dimensions and `alpha` must lie in
/// [0, 1]. `blend(a, b, 0.0) == a` and `blend(a, b, 1.0) == b` exactly.
pub fn blend(a: &Raster, b: &Raster, alpha: f32) -> Result<Raster> {
    if a.dimensions() != b.dimensions() {
        return Err(EnhanceError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(EnhanceError::InvalidParameter(format!(
            "blend alpha must be within [0, 1], got {alpha}"
        )));
    }
    Ok(mix(a, b, alpha))
}

/// [`blend`] for callers that already guarantee matching dimensions.
pub(crate) fn mix(a: &Raster, b: &Raster, alpha: f32) -> Raster {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    combine(a, b, |x, y| x * (1.0 - alpha) + y * alpha)
}

/// `out = reference + factor * (raster - reference)` per sample.
pub(crate) fn extrapolate(reference: &Raster, raster: &Raster, factor: f32) -> Raster {
    debug_assert_eq!(reference.dimensions(), raster.dimensions());
    combine(reference, raster, |r, x| r + factor * (x - r))
}

/// Per-sample `f(a, b)`, rounded and clamped. Callers guarantee equal dimensions.
pub(crate) fn combine(a: &Raster, b: &Raster, f: impl Fn(f32, f32) -> f32) -> Raster {
    let pixels = a
        .pixels()
        .iter()
        .zip(b.pixels())
        .map(|(&x, &y)| clamp_u8(f(x as f32, y as f32)))
        .collect();
    let (w, h) = a.dimensions();
    Raster::from_raw(w, h, pixels).expect("combined rasters share dimensions")
}
