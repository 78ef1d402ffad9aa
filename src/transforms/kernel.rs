//! Spatial filters shared by the transforms.
//!
//! The fixed 3x3 kernels run through `imageops::filter3x3`, the Gaussian
//! through `imageops::fast_blur` (a three-pass box cascade whose cost does
//! not depend on sigma, which keeps the sigma-40 mask feather affordable).
//! The 5x5 ring blur has no `imageops` counterpart and is convolved here.
//!
//! Every filter replicates edge pixels at the borders, so a uniform image
//! passes through unchanged.

use crate::raster::Raster;
use image::{GrayImage, ImageBuffer, Pixel, imageops};

/// A 3x3 kernel, row-major. `filter3x3` divides by the weight sum, or by 1
/// when the weights sum to zero.
pub type Kernel3 = [f32; 9];

/// 3x3 smoothing, the reference image for sharpness scaling.
pub const SMOOTH: Kernel3 = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

pub const SHARPEN: Kernel3 = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];

pub const DETAIL: Kernel3 = [0.0, -1.0, 0.0, -1.0, 10.0, -1.0, 0.0, -1.0, 0.0];

/// Laplacian-boosted identity: center weight 10 against eight -1 neighbours.
pub const EDGE_ENHANCE: Kernel3 = [-1.0, -1.0, -1.0, -1.0, 10.0, -1.0, -1.0, -1.0, -1.0];

/// 8-neighbour Laplacian; flat regions map to zero.
pub const FIND_EDGES: Kernel3 = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

/// Radius of the ring blur: only the outermost ring of a 5x5 window counts.
const RING_RADIUS: i64 = 2;
const RING_TAPS: u32 = 16;

/// Copy of `image` grown by `pad` pixels on every side, edges replicated.
///
/// `image` must be non-empty.
fn replicate_border<P: Pixel>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    pad: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (w, h) = image.dimensions();
    ImageBuffer::from_fn(w + 2 * pad, h + 2 * pad, |x, y| {
        let sx = x.saturating_sub(pad).min(w - 1);
        let sy = y.saturating_sub(pad).min(h - 1);
        *image.get_pixel(sx, sy)
    })
}

/// Apply a 3x3 kernel to every channel.
///
/// `imageops::filter3x3` skips the outermost row and column, so the raster
/// is padded by one replicated pixel first and cropped back afterwards.
pub fn filter3x3(raster: &Raster, kernel: &Kernel3) -> Raster {
    if raster.is_empty() {
        return raster.clone();
    }
    let (w, h) = raster.dimensions();
    let padded = replicate_border(raster.as_image(), 1);
    let filtered = imageops::filter3x3(&padded, kernel);
    Raster::from(imageops::crop_imm(&filtered, 1, 1, w, h).to_image())
}

/// 5x5 ring blur: the mean of the sixteen pixels two steps away.
pub fn ring_blur(raster: &Raster) -> Raster {
    if raster.is_empty() {
        return raster.clone();
    }
    let (w, h) = raster.dimensions();
    let src = raster.as_image();
    let at = |x: i64, y: i64| {
        let sx = x.clamp(0, w as i64 - 1) as u32;
        let sy = y.clamp(0, h as i64 - 1) as u32;
        src.get_pixel(sx, sy).0
    };
    Raster::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let mut acc = [0u32; 3];
        for dy in -RING_RADIUS..=RING_RADIUS {
            for dx in -RING_RADIUS..=RING_RADIUS {
                if dx.abs() != RING_RADIUS && dy.abs() != RING_RADIUS {
                    continue;
                }
                let px = at(x + dx, y + dy);
                for c in 0..3 {
                    acc[c] += px[c] as u32;
                }
            }
        }
        acc.map(|sum| ((sum + RING_TAPS / 2) / RING_TAPS) as u8)
    })
}

/// Gaussian-blur every channel. `sigma <= 0` returns a copy.
pub fn gaussian_blur(raster: &Raster, sigma: f32) -> Raster {
    if sigma <= 0.0 || raster.is_empty() {
        return raster.clone();
    }
    Raster::from(imageops::fast_blur(raster.as_image(), sigma))
}

/// [`gaussian_blur`] for single-channel mask images.
pub(crate) fn gaussian_blur_gray(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    imageops::fast_blur(image, sigma)
}
