//! Subject masks and masked compositing for the background-blur effect.
//!
//! A [`Mask`] is a single-channel weight field: 255 keeps the sharp source
//! pixel, 0 takes the blurred one, anything between mixes linearly.
//!
//! ## Strategies
//!
//! - [`MaskStrategy::Radial`] (default): a soft disc centred on the frame.
//!   Fifty concentric circles are painted from the outermost inward, each
//!   more opaque than the last, over a zero background; a wide Gaussian
//!   then removes the banding.
//! - [`MaskStrategy::Edges`]: keeps high-detail regions sharp. Edges are
//!   detected, thresholded, dilated and feathered.

use crate::error::{EnhanceError, Result};
use crate::raster::{Raster, clamp_u8, luma_of};
use crate::transforms::kernel::{self, FIND_EDGES, filter3x3, gaussian_blur_gray};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of concentric circles in the radial mask.
pub const RADIAL_STEPS: u32 = 50;
/// Outermost circle radius relative to half the short edge.
pub const RADIAL_OVERSHOOT: f32 = 1.5;
/// Opacity falloff exponent.
pub const RADIAL_FALLOFF: f32 = 0.6;
/// Feathering sigma for the radial mask.
pub const RADIAL_FEATHER: f32 = 40.0;

const EDGE_CONTRAST: f32 = 3.0;
const EDGE_THRESHOLD: f32 = 30.0;
/// Chebyshev dilation radius: a 15x15 square.
const EDGE_DILATION: u8 = 7;
const EDGE_FEATHER: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskStrategy {
    #[default]
    Radial,
    Edges,
}

impl MaskStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MaskStrategy::Radial => "radial",
            MaskStrategy::Edges => "edges",
        }
    }

    /// Build a mask matching `raster`'s dimensions.
    pub fn build(self, raster: &Raster) -> Mask {
        match self {
            MaskStrategy::Radial => radial_mask(raster.width(), raster.height()),
            MaskStrategy::Edges => edge_mask(raster),
        }
    }
}

impl fmt::Display for MaskStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaskStrategy {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radial" => Ok(MaskStrategy::Radial),
            "edges" | "edge" => Ok(MaskStrategy::Edges),
            other => Err(EnhanceError::InvalidParameter(format!(
                "unknown mask strategy: {other}"
            ))),
        }
    }
}

/// Single-channel weight field, 0 = background, 255 = subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

impl Mask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.values[(y * self.width + x) as usize]
    }

    fn from_image(image: GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            values: image.into_raw(),
        }
    }
}

/// Opacity of circle `i` (0 is the innermost).
fn ring_opacity(i: u32) -> f32 {
    let t = i as f32 / RADIAL_STEPS as f32;
    (255.0 * (1.0 - t.powf(RADIAL_FALLOFF))).floor()
}

/// Soft radial mask, opaque at the centre and fading toward the corners.
pub fn radial_mask(width: u32, height: u32) -> Mask {
    let (cx, cy) = ((width / 2) as i64, (height / 2) as i64);
    let max_radius = (width.min(height) / 2) as f32;
    let radii: Vec<i64> = (0..RADIAL_STEPS)
        .map(|i| (max_radius * (i as f32 / RADIAL_STEPS as f32) * RADIAL_OVERSHOOT) as i64)
        .collect();

    let painted = GrayImage::from_fn(width, height, |x, y| {
        let d2 = (x as i64 - cx).pow(2) + (y as i64 - cy).pow(2);
        // Innermost circle covering the pixel wins, since it is painted last
        let value = radii
            .iter()
            .position(|&r| d2 <= r * r)
            .map_or(0.0, |i| ring_opacity(i as u32));
        Luma([value as u8])
    });

    Mask::from_image(gaussian_blur_gray(&painted, RADIAL_FEATHER))
}

/// Mask that keeps detailed regions sharp.
pub fn edge_mask(raster: &Raster) -> Mask {
    let (w, h) = raster.dimensions();
    if raster.is_empty() {
        return Mask::from_image(GrayImage::new(w, h));
    }
    let edges = filter3x3(raster, &FIND_EDGES);
    let luma: Vec<f32> = edges
        .pixels()
        .chunks_exact(Raster::CHANNELS)
        .map(|p| clamp_u8(luma_of([p[0], p[1], p[2]])) as f32)
        .collect();

    let mean = if luma.is_empty() {
        0.0
    } else {
        (luma.iter().map(|&v| v as f64).sum::<f64>() / luma.len() as f64).round() as f32
    };
    let binary = GrayImage::from_fn(w, h, |x, y| {
        let v = luma[(y * w + x) as usize];
        let boosted = clamp_u8(mean + EDGE_CONTRAST * (v - mean)) as f32;
        Luma([if boosted > EDGE_THRESHOLD { 255 } else { 0 }])
    });

    let dilated = dilate(&binary, Norm::LInf, EDGE_DILATION);
    Mask::from_image(gaussian_blur_gray(&dilated, EDGE_FEATHER))
}

/// Per-pixel mix: `sharp * m/255 + blurred * (1 - m/255)`, rounded.
///
/// Every output sample lies between the two inputs.
pub fn composite(sharp: &Raster, blurred: &Raster, mask: &Mask) -> Result<Raster> {
    if sharp.dimensions() != blurred.dimensions() {
        return Err(EnhanceError::DimensionMismatch {
            left: sharp.dimensions(),
            right: blurred.dimensions(),
        });
    }
    if sharp.dimensions() != mask.dimensions() {
        return Err(EnhanceError::DimensionMismatch {
            left: sharp.dimensions(),
            right: mask.dimensions(),
        });
    }

    let pixels = sharp
        .pixels()
        .chunks_exact(Raster::CHANNELS)
        .zip(blurred.pixels().chunks_exact(Raster::CHANNELS))
        .zip(mask.values())
        .flat_map(|((a, b), &m)| {
            let m = m as u32;
            (0..Raster::CHANNELS)
                .map(move |c| ((a[c] as u32 * m + b[c] as u32 * (255 - m) + 127) / 255) as u8)
        })
        .collect();
    Raster::from_raw(sharp.width(), sharp.height(), pixels)
}

/// Blur `raster` with sigma `blur_strength` and composite it under `mask`.
pub fn blur_with_mask(raster: &Raster, mask: &Mask, blur_strength: f32) -> Result<Raster> {
    let blurred = kernel::gaussian_blur(raster, blur_strength);
    composite(raster, &blurred, mask)
}
