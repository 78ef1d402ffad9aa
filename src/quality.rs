//! Quality analysis: brightness, contrast and sharpness scores.
//!
//! All three scores derive from the ITU-R 601 luma plane:
//!
//! - **brightness**: mean luma / 255, in [0, 1]
//! - **contrast**: luma standard deviation / 128 (unclamped; a two-level
//!   black/white image scores about 1.0)
//! - **sharpness**: variance of the 4-neighbour Laplacian / 1000, clamped to
//!   [0, 1]
//!
//! The enhancement façade uses these to decide whether to denoise or apply
//! adaptive contrast before the preset recipe runs.

use crate::error::Result;
use crate::raster::Raster;
use serde::Serialize;

/// Brightness below this suggests enhancement.
pub const DIM_THRESHOLD: f64 = 0.4;
/// Contrast below this suggests enhancement.
pub const FLAT_THRESHOLD: f64 = 0.5;
/// Sharpness below this suggests enhancement.
pub const SOFT_THRESHOLD: f64 = 0.3;

/// Laplacian variance that maps to a sharpness score of 1.0.
const SHARPNESS_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub brightness: f64,
    pub contrast: f64,
    pub sharpness: f64,
    pub needs_enhancement: bool,
}

impl QualityMetrics {
    fn new(brightness: f64, contrast: f64, sharpness: f64) -> Self {
        Self {
            brightness,
            contrast,
            sharpness,
            needs_enhancement: brightness < DIM_THRESHOLD
                || contrast < FLAT_THRESHOLD
                || sharpness < SOFT_THRESHOLD,
        }
    }
}

/// Score a raster. Fails with `InvalidInput` on a zero-area raster.
pub fn analyze(raster: &Raster) -> Result<QualityMetrics> {
    raster.ensure_non_empty()?;
    let (w, h) = (raster.width() as usize, raster.height() as usize);
    let luma = raster.luma();

    let (mean, variance) = mean_and_variance(luma.iter().map(|&v| v as f64));
    let brightness = mean / 255.0;
    let contrast = variance.sqrt() / 128.0;

    let at = |x: isize, y: isize| {
        let x = x.clamp(0, w as isize - 1) as usize;
        let y = y.clamp(0, h as isize - 1) as usize;
        luma[y * w + x] as f64
    };
    let laplacian = (0..h as isize).flat_map(|y| {
        (0..w as isize).map(move |x| {
            at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y)
        })
    });
    let (_, lap_variance) = mean_and_variance(laplacian);
    let sharpness = (lap_variance / SHARPNESS_SCALE).clamp(0.0, 1.0);

    Ok(QualityMetrics::new(brightness, contrast, sharpness))
}

/// Population mean and variance in one pass (Welford).
fn mean_and_variance(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut n = 0u64;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for v in values {
        n += 1;
        let delta = v - mean;
        mean += delta / n as f64;
        m2 += delta * (v - mean);
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    (mean, m2 / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnhanceError;

    #[test]
    fn uniform_gray_scores() {
        let m = analyze(&Raster::filled(20, 20, [128, 128, 128])).unwrap();
        assert!((m.brightness - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(m.contrast, 0.0);
        assert_eq!(m.sharpness, 0.0);
        assert!(m.needs_enhancement);
    }

    #[test]
    fn black_and_white_halves_have_full_contrast() {
        let raster = Raster::from_fn(10, 10, |x, _| if x < 5 { [0; 3] } else { [255; 3] });
        let m = analyze(&raster).unwrap();
        assert!((m.brightness - 0.5).abs() < 1e-9);
        // stddev of a 50/50 split between 0 and 255 is 127.5
        assert!((m.contrast - 127.5 / 128.0).abs() < 1e-9);
    }

    #[test]
    fn checkerboard_is_maximally_sharp() {
        let raster = Raster::from_fn(16, 16, |x, y| {
            if (x + y) % 2 == 0 { [0; 3] } else { [255; 3] }
        });
        let m = analyze(&raster).unwrap();
        assert_eq!(m.sharpness, 1.0);
        assert!(!m.needs_enhancement);
    }

    #[test]
    fn sharpness_stays_in_unit_range() {
        let raster = Raster::from_fn(9, 7, |x, y| [(x * 28) as u8, (y * 36) as u8, 50]);
        let m = analyze(&raster).unwrap();
        assert!((0.0..=1.0).contains(&m.sharpness));
    }

    #[test]
    fn dark_image_needs_enhancement() {
        let raster = Raster::from_fn(16, 16, |x, y| {
            if (x + y) % 2 == 0 { [0; 3] } else { [60; 3] }
        });
        let m = analyze(&raster).unwrap();
        assert!(m.brightness < DIM_THRESHOLD);
        assert!(m.needs_enhancement);
    }

    #[test]
    fn zero_area_is_invalid_input() {
        let err = analyze(&Raster::filled(0, 0, [0; 3])).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidInput(_)));
    }

    #[test]
    fn single_pixel_is_analyzable() {
        let m = analyze(&Raster::filled(1, 1, [255, 255, 255])).unwrap();
        assert_eq!(m.brightness, 1.0);
        assert_eq!(m.sharpness, 0.0);
    }
}
