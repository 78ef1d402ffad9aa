//! Global tone and color adjustments.
//!
//! The three scaling operations share one shape: pick a degenerate reference
//! image, then extrapolate away from it with `out = ref + f * (px - ref)`.
//! A factor of 1.0 returns the input, 0.0 returns the reference, values above
//! 1.0 push further away from it.
//!
//! | Operation | Reference |
//! |---|---|
//! | [`brightness`] | black |
//! | [`contrast`] | flat gray at the mean luma |
//! | [`color`] | per-pixel luma (the grayscale version of the image) |

use crate::raster::{Raster, clamp_u8, luma_of};

/// Per-channel histogram stretch.
///
/// For each channel independently, `cutoff` percent of the pixels are
/// discarded from each end of the histogram, and the surviving range is
/// remapped linearly onto 0–255. A channel whose surviving range is empty or a
/// single level is left untouched, so flat images pass through unchanged.
pub fn auto_contrast(raster: &Raster, cutoff: f32) -> Raster {
    let mut histograms = [[0u64; 256]; 3];
    for px in raster.pixels().chunks_exact(Raster::CHANNELS) {
        for c in 0..3 {
            histograms[c][px[c] as usize] += 1;
        }
    }

    let total = raster.pixel_count();
    let luts = histograms.map(|h| stretch_lut(h, total, cutoff));

    raster.map_pixels(|[r, g, b]| {
        [
            luts[0][r as usize],
            luts[1][g as usize],
            luts[2][b as usize],
        ]
    })
}

fn stretch_lut(mut hist: [u64; 256], total: u64, cutoff: f32) -> [u8; 256] {
    let mut identity = [0u8; 256];
    for (i, v) in identity.iter_mut().enumerate() {
        *v = i as u8;
    }

    let cut = (total as f64 * cutoff.max(0.0) as f64 / 100.0) as u64;
    trim(hist.iter_mut(), cut);
    trim(hist.iter_mut().rev(), cut);

    let lo = hist.iter().position(|&n| n > 0);
    let hi = hist.iter().rposition(|&n| n > 0);
    let (lo, hi) = match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => (lo as f32, hi as f32),
        _ => return identity,
    };

    let scale = 255.0 / (hi - lo);
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = clamp_u8((i as f32 - lo) * scale);
    }
    lut
}

/// Remove `cut` samples from the histogram, walking bins in iteration order.
fn trim<'a>(bins: impl Iterator<Item = &'a mut u64>, mut cut: u64) {
    for bin in bins {
        if cut == 0 {
            break;
        }
        let taken = (*bin).min(cut);
        *bin -= taken;
        cut -= taken;
    }
}

/// Scale brightness: `out = f * px`.
pub fn brightness(raster: &Raster, factor: f32) -> Raster {
    raster.map_pixels(|px| px.map(|v| clamp_u8(v as f32 * factor)))
}

/// Scale contrast around the image's mean luma.
pub fn contrast(raster: &Raster, factor: f32) -> Raster {
    let mean = mean_luma(raster).round();
    raster.map_pixels(|px| px.map(|v| clamp_u8(mean + factor * (v as f32 - mean))))
}

/// Scale saturation around each pixel's own luma.
pub fn color(raster: &Raster, factor: f32) -> Raster {
    raster.map_pixels(|px| {
        let l = luma_of(px);
        px.map(|v| clamp_u8(l + factor * (v as f32 - l)))
    })
}

pub(crate) fn mean_luma(raster: &Raster) -> f32 {
    if raster.is_empty() {
        return 0.0;
    }
    let sum: f64 = raster
        .pixels()
        .chunks_exact(Raster::CHANNELS)
        .map(|p| luma_of([p[0], p[1], p[2]]) as f64)
        .sum();
    (sum / raster.pixel_count() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Raster {
        // Channel values span 50..=150 in red, constant elsewhere
        Raster::from_fn(101, 1, |x, _| [50 + x as u8, 100, 30])
    }

    #[test]
    fn auto_contrast_stretches_each_channel() {
        let out = auto_contrast(&ramp(), 0.0);
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(100, 0)[0], 255);
        // Constant channels collapse to a single level and are left alone
        assert_eq!(out.pixel(50, 0)[1], 100);
        assert_eq!(out.pixel(50, 0)[2], 30);
    }

    #[test]
    fn auto_contrast_cutoff_ignores_outliers() {
        let mut pixels = Vec::new();
        for i in 0..100u32 {
            let v = match i {
                0 => 0,
                99 => 255,
                _ => 100 + (i % 2) as u8 * 50,
            };
            pixels.extend_from_slice(&[v, v, v]);
        }
        let raster = Raster::from_raw(100, 1, pixels).unwrap();
        let out = auto_contrast(&raster, 1.0);
        // With the two outliers trimmed, 100 maps to black and 150 to white
        assert_eq!(out.pixel(2, 0)[0], 0);
        assert_eq!(out.pixel(1, 0)[0], 255);
    }

    #[test]
    fn auto_contrast_flat_image_unchanged() {
        let raster = Raster::filled(10, 10, [128, 128, 128]);
        assert_eq!(auto_contrast(&raster, 1.0), raster);
    }

    #[test]
    fn brightness_scales_values() {
        let raster = Raster::filled(1, 1, [100, 200, 10]);
        assert_eq!(brightness(&raster, 1.1).pixel(0, 0), [110, 220, 11]);
        assert_eq!(brightness(&raster, 2.0).pixel(0, 0), [200, 255, 20]);
    }

    #[test]
    fn contrast_identity_at_one() {
        let raster = ramp();
        assert_eq!(contrast(&raster, 1.0), raster);
    }

    #[test]
    fn contrast_pushes_away_from_mean() {
        let raster = Raster::from_fn(2, 1, |x, _| if x == 0 { [100; 3] } else { [200; 3] });
        let out = contrast(&raster, 1.5);
        assert_eq!(out.pixel(0, 0), [75, 75, 75]);
        assert_eq!(out.pixel(1, 0), [225, 225, 225]);
    }

    #[test]
    fn contrast_preserves_flat_gray() {
        let raster = Raster::filled(4, 4, [128, 128, 128]);
        assert_eq!(contrast(&raster, 1.35), raster);
    }

    #[test]
    fn color_leaves_gray_untouched() {
        let raster = Raster::filled(3, 3, [90, 90, 90]);
        assert_eq!(color(&raster, 1.4), raster);
    }

    #[test]
    fn color_zero_desaturates() {
        let raster = Raster::filled(1, 1, [255, 0, 0]);
        let gray = color(&raster, 0.0).pixel(0, 0);
        assert_eq!(gray[0], gray[1]);
        assert_eq!(gray[1], gray[2]);
    }

    #[test]
    fn color_boost_increases_spread() {
        let raster = Raster::filled(1, 1, [180, 120, 90]);
        let [r, _, b] = color(&raster, 1.4).pixel(0, 0);
        assert!(r > 180);
        assert!(b < 90);
    }
}
