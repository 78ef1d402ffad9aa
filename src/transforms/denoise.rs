//! Edge-preserving smoothing (bilateral filter).
//!
//! Each output pixel is a weighted mean of its window, where the weight is the
//! product of a spatial Gaussian and a range Gaussian over the L1 color
//! distance to the center pixel. Flat regions are averaged; pixels across a
//! strong edge get almost no weight, so edges survive.

use crate::raster::{Raster, clamp_u8};

/// Bilateral filter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralParams {
    /// Window half-width in pixels.
    pub radius: u32,
    /// Range sigma, in 8-bit levels of summed channel difference.
    pub sigma_color: f32,
    /// Spatial sigma, in pixels.
    pub sigma_space: f32,
}

impl BilateralParams {
    /// Parameters for [`denoise`] at `strength` in [0, 1]; both the window and
    /// the range sigma grow with strength.
    pub fn for_strength(strength: f32) -> Self {
        let s = strength.clamp(0.0, 1.0);
        let radius = 1 + (s * 2.0).round() as u32;
        Self {
            radius,
            sigma_color: 10.0 + 40.0 * s,
            sigma_space: radius as f32,
        }
    }

    /// Heavy smoothing used as the base layer for detail extraction.
    pub fn detail_base() -> Self {
        Self {
            radius: 4,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

/// Bilateral-filter a raster.
pub fn bilateral(raster: &Raster, params: BilateralParams) -> Raster {
    let (w, h) = raster.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let r = params.radius as isize;
    let src = raster.pixels();

    let space_coeff = -0.5 / (params.sigma_space * params.sigma_space).max(f32::EPSILON);
    let color_coeff = -0.5 / (params.sigma_color * params.sigma_color).max(f32::EPSILON);

    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let d2 = (dx * dx + dy * dy) as f32;
            offsets.push((dx, dy, (d2 * space_coeff).exp()));
        }
    }
    let color_weight: Vec<f32> = (0..3 * 256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut out = Vec::with_capacity(src.len());
    for y in 0..hu {
        for x in 0..wu {
            let ci = (y * wu + x) * 3;
            let center = &src[ci..ci + 3];
            let mut acc = [0.0f32; 3];
            let mut total = 0.0f32;
            for &(dx, dy, space_w) in &offsets {
                let sx = (x as isize + dx).clamp(0, wu as isize - 1) as usize;
                let sy = (y as isize + dy).clamp(0, hu as isize - 1) as usize;
                let si = (sy * wu + sx) * 3;
                let sample = &src[si..si + 3];
                let dist = (0..3)
                    .map(|c| (sample[c] as i32 - center[c] as i32).unsigned_abs() as usize)
                    .sum::<usize>();
                let weight = space_w * color_weight[dist];
                for c in 0..3 {
                    acc[c] += weight * sample[c] as f32;
                }
                total += weight;
            }
            for c in 0..3 {
                out.push(clamp_u8(acc[c] / total));
            }
        }
    }

    Raster::from_raw(w, h, out).expect("bilateral output has one pixel per input pixel")
}

/// Edge-preserving denoise; `strength` in [0, 1], 0 is a no-op.
pub fn denoise(raster: &Raster, strength: f32) -> Raster {
    if strength <= 0.0 {
        return raster.clone();
    }
    bilateral(raster, BilateralParams::for_strength(strength))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half dark, right half bright, with a checkerboard of ±6 noise.
    fn noisy_step() -> Raster {
        Raster::from_fn(20, 20, |x, y| {
            let base: i32 = if x < 10 { 60 } else { 190 };
            let noise = if (x + y) % 2 == 0 { 6 } else { -6 };
            let v = (base + noise) as u8;
            [v, v, v]
        })
    }

    #[test]
    fn params_grow_with_strength() {
        let low = BilateralParams::for_strength(0.1);
        let high = BilateralParams::for_strength(0.9);
        assert!(high.radius > low.radius);
        assert!(high.sigma_color > low.sigma_color);
    }

    #[test]
    fn denoise_zero_strength_is_identity() {
        let raster = noisy_step();
        assert_eq!(denoise(&raster, 0.0), raster);
    }

    #[test]
    fn denoise_flattens_noise() {
        let out = denoise(&noisy_step(), 0.5);
        let a = out.pixel(3, 4)[0] as i32;
        let b = out.pixel(4, 4)[0] as i32;
        assert!((a - b).abs() < 12);
    }

    #[test]
    fn denoise_preserves_edge() {
        let out = denoise(&noisy_step(), 0.5);
        assert!(out.pixel(8, 10)[0] < 100);
        assert!(out.pixel(11, 10)[0] > 150);
    }

    #[test]
    fn bilateral_uniform_unchanged() {
        let raster = Raster::filled(8, 8, [33, 66, 99]);
        assert_eq!(bilateral(&raster, BilateralParams::detail_base()), raster);
    }
}
