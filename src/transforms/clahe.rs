//! Contrast-limited adaptive histogram equalization on the luma channel.
//!
//! The image is split into a grid of tiles; each tile gets its own equalizing
//! lookup table, built from a histogram whose bins are clipped at
//! `clip_limit * tile_area / 256` with the excess spread evenly across all
//! bins. Pixels are mapped by bilinear interpolation between the four nearest
//! tile tables, which hides tile seams.
//!
//! Color is preserved by shifting every channel by the same amount the luma
//! moved (`px + (L' - L)`), which keeps both chroma differences (Cb/Cr)
//! constant.

use crate::raster::{Raster, clamp_u8};

/// CLAHE parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheParams {
    /// Histogram clip limit, relative to a uniform distribution.
    pub clip_limit: f32,
    /// Tile grid as (columns, rows).
    pub grid: (u32, u32),
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            grid: (8, 8),
        }
    }
}

/// Apply CLAHE to the luma channel and recombine with the original chroma.
pub fn adaptive_contrast(raster: &Raster, params: ClaheParams) -> Raster {
    if raster.is_empty() {
        return raster.clone();
    }
    let (w, h) = raster.dimensions();
    let luma: Vec<u8> = raster.luma().into_iter().map(clamp_u8).collect();
    let equalized = clahe(&luma, w, h, params.clip_limit, params.grid);

    let mut i = 0;
    raster.map_pixels(|px| {
        let delta = equalized[i] as f32 - luma[i] as f32;
        i += 1;
        px.map(|v| clamp_u8(v as f32 + delta))
    })
}

/// CLAHE on a single 8-bit channel.
pub fn clahe(gray: &[u8], width: u32, height: u32, clip_limit: f32, grid: (u32, u32)) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let tiles_x = (grid.0.max(1) as usize).min(w);
    let tiles_y = (grid.1.max(1) as usize).min(h);

    let x_bounds: Vec<usize> = (0..=tiles_x).map(|i| i * w / tiles_x).collect();
    let y_bounds: Vec<usize> = (0..=tiles_y).map(|i| i * h / tiles_y).collect();

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut hist = [0u32; 256];
            for y in y_bounds[ty]..y_bounds[ty + 1] {
                for &v in &gray[y * w + x_bounds[tx]..y * w + x_bounds[tx + 1]] {
                    hist[v as usize] += 1;
                }
            }
            let area = ((x_bounds[tx + 1] - x_bounds[tx]) * (y_bounds[ty + 1] - y_bounds[ty])) as u32;
            luts.push(tile_lut(hist, area, clip_limit));
        }
    }

    let tile_w = w as f32 / tiles_x as f32;
    let tile_h = h as f32 / tiles_y as f32;
    let mut out = vec![0u8; w * h];

    for y in 0..h {
        let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);
        for x in 0..w {
            let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
            let v = gray[y * w + x] as usize;
            let at = |tx: usize, ty: usize| luts[ty * tiles_x + tx][v] as f32;
            let top = at(tx0, ty0) * (1.0 - wx) + at(tx1, ty0) * wx;
            let bottom = at(tx0, ty1) * (1.0 - wx) + at(tx1, ty1) * wx;
            out[y * w + x] = clamp_u8(top * (1.0 - wy) + bottom * wy);
        }
    }
    out
}

/// The two tile indices bracketing pixel `p` along one axis, and the weight
/// of the second.
fn neighbours(p: usize, tile_size: f32, tiles: usize) -> (usize, usize, f32) {
    let f = (p as f32 + 0.5) / tile_size - 0.5;
    let base = f.floor();
    let weight = f - base;
    let last = tiles as isize - 1;
    let t0 = (base as isize).clamp(0, last) as usize;
    let t1 = (base as isize + 1).clamp(0, last) as usize;
    (t0, t1, weight)
}

fn tile_lut(mut hist: [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }

    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }

        let batch = excess / 256;
        let mut residual = excess % 256;
        for bin in hist.iter_mut() {
            *bin += batch;
        }
        if residual > 0 {
            let step = (256 / residual as usize).max(1);
            let mut i = 0;
            while i < 256 && residual > 0 {
                hist[i] += 1;
                residual -= 1;
                i += step;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut sum = 0u32;
    for (i, &count) in hist.iter().enumerate() {
        sum += count;
        lut[i] = clamp_u8(sum as f32 * scale);
    }
    lut
}
