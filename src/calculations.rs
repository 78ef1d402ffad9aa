//! Pure calculation functions for raster dimensions.
//!
//! All functions here are pure and testable without any pixels.

/// Dimensions after an exact integer upscale.
///
/// ```
/// # use retouch::calculations::scaled_dimensions;
/// assert_eq!(scaled_dimensions((100, 50), 4), (400, 200));
/// ```
pub fn scaled_dimensions(source: (u32, u32), factor: u32) -> (u32, u32) {
    (source.0 * factor, source.1 * factor)
}

/// Fit dimensions inside a `max_edge` square, preserving aspect ratio.
///
/// Thumbnail semantics: the longer edge becomes `max_edge`, the shorter one is
/// scaled proportionally and rounded. Dimensions that already fit are returned
/// unchanged, so this never upscales.
///
/// ```
/// # use retouch::calculations::fit_within;
/// assert_eq!(fit_within((8000, 4000), 4096), (4096, 2048));
/// assert_eq!(fit_within((800, 600), 4096), (800, 600));
/// ```
pub fn fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= max_edge && h <= max_edge {
        return source;
    }

    if w >= h {
        // Landscape or square: width is the long edge
        let nh = (h as f64 * max_edge as f64 / w as f64).round() as u32;
        (max_edge, nh.max(1))
    } else {
        // Portrait
        let nw = (w as f64 * max_edge as f64 / h as f64).round() as u32;
        (nw.max(1), max_edge)
    }
}

/// Shrink dimensions so the pixel count does not exceed `max_pixels`.
///
/// Both edges are multiplied by `sqrt(max_pixels / (w * h))` and floored.
/// An edge never drops below 1; when that clamp would overshoot the budget
/// (extreme aspect ratios), the long edge is cut to `max_pixels / short`.
/// For any `max_pixels >= 1` the result is within budget. Dimensions already
/// within budget are returned unchanged.
///
/// ```
/// # use retouch::calculations::fit_pixel_budget;
/// assert_eq!(fit_pixel_budget((4000, 4000), 4_000_000), (2000, 2000));
/// assert_eq!(fit_pixel_budget((10_000_000, 1), 4_000_000), (4_000_000, 1));
/// ```
pub fn fit_pixel_budget(source: (u32, u32), max_pixels: u64) -> (u32, u32) {
    let (w, h) = source;
    let pixels = w as u64 * h as u64;
    if pixels <= max_pixels {
        return source;
    }

    let factor = (max_pixels as f64 / pixels as f64).sqrt();
    let mut nw = ((w as f64 * factor).floor() as u32).max(1);
    let mut nh = ((h as f64 * factor).floor() as u32).max(1);
    if nw as u64 * nh as u64 > max_pixels {
        if nw <= nh {
            nh = (max_pixels / nw as u64).max(1) as u32;
        } else {
            nw = (max_pixels / nh as u64).max(1) as u32;
        }
    }
    (nw, nh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_dimensions_multiplies_both_edges() {
        assert_eq!(scaled_dimensions((100, 100), 1), (100, 100));
        assert_eq!(scaled_dimensions((100, 100), 2), (200, 200));
        assert_eq!(scaled_dimensions((37, 11), 4), (148, 44));
    }

    #[test]
    fn fit_within_landscape() {
        assert_eq!(fit_within((8192, 4096), 4096), (4096, 2048));
    }

    #[test]
    fn fit_within_portrait() {
        assert_eq!(fit_within((3000, 6000), 4096), (2048, 4096));
    }

    #[test]
    fn fit_within_square() {
        assert_eq!(fit_within((5000, 5000), 4096), (4096, 4096));
    }

    #[test]
    fn fit_within_only_one_edge_over() {
        assert_eq!(fit_within((4100, 100), 4096), (4096, 100));
    }

    #[test]
    fn fit_within_never_upscales() {
        assert_eq!(fit_within((10, 20), 4096), (10, 20));
        assert_eq!(fit_within((4096, 4096), 4096), (4096, 4096));
    }

    #[test]
    fn fit_within_keeps_short_edge_nonzero() {
        assert_eq!(fit_within((100_000, 1), 4096), (4096, 1));
    }

    #[test]
    fn fit_pixel_budget_within_budget_unchanged() {
        assert_eq!(fit_pixel_budget((2000, 2000), 4_000_000), (2000, 2000));
    }

    #[test]
    fn fit_pixel_budget_shrinks_proportionally() {
        let (w, h) = fit_pixel_budget((4000, 3000), 4_000_000);
        assert!(w as u64 * h as u64 <= 4_000_000);
        assert_eq!((w, h), (2309, 1732));
    }

    #[test]
    fn fit_pixel_budget_square() {
        assert_eq!(fit_pixel_budget((4000, 4000), 4_000_000), (2000, 2000));
    }

    #[test]
    fn fit_pixel_budget_extreme_aspect_stays_within_budget() {
        assert_eq!(fit_pixel_budget((10_000_000, 1), 4_000_000), (4_000_000, 1));
        assert_eq!(fit_pixel_budget((1, 10_000_000), 4_000_000), (1, 4_000_000));
        let (w, h) = fit_pixel_budget((9_000_000, 3), 4_000_000);
        assert!(w as u64 * h as u64 <= 4_000_000, "{w}x{h}");
    }
}
