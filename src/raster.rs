//! The in-memory RGB pixel buffer every transform operates on.
//!
//! A [`Raster`] wraps an `image::RgbImage`: width, height and a contiguous,
//! row-major, channel-interleaved `u8` buffer with exactly
//! `width * height * 3` samples. Rasters are never resized in place; every
//! resize and every transform returns a new value.
//!
//! Luma is computed with ITU-R 601 weights (`299 R + 587 G + 114 B`, scaled
//! by 1/1000) everywhere in the crate: quality analysis, saturation,
//! adaptive contrast and mask synthesis all agree on the same gray.

use crate::calculations::{fit_within, scaled_dimensions};
use crate::error::{EnhanceError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

/// Resampling filter used for every resize (upscale, thumbnail, budget shrink).
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// An 8-bit RGB raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    image: RgbImage,
}

impl Raster {
    /// Samples per pixel. Always 3 (RGB).
    pub const CHANNELS: usize = 3;

    /// Wrap a raw interleaved RGB buffer.
    ///
    /// Fails with [`EnhanceError::InvalidInput`] when the buffer length is not
    /// `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let len = pixels.len();
        let expected = width as usize * height as usize * Self::CHANNELS;
        if len != expected {
            return Err(EnhanceError::InvalidInput(format!(
                "buffer of {len} bytes does not match {width}x{height} RGB"
            )));
        }
        RgbImage::from_raw(width, height, pixels)
            .map(|image| Self { image })
            .ok_or_else(|| {
                EnhanceError::InvalidInput(format!(
                    "buffer of {len} bytes does not match {width}x{height} RGB"
                ))
            })
    }

    /// A raster where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(rgb)),
        }
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_fn(width, height, |x, y| Rgb(f(x, y))),
        }
    }

    /// Convert any decoded image to RGB8, compositing transparency onto white.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        if !img.color().has_alpha() {
            return Self {
                image: img.into_rgb8(),
            };
        }

        let rgba = img.into_rgba8();
        let image = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let a = a as u32;
            let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
            Rgb([over_white(r), over_white(g), over_white(b)])
        });
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn channel_count(&self) -> usize {
        Self::CHANNELS
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True when the raster has zero area.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The interleaved sample buffer.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Fail with [`EnhanceError::InvalidInput`] on a zero-area raster.
    pub fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(EnhanceError::InvalidInput(format!(
                "raster has zero area ({}x{})",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }

    /// Apply a per-pixel color mapping, producing a new raster.
    pub fn map_pixels(&self, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> Self {
        let mut out = self.image.clone();
        for px in out.pixels_mut() {
            px.0 = f(px.0);
        }
        Self { image: out }
    }

    /// Per-pixel luma as `f32` in [0, 255], row-major.
    pub fn luma(&self) -> Vec<f32> {
        self.image
            .pixels()
            .map(|p| luma_of(p.0))
            .collect()
    }

    /// Resample to exact dimensions with [`RESAMPLE_FILTER`].
    pub fn resize_exact(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.dimensions() {
            return self.clone();
        }
        Self {
            image: image::imageops::resize(&self.image, width, height, RESAMPLE_FILTER),
        }
    }

    /// Upscale both edges by an integer factor.
    pub fn upscale(&self, factor: u32) -> Self {
        let (w, h) = scaled_dimensions(self.dimensions(), factor);
        self.resize_exact(w, h)
    }

    /// Shrink so the longest edge is at most `max_edge`, keeping aspect ratio.
    /// Rasters that already fit are returned unchanged.
    pub fn thumbnail(&self, max_edge: u32) -> Self {
        let (w, h) = fit_within(self.dimensions(), max_edge);
        self.resize_exact(w, h)
    }
}

impl From<RgbImage> for Raster {
    fn from(image: RgbImage) -> Self {
        Self { image }
    }
}

/// ITU-R 601 luma of one RGB sample.
#[inline]
pub fn luma_of(rgb: [u8; 3]) -> f32 {
    (299 * rgb[0] as u32 + 587 * rgb[1] as u32 + 114 * rgb[2] as u32) as f32 / 1000.0
}

/// Round to nearest and clamp into the `u8` range.
#[inline]
pub(crate) fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn from_raw_accepts_matching_buffer() {
        let raster = Raster::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(raster.dimensions(), (2, 1));
        assert_eq!(raster.pixel(1, 0), [4, 5, 6]);
        assert_eq!(raster.channel_count(), 3);
    }

    #[test]
    fn from_raw_rejects_short_buffer() {
        let err = Raster::from_raw(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidInput(_)));
    }

    #[test]
    fn from_raw_rejects_long_buffer() {
        let err = Raster::from_raw(1, 1, vec![0; 4]).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidInput(_)));
    }

    #[test]
    fn buffer_length_invariant() {
        let raster = Raster::filled(7, 5, [10, 20, 30]);
        assert_eq!(raster.pixels().len(), 7 * 5 * 3);
    }

    #[test]
    fn zero_area_is_rejected() {
        let raster = Raster::filled(0, 10, [0, 0, 0]);
        assert!(raster.is_empty());
        assert!(matches!(
            raster.ensure_non_empty(),
            Err(EnhanceError::InvalidInput(_))
        ));
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let raster = Raster::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(raster.pixel(0, 0), [255, 255, 255]);
        assert_eq!(raster.pixel(1, 0), [10, 20, 30]);
    }

    #[test]
    fn half_transparent_black_becomes_mid_gray() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let raster = Raster::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(raster.pixel(0, 0), [127, 127, 127]);
    }

    #[test]
    fn luma_of_gray_is_exact() {
        assert_eq!(luma_of([128, 128, 128]), 128.0);
        assert_eq!(luma_of([255, 255, 255]), 255.0);
        assert_eq!(luma_of([0, 0, 0]), 0.0);
    }

    #[test]
    fn luma_weights_green_heaviest() {
        assert!(luma_of([0, 255, 0]) > luma_of([255, 0, 0]));
        assert!(luma_of([255, 0, 0]) > luma_of([0, 0, 255]));
    }

    #[test]
    fn upscale_gray_stays_gray() {
        let raster = Raster::filled(10, 6, [128, 128, 128]);
        let up = raster.upscale(2);
        assert_eq!(up.dimensions(), (20, 12));
        assert!(up.pixels().iter().all(|&v| v == 128));
    }

    #[test]
    fn thumbnail_preserves_aspect() {
        let raster = Raster::filled(40, 20, [1, 2, 3]);
        assert_eq!(raster.thumbnail(10).dimensions(), (10, 5));
        assert_eq!(raster.thumbnail(100).dimensions(), (40, 20));
    }

    #[test]
    fn map_pixels_leaves_source_untouched() {
        let raster = Raster::filled(2, 2, [5, 5, 5]);
        let inverted = raster.map_pixels(|[r, g, b]| [255 - r, 255 - g, 255 - b]);
        assert_eq!(raster.pixel(0, 0), [5, 5, 5]);
        assert_eq!(inverted.pixel(0, 0), [250, 250, 250]);
    }
}
