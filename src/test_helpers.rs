//! Shared raster fixtures for unit tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let flat = gray(100, 100, 128);
//! let busy = checker(32, 32);
//! write_png(tmp.path().join("in.png"), &gradient(40, 30));
//! ```

use crate::raster::Raster;
use std::path::Path;

// =========================================================================
// Raster fixtures
// =========================================================================

/// Uniform gray.
pub fn gray(width: u32, height: u32, level: u8) -> Raster {
    Raster::filled(width, height, [level, level, level])
}

/// Smooth color ramp: red follows x, green follows y, blue is constant.
pub fn gradient(width: u32, height: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        [
            (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8,
            (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8,
            96,
        ]
    })
}

/// 4x4-pixel black and white squares.
pub fn checker(width: u32, height: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            [20, 20, 20]
        } else {
            [235, 235, 235]
        }
    })
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Encode a raster as PNG at `path`, creating parent directories.
pub fn write_png(path: impl AsRef<Path>, raster: &Raster) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    raster.as_image().save(path).unwrap();
}
