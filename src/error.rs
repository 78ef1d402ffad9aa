//! Error taxonomy for the enhancement core.
//!
//! Every failure is returned as a typed [`EnhanceError`]; no operation
//! returns a partially processed raster.

use std::time::Duration;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, EnhanceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnhanceError {
    /// Out-of-range preset, scale, strength, blur strength or blend alpha.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Two rasters that must share dimensions do not.
    #[error("Dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    /// Zero-area raster, or a pixel buffer of the wrong length.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Input exceeds the configured pixel budget and was rejected up front.
    #[error("Input too large: {width}x{height} exceeds {max_pixels} pixels")]
    InputTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
    /// The per-call time budget ran out at a transform boundary.
    #[error("Processing exceeded the {limit:?} time budget during {stage}")]
    TimedOut { stage: &'static str, limit: Duration },
}
