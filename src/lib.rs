//! # Retouch
//!
//! Deterministic, preset-driven photo enhancement. Give it a decoded RGB
//! raster, a preset, an upscale factor and a strength; get back a processed
//! raster and a metadata record describing exactly what was done.
//!
//! # Architecture: Leaves First
//!
//! ```text
//! Raster ─┬─> quality::analyze ──────────────┐
//!         ├─> transforms::* (pure ops) ──────┼─> presets (recipes) ─> engine::Enhancer::enhance
//!         └─> mask (radial / edge field) ────┴───────────────────────> engine::Enhancer::blur_background
//! ```
//!
//! The core (`raster`, `transforms`, `quality`, `mask`, `presets`, `engine`)
//! never touches the filesystem. File decoding, configuration, batch
//! processing and the CLI live in thin collaborators around it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`raster`] | The RGB pixel buffer; resize, luma, plane conversion |
//! | [`transforms`] | Pure pixel operations: tone, CLAHE, sharpening, denoise, blur, blend |
//! | [`quality`] | Brightness, contrast and sharpness scores |
//! | [`mask`] | Subject masks and masked compositing for background blur |
//! | [`presets`] | The three fixed, strength-scaled recipes |
//! | [`engine`] | Façade: validation, upscale, quality-aware corrections, final blend, clamp |
//! | [`calculations`] | Pure dimension math (scale, fit, pixel budget) |
//! | [`error`] | The core error type |
//! | [`io`] | Decode with EXIF orientation, encode by extension |
//! | [`config`] | `retouch.toml` loading, validation and merging |
//! | [`batch`] | Parallel directory enhancement |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Fully Trust the Pipeline
//!
//! The final step blends the pipeline output over the upscaled original at
//! `strength / 100 * 0.85`. Even at strength 100 a share of the original
//! survives, which keeps aggressive presets from looking processed.
//!
//! ## No Mutation, No Globals
//!
//! Every transform takes `&Raster` and returns a new one. An
//! [`engine::Enhancer`] is a plain value holding its options, so concurrent
//! calls on different rasters need no locks and tests need no setup.
//!
//! ## Exact Where It Matters
//!
//! Kernels are normalized, borders are edge-replicated and compositing is
//! integer arithmetic. Uniform images pass through blur, sharpening and
//! compositing unchanged, bit for bit.

pub mod batch;
pub mod calculations;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod mask;
pub mod output;
pub mod presets;
pub mod quality;
pub mod raster;
pub mod transforms;

pub use engine::{
    BlurMetadata, EnhanceMode, EnhanceOptions, EnhancementMetadata, EnhancementRequest, Enhancer,
    blur_background, enhance,
};
pub use error::{EnhanceError, Result};
pub use mask::{Mask, MaskStrategy};
pub use presets::Preset;
pub use quality::{QualityMetrics, analyze};
pub use raster::Raster;

#[cfg(test)]
pub(crate) mod test_helpers;
