//! The enhancement façade: request validation, ordering, blend and clamp.
//!
//! ## Enhance sequence
//!
//! 1. Validate the request and the input raster.
//! 2. Upscale by the requested integer factor (Lanczos3).
//! 3. Quality-aware mode only: analyze the upscaled raster, then denoise
//!    and/or apply adaptive contrast when the scores call for it.
//! 4. Run the preset recipe.
//! 5. Blend the result over the upscaled original at
//!    `strength / 100 * BLEND_CEILING`, so some of the original always
//!    survives.
//! 6. Shrink so the longest edge is at most `max_dimension`.
//!
//! `strength == 0` skips steps 3 to 5. The time budget is checked after
//! every transform; running out fails the whole call.
//!
//! ## Background blur
//!
//! Validate `blur_strength`, shrink to the pixel budget, build the subject
//! mask, then composite the raster over a blurred copy of itself.

use crate::calculations::fit_pixel_budget;
use crate::error::{EnhanceError, Result};
use crate::mask::{MaskStrategy, blur_with_mask};
use crate::presets::{Preset, RecipeContext, Step};
use crate::quality::{QualityMetrics, analyze};
use crate::raster::Raster;
use crate::transforms::blend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum share of the pipeline output in the final blend.
pub const BLEND_CEILING: f32 = 0.85;

pub const DEFAULT_MAX_DIMENSION: u32 = 4096;
pub const DEFAULT_MAX_INPUT_PIXELS: u64 = 16_000_000;
/// Cap on the upscaled raster every step of the pipeline works on.
pub const DEFAULT_MAX_WORKING_PIXELS: u64 = 64_000_000;
pub const DEFAULT_BLUR_MAX_PIXELS: u64 = 4_000_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const MAX_STRENGTH: u32 = 100;
pub const BLUR_STRENGTH_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

// Corrective pre-processing thresholds for quality-aware mode.
const SOFT_SHARPNESS: f64 = 0.4;
const HEAVY_STRENGTH: u32 = 60;
const STRONG_DENOISE_FROM: u32 = 70;
const DARK_BRIGHTNESS: f64 = 0.35;
const FLAT_CONTRAST: f64 = 0.4;

/// Integer upscale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    X1,
    X2,
    X4,
}

impl Scale {
    pub fn factor(self) -> u32 {
        match self {
            Scale::X1 => 1,
            Scale::X2 => 2,
            Scale::X4 => 4,
        }
    }
}

impl TryFrom<u32> for Scale {
    type Error = EnhanceError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Scale::X1),
            2 => Ok(Scale::X2),
            4 => Ok(Scale::X4),
            other => Err(EnhanceError::InvalidParameter(format!(
                "scale must be 1, 2 or 4, got {other}"
            ))),
        }
    }
}

/// A validated enhancement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhancementRequest {
    preset: Preset,
    scale: Scale,
    strength: u32,
}

impl EnhancementRequest {
    pub fn new(preset: Preset, scale: u32, strength: u32) -> Result<Self> {
        let scale = Scale::try_from(scale)?;
        if strength > MAX_STRENGTH {
            return Err(EnhanceError::InvalidParameter(format!(
                "strength must be within 0..=100, got {strength}"
            )));
        }
        Ok(Self {
            preset,
            scale,
            strength,
        })
    }

    /// Validate a request given the preset by name.
    pub fn parse(preset: &str, scale: u32, strength: u32) -> Result<Self> {
        Self::new(preset.parse()?, scale, strength)
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn strength(&self) -> u32 {
        self.strength
    }

    /// `strength / 100`.
    pub fn factor(&self) -> f32 {
        self.strength as f32 / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnhanceMode {
    Standard,
    #[default]
    QualityAware,
}

impl EnhanceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EnhanceMode::Standard => "standard",
            EnhanceMode::QualityAware => "quality-aware",
        }
    }
}

impl fmt::Display for EnhanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnhanceMode {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "standard" => Ok(EnhanceMode::Standard),
            "quality-aware" => Ok(EnhanceMode::QualityAware),
            other => Err(EnhanceError::InvalidParameter(format!(
                "unknown mode: {other}"
            ))),
        }
    }
}

/// Per-engine limits and behavior switches.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceOptions {
    pub mode: EnhanceMode,
    /// Longest output edge; larger results are shrunk.
    pub max_dimension: u32,
    /// Inputs above this many pixels are rejected.
    pub max_input_pixels: u64,
    /// Requests whose upscaled raster exceeds this many pixels are rejected.
    pub max_working_pixels: u64,
    /// Per-call time budget. `None` disables the check.
    pub timeout: Option<Duration>,
    /// Blur inputs above this many pixels are shrunk first.
    pub blur_max_pixels: u64,
    pub mask: MaskStrategy,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            mode: EnhanceMode::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_input_pixels: DEFAULT_MAX_INPUT_PIXELS,
            max_working_pixels: DEFAULT_MAX_WORKING_PIXELS,
            timeout: Some(DEFAULT_TIMEOUT),
            blur_max_pixels: DEFAULT_BLUR_MAX_PIXELS,
            mask: MaskStrategy::default(),
        }
    }
}

impl EnhanceOptions {
    /// Reject limits that would let a call produce an empty raster or
    /// refuse every input.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("max_dimension", self.max_dimension as u64),
            ("max_input_pixels", self.max_input_pixels),
            ("max_working_pixels", self.max_working_pixels),
            ("blur_max_pixels", self.blur_max_pixels),
        ];
        match limits.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(EnhanceError::InvalidParameter(format!(
                "{name} must be non-zero"
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementMetadata {
    /// Wall-clock seconds, rounded to two decimals.
    pub processing_time: f64,
    pub original_dimensions: [u32; 2],
    pub output_dimensions: [u32; 2],
    pub preset: Preset,
    pub scale: u32,
    pub strength: u32,
    pub mode: EnhanceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
    pub enhancements_applied: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlurMetadata {
    pub processing_time: f64,
    pub effect: &'static str,
    pub blur_strength: u32,
    pub mask: MaskStrategy,
    pub original_dimensions: [u32; 2],
    /// Dimensions after the pixel-budget shrink.
    pub processed_dimensions: [u32; 2],
    pub output_dimensions: [u32; 2],
}

/// Time budget for one call.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self, stage: &'static str) -> Result<()> {
        match self.limit {
            Some(limit) if self.started.elapsed() >= limit => {
                warn!(stage, ?limit, "Time budget exhausted");
                Err(EnhanceError::TimedOut { stage, limit })
            }
            _ => Ok(()),
        }
    }

    fn seconds(&self) -> f64 {
        (self.started.elapsed().as_secs_f64() * 100.0).round() / 100.0
    }
}

fn dims(raster: &Raster) -> [u32; 2] {
    [raster.width(), raster.height()]
}

/// Runs enhancement and background-blur calls with a fixed set of options.
///
/// Holds no per-call state, so one `Enhancer` can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct Enhancer {
    options: EnhanceOptions,
}

impl Enhancer {
    pub fn new(options: EnhanceOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EnhanceOptions {
        &self.options
    }

    /// Enhance `raster` according to `request`.
    pub fn enhance(
        &self,
        raster: &Raster,
        request: &EnhancementRequest,
    ) -> Result<(Raster, EnhancementMetadata)> {
        let deadline = Deadline::start(self.options.timeout);
        self.options.validate()?;
        raster.ensure_non_empty()?;
        if raster.pixel_count() > self.options.max_input_pixels {
            return Err(EnhanceError::InputTooLarge {
                width: raster.width(),
                height: raster.height(),
                max_pixels: self.options.max_input_pixels,
            });
        }

        let preset = request.preset();
        let strength = request.strength();
        let factor = request.factor();
        let scale = request.scale().factor();
        // The pipeline runs on the upscaled raster, so bound that too
        let scale_sq = (scale as u64).pow(2);
        if raster.pixel_count() * scale_sq > self.options.max_working_pixels {
            return Err(EnhanceError::InputTooLarge {
                width: raster.width().saturating_mul(scale),
                height: raster.height().saturating_mul(scale),
                max_pixels: self.options.max_working_pixels,
            });
        }
        let mode = self.options.mode;
        info!(%preset, scale, strength, %mode, width = raster.width(), height = raster.height(), "Enhancing");

        let mut applied = Vec::new();
        let upscaled = if scale > 1 {
            let up = raster.upscale(scale);
            applied.push("upscale");
            deadline.check("upscale")?;
            up
        } else {
            raster.clone()
        };

        let mut quality_metrics = None;
        let mut output = if strength == 0 {
            upscaled
        } else {
            let mut working = upscaled.clone();
            let mut ctx = RecipeContext {
                quality_aware: mode == EnhanceMode::QualityAware,
                adaptive_applied: false,
            };

            if ctx.quality_aware {
                let metrics = analyze(&working)?;
                info!(
                    brightness = metrics.brightness,
                    contrast = metrics.contrast,
                    sharpness = metrics.sharpness,
                    needs_enhancement = metrics.needs_enhancement,
                    "Quality analysis"
                );
                deadline.check("analyze")?;

                for step in corrective_steps(&metrics, strength) {
                    working = self.run_step(&working, &step, &deadline, &mut applied)?;
                    if step == Step::AdaptiveContrast {
                        ctx.adaptive_applied = true;
                    }
                }
                quality_metrics = Some(metrics);
            }

            for step in preset.recipe(factor, ctx) {
                working = self.run_step(&working, &step, &deadline, &mut applied)?;
            }

            let blended = blend(&upscaled, &working, factor * BLEND_CEILING)?;
            deadline.check("blend")?;
            blended
        };

        if output.width().max(output.height()) > self.options.max_dimension {
            let before = output.dimensions();
            output = output.thumbnail(self.options.max_dimension);
            warn!(
                ?before,
                after = ?output.dimensions(),
                max = self.options.max_dimension,
                "Output exceeded maximum dimension; downscaled"
            );
            deadline.check("clamp")?;
        }

        let metadata = EnhancementMetadata {
            processing_time: deadline.seconds(),
            original_dimensions: dims(raster),
            output_dimensions: dims(&output),
            preset,
            scale,
            strength,
            mode,
            quality_metrics,
            enhancements_applied: applied,
        };
        info!(seconds = metadata.processing_time, steps = metadata.enhancements_applied.len(), "Enhancement complete");
        Ok((output, metadata))
    }

    /// Blur the background of `raster`, keeping the masked subject sharp.
    pub fn blur_background(
        &self,
        raster: &Raster,
        blur_strength: u32,
    ) -> Result<(Raster, BlurMetadata)> {
        let deadline = Deadline::start(self.options.timeout);
        self.options.validate()?;
        if !BLUR_STRENGTH_RANGE.contains(&blur_strength) {
            return Err(EnhanceError::InvalidParameter(format!(
                "blur strength must be within 1..=30, got {blur_strength}"
            )));
        }
        raster.ensure_non_empty()?;
        let mask_strategy = self.options.mask;
        info!(blur_strength, mask = %mask_strategy, width = raster.width(), height = raster.height(), "Blurring background");

        let working = if raster.pixel_count() > self.options.blur_max_pixels {
            let (w, h) = fit_pixel_budget(raster.dimensions(), self.options.blur_max_pixels);
            warn!(
                from = ?raster.dimensions(),
                to = ?(w, h),
                max_pixels = self.options.blur_max_pixels,
                "Input exceeds blur pixel budget; downscaled"
            );
            let shrunk = raster.resize_exact(w, h);
            deadline.check("downscale")?;
            shrunk
        } else {
            raster.clone()
        };

        let mask = mask_strategy.build(&working);
        deadline.check("mask")?;
        let output = blur_with_mask(&working, &mask, blur_strength as f32)?;
        deadline.check("composite")?;

        let metadata = BlurMetadata {
            processing_time: deadline.seconds(),
            effect: "background_blur",
            blur_strength,
            mask: mask_strategy,
            original_dimensions: dims(raster),
            processed_dimensions: dims(&working),
            output_dimensions: dims(&output),
        };
        info!(seconds = metadata.processing_time, "Background blur complete");
        Ok((output, metadata))
    }

    fn run_step(
        &self,
        raster: &Raster,
        step: &Step,
        deadline: &Deadline,
        applied: &mut Vec<&'static str>,
    ) -> Result<Raster> {
        debug!(step = step.name(), ?step, "Applying");
        let out = step.apply(raster);
        applied.push(step.name());
        deadline.check(step.name())?;
        Ok(out)
    }
}

/// Denoise and adaptive-contrast corrections chosen from the quality scores.
fn corrective_steps(metrics: &QualityMetrics, strength: u32) -> Vec<Step> {
    let mut steps = Vec::new();
    if metrics.sharpness < SOFT_SHARPNESS || strength > HEAVY_STRENGTH {
        let amount = if strength < STRONG_DENOISE_FROM { 0.3 } else { 0.5 };
        steps.push(Step::Denoise(amount));
    }
    if metrics.brightness < DARK_BRIGHTNESS || metrics.contrast < FLAT_CONTRAST {
        steps.push(Step::AdaptiveContrast);
    }
    steps
}

/// Enhance with default options.
pub fn enhance(
    raster: &Raster,
    request: &EnhancementRequest,
) -> Result<(Raster, EnhancementMetadata)> {
    Enhancer::default().enhance(raster, request)
}

/// Blur the background with default options.
pub fn blur_background(raster: &Raster, blur_strength: u32) -> Result<(Raster, BlurMetadata)> {
    Enhancer::default().blur_background(raster, blur_strength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checker, gradient, gray};

    fn request(preset: Preset, scale: u32, strength: u32) -> EnhancementRequest {
        EnhancementRequest::new(preset, scale, strength).unwrap()
    }

    #[test]
    fn enhancer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Enhancer>();
    }

    #[test]
    fn scale_validation() {
        assert_eq!(Scale::try_from(2).unwrap(), Scale::X2);
        for bad in [0, 3, 5, 8] {
            assert!(matches!(
                Scale::try_from(bad),
                Err(EnhanceError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn request_rejects_strength_over_100() {
        assert!(EnhancementRequest::new(Preset::General, 1, 100).is_ok());
        assert!(matches!(
            EnhancementRequest::new(Preset::General, 1, 101),
            Err(EnhanceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn request_parse_rejects_unknown_preset() {
        assert!(matches!(
            EnhancementRequest::parse("cinematic", 1, 50),
            Err(EnhanceError::InvalidParameter(_))
        ));
        let req = EnhancementRequest::parse("landscape", 4, 80).unwrap();
        assert_eq!(req.preset(), Preset::Landscape);
        assert_eq!(req.scale(), Scale::X4);
        assert_eq!(req.strength(), 80);
    }

    #[test]
    fn parse_mode() {
        assert_eq!("standard".parse::<EnhanceMode>().unwrap(), EnhanceMode::Standard);
        assert_eq!(
            "quality_aware".parse::<EnhanceMode>().unwrap(),
            EnhanceMode::QualityAware
        );
        assert!("fast".parse::<EnhanceMode>().is_err());
    }

    #[test]
    fn zero_strength_is_identity() {
        let raster = gradient(30, 20);
        let (out, meta) = enhance(&raster, &request(Preset::Portrait, 1, 0)).unwrap();
        assert_eq!(out, raster);
        assert!(meta.enhancements_applied.is_empty());
        assert!(meta.quality_metrics.is_none());
    }

    #[test]
    fn quality_aware_records_metrics() {
        let (_, meta) = enhance(&checker(32, 32), &request(Preset::General, 1, 50)).unwrap();
        assert_eq!(meta.mode, EnhanceMode::QualityAware);
        assert!(meta.quality_metrics.is_some());
        assert!(meta.enhancements_applied.contains(&"auto_contrast"));
    }

    #[test]
    fn flat_input_gets_adaptive_contrast_once() {
        let (_, meta) = enhance(&gray(40, 40, 128), &request(Preset::General, 1, 30)).unwrap();
        let count = meta
            .enhancements_applied
            .iter()
            .filter(|s| **s == "adaptive_contrast")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn heavy_strength_triggers_denoise() {
        let (_, meta) = enhance(&checker(32, 32), &request(Preset::Portrait, 1, 90)).unwrap();
        assert_eq!(meta.enhancements_applied[0], "denoise");
    }

    #[test]
    fn standard_mode_skips_analysis() {
        let enhancer = Enhancer::new(EnhanceOptions {
            mode: EnhanceMode::Standard,
            ..EnhanceOptions::default()
        });
        let (_, meta) = enhancer
            .enhance(&gradient(16, 16), &request(Preset::General, 1, 90))
            .unwrap();
        assert!(meta.quality_metrics.is_none());
        assert!(!meta.enhancements_applied.contains(&"denoise"));
        assert_eq!(meta.enhancements_applied[0], "auto_contrast");
    }

    #[test]
    fn upscale_then_clamp() {
        let enhancer = Enhancer::new(EnhanceOptions {
            max_dimension: 50,
            ..EnhanceOptions::default()
        });
        let (out, meta) = enhancer
            .enhance(&gradient(40, 20), &request(Preset::General, 2, 40))
            .unwrap();
        assert_eq!(out.dimensions(), (50, 25));
        assert_eq!(meta.original_dimensions, [40, 20]);
        assert_eq!(meta.output_dimensions, [50, 25]);
        assert_eq!(meta.enhancements_applied[0], "upscale");
    }

    #[test]
    fn oversized_input_is_rejected() {
        let enhancer = Enhancer::new(EnhanceOptions {
            max_input_pixels: 100,
            ..EnhanceOptions::default()
        });
        let err = enhancer
            .enhance(&gray(11, 10, 50), &request(Preset::General, 1, 50))
            .unwrap_err();
        assert_eq!(
            err,
            EnhanceError::InputTooLarge {
                width: 11,
                height: 10,
                max_pixels: 100
            }
        );
    }

    #[test]
    fn upscaled_working_raster_is_bounded() {
        let enhancer = Enhancer::new(EnhanceOptions {
            max_working_pixels: 1000,
            ..EnhanceOptions::default()
        });
        let raster = gray(10, 10, 50);
        let err = enhancer
            .enhance(&raster, &request(Preset::General, 4, 50))
            .unwrap_err();
        assert_eq!(
            err,
            EnhanceError::InputTooLarge {
                width: 40,
                height: 40,
                max_pixels: 1000
            }
        );
        // 20x20 after a 2x upscale fits
        assert!(enhancer.enhance(&raster, &request(Preset::General, 2, 50)).is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let enhancer = Enhancer::new(EnhanceOptions {
            max_dimension: 0,
            ..EnhanceOptions::default()
        });
        let err = enhancer
            .enhance(&gradient(8, 8), &request(Preset::General, 1, 50))
            .unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidParameter(_)));

        let enhancer = Enhancer::new(EnhanceOptions {
            blur_max_pixels: 0,
            ..EnhanceOptions::default()
        });
        assert!(matches!(
            enhancer.blur_background(&gradient(8, 8), 5),
            Err(EnhanceError::InvalidParameter(_))
        ));
        assert!(EnhanceOptions::default().validate().is_ok());
    }

    #[test]
    fn zero_area_is_rejected() {
        let err = enhance(&gray(0, 5, 0), &request(Preset::General, 1, 50)).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidInput(_)));
    }

    #[test]
    fn exhausted_budget_times_out() {
        let enhancer = Enhancer::new(EnhanceOptions {
            timeout: Some(Duration::ZERO),
            ..EnhanceOptions::default()
        });
        let err = enhancer
            .enhance(&gradient(16, 16), &request(Preset::General, 1, 50))
            .unwrap_err();
        assert!(matches!(err, EnhanceError::TimedOut { .. }));
    }

    #[test]
    fn corrective_steps_thresholds() {
        let dull = QualityMetrics {
            brightness: 0.2,
            contrast: 0.1,
            sharpness: 0.1,
            needs_enhancement: true,
        };
        assert_eq!(
            corrective_steps(&dull, 50),
            [Step::Denoise(0.3), Step::AdaptiveContrast]
        );
        let crisp = QualityMetrics {
            brightness: 0.5,
            contrast: 0.6,
            sharpness: 0.9,
            needs_enhancement: false,
        };
        assert!(corrective_steps(&crisp, 60).is_empty());
        assert_eq!(corrective_steps(&crisp, 61), [Step::Denoise(0.3)]);
        assert_eq!(corrective_steps(&crisp, 70), [Step::Denoise(0.5)]);
    }

    #[test]
    fn blur_strength_bounds() {
        let raster = gray(20, 20, 90);
        for bad in [0, 31] {
            assert!(matches!(
                blur_background(&raster, bad),
                Err(EnhanceError::InvalidParameter(_))
            ));
        }
        for good in [1, 30] {
            assert!(blur_background(&raster, good).is_ok());
        }
    }

    #[test]
    fn blur_shrinks_to_pixel_budget() {
        let enhancer = Enhancer::new(EnhanceOptions {
            blur_max_pixels: 400,
            ..EnhanceOptions::default()
        });
        let (out, meta) = enhancer.blur_background(&gradient(40, 40), 5).unwrap();
        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(meta.original_dimensions, [40, 40]);
        assert_eq!(meta.processed_dimensions, [20, 20]);
        assert_eq!(meta.mask, MaskStrategy::Radial);
    }

    #[test]
    fn edge_mask_strategy_is_reported() {
        let enhancer = Enhancer::new(EnhanceOptions {
            mask: MaskStrategy::Edges,
            ..EnhanceOptions::default()
        });
        let (_, meta) = enhancer.blur_background(&checker(24, 24), 3).unwrap();
        assert_eq!(meta.mask, MaskStrategy::Edges);
        assert_eq!(meta.effect, "background_blur");
    }
}
