//! Preset recipes: fixed, strength-scaled sequences of transforms.
//!
//! `factor = strength / 100`. Scaling steps use `1 + k * factor`, so at
//! factor 0 every scaling step is the identity. Conditional steps switch on
//! above a factor threshold.
//!
//! | preset | steps |
//! |---|---|
//! | general | auto-contrast 1% → (quality-aware: edge enhance above 0.4, adaptive contrast) → contrast 0.25 → color 0.20 → sharpness 0.60 → unsharp above 0.5 → detail boost above 0.6 |
//! | portrait | auto-contrast 0.5% → brightness 0.10 → contrast 0.20 → sharpness 0.50 → unsharp above 0.4 → color 0.10 |
//! | landscape | auto-contrast 1% → color 0.40 → contrast 0.35 → edge enhance above 0.5 → sharpness 0.60 → unsharp above 0.6 → brightness 0.05 |
//!
//! Portrait keeps every coefficient small to avoid harsh skin texture.

use crate::error::EnhanceError;
use crate::raster::Raster;
use crate::transforms::{self, ClaheParams, UnsharpParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    General,
    Portrait,
    Landscape,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::General, Preset::Portrait, Preset::Landscape];

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::General => "general",
            Preset::Portrait => "portrait",
            Preset::Landscape => "landscape",
        }
    }

    /// The steps this preset runs at `factor` in [0, 1].
    pub fn recipe(self, factor: f32, ctx: RecipeContext) -> Vec<Step> {
        let f = factor.clamp(0.0, 1.0);
        let scaled = |k: f32| 1.0 + k * f;
        let mut steps = Vec::new();

        match self {
            Preset::General => {
                steps.push(Step::AutoContrast(1.0));
                if ctx.quality_aware {
                    if f > 0.4 {
                        steps.push(Step::EdgeEnhance(f));
                    }
                    if !ctx.adaptive_applied {
                        steps.push(Step::AdaptiveContrast);
                    }
                }
                steps.push(Step::Contrast(scaled(0.25)));
                steps.push(Step::Color(scaled(0.20)));
                steps.push(Step::Sharpness(scaled(0.60)));
                if f > 0.5 {
                    steps.push(Step::UnsharpMask(UnsharpParams {
                        radius: 1.0 + (2.0 * f).floor(),
                        percent: 100.0 + 150.0 * f,
                        threshold: 3.0,
                    }));
                }
                if f > 0.6 {
                    steps.push(Step::DetailBoost(0.5 * f));
                }
            }
            Preset::Portrait => {
                steps.push(Step::AutoContrast(0.5));
                steps.push(Step::Brightness(scaled(0.10)));
                steps.push(Step::Contrast(scaled(0.20)));
                steps.push(Step::Sharpness(scaled(0.50)));
                if f > 0.4 {
                    steps.push(Step::UnsharpMask(UnsharpParams {
                        radius: 1.0,
                        percent: 50.0 + 50.0 * f,
                        threshold: 6.0,
                    }));
                }
                steps.push(Step::Color(scaled(0.10)));
            }
            Preset::Landscape => {
                steps.push(Step::AutoContrast(1.0));
                steps.push(Step::Color(scaled(0.40)));
                steps.push(Step::Contrast(scaled(0.35)));
                if f > 0.5 {
                    steps.push(Step::EdgeEnhance(f));
                }
                steps.push(Step::Sharpness(scaled(0.60)));
                if f > 0.6 {
                    steps.push(Step::UnsharpMask(UnsharpParams {
                        radius: 2.0 + f.floor(),
                        percent: 120.0 + 180.0 * f,
                        threshold: 3.0,
                    }));
                }
                steps.push(Step::Brightness(scaled(0.05)));
            }
        }
        steps
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| {
                EnhanceError::InvalidParameter(format!(
                    "unknown preset '{s}' (expected general, portrait or landscape)"
                ))
            })
    }
}

/// What the caller already knows when a recipe is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeContext {
    /// Include the quality-aware steps.
    pub quality_aware: bool,
    /// Adaptive contrast already ran during corrective pre-processing.
    pub adaptive_applied: bool,
}

/// One transform with its parameters bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    AutoContrast(f32),
    AdaptiveContrast,
    EdgeEnhance(f32),
    Brightness(f32),
    Contrast(f32),
    Color(f32),
    Sharpness(f32),
    UnsharpMask(UnsharpParams),
    DetailBoost(f32),
    Denoise(f32),
}

impl Step {
    /// Name recorded in `enhancements_applied`.
    pub fn name(&self) -> &'static str {
        match self {
            Step::AutoContrast(_) => "auto_contrast",
            Step::AdaptiveContrast => "adaptive_contrast",
            Step::EdgeEnhance(_) => "edge_enhance",
            Step::Brightness(_) => "brightness",
            Step::Contrast(_) => "contrast",
            Step::Color(_) => "color",
            Step::Sharpness(_) => "sharpness",
            Step::UnsharpMask(_) => "unsharp_mask",
            Step::DetailBoost(_) => "detail_boost",
            Step::Denoise(_) => "denoise",
        }
    }

    pub fn apply(&self, raster: &Raster) -> Raster {
        match *self {
            Step::AutoContrast(cutoff) => transforms::auto_contrast(raster, cutoff),
            Step::AdaptiveContrast => transforms::adaptive_contrast(raster, ClaheParams::default()),
            Step::EdgeEnhance(s) => transforms::edge_enhance(raster, s),
            Step::Brightness(f) => transforms::brightness(raster, f),
            Step::Contrast(f) => transforms::contrast(raster, f),
            Step::Color(f) => transforms::color(raster, f),
            Step::Sharpness(f) => transforms::sharpness(raster, f),
            Step::UnsharpMask(params) => transforms::unsharp_mask(raster, params),
            Step::DetailBoost(s) => transforms::detail_boost(raster, s),
            Step::Denoise(s) => transforms::denoise(raster, s),
        }
    }
}

/// Run a preset's standard recipe without the final blend.
pub fn apply_preset(raster: &Raster, preset: Preset, factor: f32) -> Raster {
    preset
        .recipe(factor, RecipeContext::default())
        .iter()
        .fold(raster.clone(), |acc, step| step.apply(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(steps: &[Step]) -> Vec<&'static str> {
        steps.iter().map(Step::name).collect()
    }

    #[test]
    fn parse_presets() {
        assert_eq!("general".parse::<Preset>().unwrap(), Preset::General);
        assert_eq!("Portrait".parse::<Preset>().unwrap(), Preset::Portrait);
        assert_eq!(" landscape ".parse::<Preset>().unwrap(), Preset::Landscape);
        assert!(matches!(
            "vivid".parse::<Preset>(),
            Err(EnhanceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn general_low_factor_skips_conditional_steps() {
        let steps = Preset::General.recipe(0.3, RecipeContext::default());
        assert_eq!(
            names(&steps),
            ["auto_contrast", "contrast", "color", "sharpness"]
        );
    }

    #[test]
    fn general_full_strength_quality_aware() {
        let ctx = RecipeContext {
            quality_aware: true,
            adaptive_applied: false,
        };
        let steps = Preset::General.recipe(1.0, ctx);
        assert_eq!(
            names(&steps),
            [
                "auto_contrast",
                "edge_enhance",
                "adaptive_contrast",
                "contrast",
                "color",
                "sharpness",
                "unsharp_mask",
                "detail_boost"
            ]
        );
        assert_eq!(
            steps[6],
            Step::UnsharpMask(UnsharpParams {
                radius: 3.0,
                percent: 250.0,
                threshold: 3.0
            })
        );
    }

    #[test]
    fn general_skips_adaptive_contrast_already_applied() {
        let ctx = RecipeContext {
            quality_aware: true,
            adaptive_applied: true,
        };
        let steps = Preset::General.recipe(0.2, ctx);
        assert!(!names(&steps).contains(&"adaptive_contrast"));
    }

    #[test]
    fn portrait_coefficients_are_gentlest() {
        let steps = Preset::Portrait.recipe(1.0, RecipeContext::default());
        assert_eq!(steps[1], Step::Brightness(1.1));
        assert_eq!(steps[2], Step::Contrast(1.2));
        assert_eq!(steps[3], Step::Sharpness(1.5));
        assert_eq!(
            steps[4],
            Step::UnsharpMask(UnsharpParams {
                radius: 1.0,
                percent: 100.0,
                threshold: 6.0
            })
        );
        assert_eq!(steps[5], Step::Color(1.1));
    }

    #[test]
    fn landscape_order() {
        let steps = Preset::Landscape.recipe(0.8, RecipeContext::default());
        assert_eq!(
            names(&steps),
            [
                "auto_contrast",
                "color",
                "contrast",
                "edge_enhance",
                "sharpness",
                "unsharp_mask",
                "brightness"
            ]
        );
    }

    #[test]
    fn zero_factor_scaling_steps_are_identity() {
        for preset in Preset::ALL {
            for step in preset.recipe(0.0, RecipeContext::default()) {
                match step {
                    Step::Brightness(f) | Step::Contrast(f) | Step::Color(f) | Step::Sharpness(f) => {
                        assert_eq!(f, 1.0)
                    }
                    Step::AutoContrast(_) => {}
                    other => panic!("unexpected conditional step {other:?}"),
                }
            }
        }
    }

    #[test]
    fn apply_preset_keeps_dimensions() {
        let raster = Raster::from_fn(24, 16, |x, y| [(x * 10) as u8, (y * 15) as u8, 90]);
        for preset in Preset::ALL {
            assert_eq!(apply_preset(&raster, preset, 1.0).dimensions(), (24, 16));
        }
    }

    #[test]
    fn apply_preset_is_deterministic() {
        let raster = Raster::from_fn(20, 20, |x, y| [(x * y) as u8, (x * 12) as u8, 40]);
        let a = apply_preset(&raster, Preset::Landscape, 0.9);
        let b = apply_preset(&raster, Preset::Landscape, 0.9);
        assert_eq!(a, b);
    }
}
