//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Enhance
//!
//! ```text
//! photo.jpg → photo-enhanced.jpg
//!     Preset: general, scale 2x, strength 70 (quality-aware)
//!     Size: 800x600 → 1600x1200
//!     Quality: brightness 0.42, contrast 0.37, sharpness 0.12
//!     Steps: upscale, denoise, adaptive_contrast, auto_contrast, ...
//!     Time: 1.84s
//! ```
//!
//! ## Blur
//!
//! ```text
//! portrait.jpg → portrait-blurred.jpg
//!     Blur: strength 15, radial mask
//!     Size: 3000x2000 → 2449x1632
//!     Time: 0.91s
//! ```
//!
//! ## Batch
//!
//! ```text
//! Enhancing 12 images
//!     photos/001-dawn.jpg → enhanced/001-dawn.jpg (1.02s)
//!     photos/broken.png: FAILED Failed to decode ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::BatchEvent;
use crate::engine::{BlurMetadata, EnhancementMetadata};
use crate::quality::QualityMetrics;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

fn dims(d: [u32; 2]) -> String {
    format!("{}x{}", d[0], d[1])
}

/// `a → b` header, or just `a` when there is no output file.
fn header(input: &Path, output: Option<&Path>) -> String {
    match output {
        Some(out) => format!("{} \u{2192} {}", input.display(), out.display()),
        None => input.display().to_string(),
    }
}

fn size_line(from: [u32; 2], to: [u32; 2]) -> String {
    if from == to {
        format!("    Size: {}", dims(from))
    } else {
        format!("    Size: {} \u{2192} {}", dims(from), dims(to))
    }
}

// ============================================================================
// Analyze
// ============================================================================

/// Quality scores, one per line.
pub fn format_metrics(metrics: &QualityMetrics) -> Vec<String> {
    vec![
        format!("    Brightness: {:.2}", metrics.brightness),
        format!("    Contrast: {:.2}", metrics.contrast),
        format!("    Sharpness: {:.2}", metrics.sharpness),
        format!(
            "    Needs enhancement: {}",
            if metrics.needs_enhancement { "yes" } else { "no" }
        ),
    ]
}

pub fn print_metrics(input: &Path, metrics: &QualityMetrics) {
    println!("{}", header(input, None));
    for line in format_metrics(metrics) {
        println!("{}", line);
    }
}

// ============================================================================
// Enhance
// ============================================================================

pub fn format_enhance_output(
    input: &Path,
    output: &Path,
    metadata: &EnhancementMetadata,
) -> Vec<String> {
    let mut lines = vec![
        header(input, Some(output)),
        format!(
            "    Preset: {}, scale {}x, strength {} ({})",
            metadata.preset, metadata.scale, metadata.strength, metadata.mode
        ),
        size_line(metadata.original_dimensions, metadata.output_dimensions),
    ];
    if let Some(q) = &metadata.quality_metrics {
        lines.push(format!(
            "    Quality: brightness {:.2}, contrast {:.2}, sharpness {:.2}",
            q.brightness, q.contrast, q.sharpness
        ));
    }
    if metadata.enhancements_applied.is_empty() {
        lines.push("    Steps: none".to_string());
    } else {
        lines.push(format!(
            "    Steps: {}",
            metadata.enhancements_applied.join(", ")
        ));
    }
    lines.push(format!("    Time: {:.2}s", metadata.processing_time));
    lines
}

pub fn print_enhance_output(input: &Path, output: &Path, metadata: &EnhancementMetadata) {
    for line in format_enhance_output(input, output, metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// Blur
// ============================================================================

pub fn format_blur_output(input: &Path, output: &Path, metadata: &BlurMetadata) -> Vec<String> {
    vec![
        header(input, Some(output)),
        format!(
            "    Blur: strength {}, {} mask",
            metadata.blur_strength, metadata.mask
        ),
        size_line(metadata.original_dimensions, metadata.output_dimensions),
        format!("    Time: {:.2}s", metadata.processing_time),
    ]
}

pub fn print_blur_output(input: &Path, output: &Path, metadata: &BlurMetadata) {
    for line in format_blur_output(input, output, metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Enhancing {} {}", total, noun)]
        }
        BatchEvent::ImageEnhanced {
            source,
            output,
            metadata,
        } => vec![format!(
            "    {} ({:.2}s)",
            header(source, Some(output)),
            metadata.processing_time
        )],
        BatchEvent::ImageFailed { source, error } => {
            vec![format!("    {}: FAILED {}", source.display(), error)]
        }
    }
}
