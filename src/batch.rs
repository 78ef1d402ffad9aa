//! Directory batch enhancement.
//!
//! Walks a source directory, enhances every supported image with the same
//! request, and writes each result to the same relative path under the
//! output directory:
//!
//! ```text
//! photos/                    enhanced/
//! ├── 001-dawn.jpg     →     ├── 001-dawn.jpg
//! ├── notes.txt              └── travel/
//! └── travel/                    └── rome.png
//!     └── rome.png
//! ```
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel with [rayon](https://docs.rs/rayon); the
//! global pool size follows `[processing] max_processes`. Progress is
//! streamed as [`BatchEvent`]s over an optional `mpsc` channel so the caller
//! can print from its own thread.
//!
//! A failing image does not abort the batch. It is reported as
//! [`BatchEvent::ImageFailed`] and counted in the summary.

use crate::engine::{EnhancementMetadata, EnhancementRequest, Enhancer};
use crate::error::EnhanceError;
use crate::io::{self, IoError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// Why a single image failed.
#[derive(Error, Debug)]
pub enum ImageFailure {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Enhance(#[from] EnhanceError),
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Inputs discovered; processing is about to begin.
    Started { total: usize },
    ImageEnhanced {
        source: PathBuf,
        output: PathBuf,
        metadata: EnhancementMetadata,
    },
    ImageFailed { source: PathBuf, error: String },
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub enhanced: usize,
    pub failed: usize,
    /// Written files, in source order.
    pub outputs: Vec<PathBuf>,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} enhanced, {} failed", self.enhanced, self.failed)
    }
}

/// Supported images under `source_dir`, relative to it, sorted by path.
///
/// Anything under `exclude` (typically the output directory) is skipped.
pub fn collect_inputs(source_dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>, BatchError> {
    if !source_dir.is_dir() {
        return Err(BatchError::SourceNotFound(source_dir.to_path_buf()));
    }
    let mut inputs = Vec::new();
    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| exclude.is_none_or(|ex| entry.path() != ex));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && io::is_supported_image(entry.path()) {
            if let Ok(rel) = entry.path().strip_prefix(source_dir) {
                inputs.push(rel.to_path_buf());
            }
        }
    }
    Ok(inputs)
}

/// Enhance every supported image under `source_dir` into `output_dir`.
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    request: &EnhancementRequest,
    enhancer: &Enhancer,
    jpeg_quality: u8,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    let inputs = collect_inputs(source_dir, Some(output_dir))?;
    std::fs::create_dir_all(output_dir)?;

    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            // The receiver may have gone away; progress is best-effort
            tx.send(event).ok();
        }
    };
    emit(BatchEvent::Started {
        total: inputs.len(),
    });

    let results: Vec<(PathBuf, Result<EnhancementMetadata, ImageFailure>)> = inputs
        .par_iter()
        .map(|rel| {
            let source = source_dir.join(rel);
            let output = output_dir.join(rel);
            let result = enhance_file(&source, &output, request, enhancer, jpeg_quality);
            match &result {
                Ok(metadata) => {
                    debug!(source = %source.display(), "Enhanced");
                    emit(BatchEvent::ImageEnhanced {
                        source: source.clone(),
                        output: output.clone(),
                        metadata: metadata.clone(),
                    });
                }
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "Enhancement failed");
                    emit(BatchEvent::ImageFailed {
                        source: source.clone(),
                        error: e.to_string(),
                    });
                }
            }
            (output, result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (output, result) in results {
        match result {
            Ok(_) => {
                summary.enhanced += 1;
                summary.outputs.push(output);
            }
            Err(_) => summary.failed += 1,
        }
    }
    Ok(summary)
}

fn enhance_file(
    source: &Path,
    output: &Path,
    request: &EnhancementRequest,
    enhancer: &Enhancer,
    jpeg_quality: u8,
) -> Result<EnhancementMetadata, ImageFailure> {
    let raster = io::load_raster(source)?;
    let (enhanced, metadata) = enhancer.enhance(&raster, request)?;
    io::save_raster(&enhanced, output, jpeg_quality)?;
    Ok(metadata)
}
