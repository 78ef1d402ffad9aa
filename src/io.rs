//! Decoding files into rasters and encoding rasters back to disk.
//!
//! | Operation | Implementation |
//! |-----------|---------------|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate, format sniffed from content |
//! | Orientation | EXIF orientation read from the decoder and applied before use |
//! | Transparency | Flattened onto white ([`Raster::from_dynamic`]) |
//! | Encode JPEG | `JpegEncoder` at the configured quality |
//! | Encode PNG/TIFF/WebP | Lossless, format chosen by extension |

use crate::raster::Raster;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufRead, BufWriter, Cursor, Seek};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True when `path` has an extension in [`supported_input_extensions`].
pub fn is_supported_image(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Load, orient and flatten an image file.
pub fn load_raster(path: &Path) -> Result<Raster, IoError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    decode_oriented(reader, path)
}

/// Decode an in-memory encoded image.
pub fn decode_raster(bytes: &[u8]) -> Result<Raster, IoError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    decode_oriented(reader, Path::new("<memory>"))
}

fn decode_oriented<R: BufRead + Seek>(
    reader: ImageReader<R>,
    path: &Path,
) -> Result<Raster, IoError> {
    let decode_err = |source| IoError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let mut decoder = reader.into_decoder().map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);
    Ok(Raster::from_dynamic(img))
}

/// Encode `raster` to `path`, choosing the format from the extension.
///
/// Parent directories are created as needed.
pub fn save_raster(raster: &Raster, path: &Path, jpeg_quality: u8) -> Result<(), IoError> {
    let ext = extension_of(path).unwrap_or_default();
    let format = PHOTO_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
        .ok_or_else(|| IoError::UnsupportedFormat(format!("'{ext}' ({})", path.display())))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let encode_err = |source| IoError::Encode {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ImageFormat::Jpeg => {
            let writer = BufWriter::new(File::create(path)?);
            JpegEncoder::new_with_quality(writer, jpeg_quality.clamp(1, 100))
                .write_image(
                    raster.pixels(),
                    raster.width(),
                    raster.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(encode_err)
        }
        other => raster
            .as_image()
            .save_with_format(path, other)
            .map_err(encode_err),
    }
}
