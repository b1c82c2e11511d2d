//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image` crate (pure Rust decoders) |
//! | Re-encode JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` (RGB8) |
//! | Re-encode PNG | `image::codecs::png::PngEncoder::new_with_quality` (original color type) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |

use super::backend::{BackendError, ImageBackend};
use super::params::{AvifParams, RasterFormat, ReencodeParams};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk. The format is sniffed from the
/// content, so a mislabelled extension still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

impl ImageBackend for RustBackend {
    fn reencode(&self, params: &ReencodeParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(&params.source)?;
        let mut buf = Vec::new();
        let result = match params.format {
            RasterFormat::Jpeg => {
                let quality = params.jpeg_quality.value() as u8;
                let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
                img.to_rgb8().write_with_encoder(encoder)
            }
            RasterFormat::Png => {
                let (compression, filter) = params.png_level.presets();
                let encoder = PngEncoder::new_with_quality(&mut buf, compression, filter);
                img.write_with_encoder(encoder)
            }
        };
        result.map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to encode {}: {}",
                params.source.display(),
                e
            ))
        })?;
        Ok(buf)
    }

    fn encode_avif(&self, params: &AvifParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        encode_to_file(&params.output, |buf| {
            let encoder =
                AvifEncoder::new_with_speed_quality(buf, params.speed, params.quality.value() as u8);
            img.to_rgba8()
                .write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))
        })
    }
}

/// Encode into memory and write `output` only once encoding succeeded.
fn encode_to_file<F>(output: &Path, encode: F) -> Result<(), BackendError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), BackendError>,
{
    let mut buf = Vec::new();
    encode(&mut buf)?;
    std::fs::write(output, buf).map_err(BackendError::Io)
}
