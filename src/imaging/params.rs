//! Parameter types for image operations.
//!
//! These structs describe *what* to encode, not *how*. They sit between the
//! raster task (which decides what each source needs) and the
//! [`backend`](super::backend) (which does the pixel work), so tests can
//! swap in a mock backend without touching task logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 80). Clamped on construction.
//! - [`PngLevel`]: optipng-style optimization level (0–7, default 5), mapped to encoder presets.
//! - [`RasterFormat`]: The two formats re-encoded in place.
//! - [`ReencodeParams`]: Re-encode a source in its own format.
//! - [`AvifParams`]: Encode a modern-format sibling.

use image::codecs::png::{CompressionType, FilterType};
use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Lossless PNG optimization level, 0 (fastest) to 7 (smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngLevel(u8);

impl PngLevel {
    pub fn new(level: u8) -> Self {
        Self(level.min(7))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Encoder presets for this level.
    ///
    /// | Level | Compression | Filter |
    /// |---|---|---|
    /// | 0 | Fast | none |
    /// | 1–2 | Default | adaptive |
    /// | 3–7 | Best | adaptive |
    pub fn presets(self) -> (CompressionType, FilterType) {
        match self.0 {
            0 => (CompressionType::Fast, FilterType::NoFilter),
            1 | 2 => (CompressionType::Default, FilterType::Adaptive),
            _ => (CompressionType::Best, FilterType::Adaptive),
        }
    }
}

impl Default for PngLevel {
    fn default() -> Self {
        Self(5)
    }
}

/// Raster formats that are re-encoded in their own format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    /// Format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg),
            "png" => Some(RasterFormat::Png),
            _ => None,
        }
    }
}

/// Re-encode `source` in its own format. The result is returned as bytes so
/// the caller can keep whichever of original and re-encoded is smaller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReencodeParams {
    pub source: PathBuf,
    pub format: RasterFormat,
    pub jpeg_quality: Quality,
    pub png_level: PngLevel,
}

/// Encode `source` as AVIF into `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct AvifParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: Quality,
    /// Encoder speed, 1 (slowest) to 10 (fastest).
    pub speed: u8,
}
