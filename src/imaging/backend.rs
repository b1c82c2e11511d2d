//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the raster tasks
//! need: re-encode a JPEG/PNG in its own format, and write an AVIF sibling.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked into the binary.

use super::params::{AvifParams, ReencodeParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: the raster tasks call them from rayon
/// workers.
pub trait ImageBackend: Sync {
    /// Re-encode a raster image, returning the encoded bytes.
    fn reencode(&self, params: &ReencodeParams) -> Result<Vec<u8>, BackendError>;

    /// Encode a raster image as AVIF and write it to `params.output`.
    fn encode_avif(&self, params: &AvifParams) -> Result<(), BackendError>;
}
