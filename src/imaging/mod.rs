//! Raster image encoding: pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Re-encode JPEG** | `JpegEncoder`, quality from `[images]` |
//! | **Re-encode PNG** | `PngEncoder`, level mapped to compression/filter presets |
//! | **AVIF sibling** | `AvifEncoder` (rav1e) |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing encode operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//!
//! Deciding *which* files get which operation lives in
//! [`images`](crate::images).

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use params::{AvifParams, PngLevel, Quality, RasterFormat, ReencodeParams};
pub use rust_backend::RustBackend;
