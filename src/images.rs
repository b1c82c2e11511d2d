//! Raster image tasks.
//!
//! Background and content JPEG/PNG images are re-encoded in their own
//! format and whichever of original and re-encoded bytes is smaller is
//! written out, so an already-optimized image is never made worse.
//! Content images also get an AVIF sibling next to them:
//!
//! ```text
//! src/img/content_img/hero.jpg  →  <tree>/img/content_img/hero.jpg
//!                                  <tree>/img/content_img/hero.avif
//! ```
//!
//! Content images that are already WebP or AVIF are copied unchanged by
//! [`run_passthrough`].

use crate::imaging::{
    AvifParams, BackendError, ImageBackend, PngLevel, Quality, RasterFormat, ReencodeParams,
    RustBackend,
};
use crate::naming::file_stem;
use crate::paths::Category;
use crate::sources::{self, SourceError, SourceFile};
use crate::task::{BuildContext, TaskOutput, passthrough, write_output};
use std::fs;
use std::path::PathBuf;

/// Raster task for one image category with the production backend.
pub fn run_raster(ctx: &BuildContext, category: Category) -> Result<TaskOutput, SourceError> {
    run_raster_with_backend(ctx, category, &RustBackend::new())
}

/// Raster task with an explicit backend.
pub fn run_raster_with_backend(
    ctx: &BuildContext,
    category: Category,
    backend: &impl ImageBackend,
) -> Result<TaskOutput, SourceError> {
    let entry = ctx.registry.entry(category);
    let files = sources::resolve(&entry.sources)?;
    let with_avif = category == Category::ContentImages;
    let images = &ctx.config.images;

    Ok(passthrough(&files, |source| {
        let mut written = vec![optimize(backend, source, &entry.output, ctx)?];
        if with_avif {
            let output = source.output_path(&entry.output, &format!("{}.avif", file_stem(&source.path)));
            backend.encode_avif(&AvifParams {
                source: source.path.clone(),
                output: output.clone(),
                quality: Quality::new(images.avif_quality),
                speed: images.avif_speed,
            })?;
            written.push(output);
        }
        Ok::<_, BackendError>(written)
    }))
}

/// Re-encode one image and write the smaller of original and re-encoded.
fn optimize(
    backend: &impl ImageBackend,
    source: &SourceFile,
    output_dir: &std::path::Path,
    ctx: &BuildContext,
) -> Result<PathBuf, BackendError> {
    let format = RasterFormat::from_path(&source.path).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Unsupported image: {}", source.path.display()))
    })?;
    let original = fs::read(&source.path)?;
    let reencoded = backend.reencode(&ReencodeParams {
        source: source.path.clone(),
        format,
        jpeg_quality: Quality::new(ctx.config.images.jpeg_quality),
        png_level: PngLevel::new(ctx.config.images.png_level),
    })?;

    let target = source.mirrored_path(output_dir);
    let smaller = if reencoded.len() < original.len() {
        reencoded
    } else {
        original
    };
    write_output(&target, smaller)?;
    Ok(target)
}

/// Copy pre-existing WebP/AVIF content images unchanged.
pub fn run_passthrough(ctx: &BuildContext) -> Result<TaskOutput, SourceError> {
    let entry = ctx.registry.entry(Category::ContentModernImages);
    let files = sources::resolve(&entry.sources)?;

    Ok(passthrough(&files, |source| {
        let target = source.mirrored_path(&entry.output);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source.path, &target)?;
        Ok::<_, std::io::Error>(vec![target])
    }))
}
