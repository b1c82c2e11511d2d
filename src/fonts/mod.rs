//! Font tasks: TrueType/OpenType sources packed as WOFF and WOFF2, and
//! ready-made web fonts copied through.
//!
//! Sub-directories below `src/fonts/` are kept, so
//! `src/fonts/Inter/Inter-Regular.ttf` becomes
//! `<tree>/fonts/Inter/Inter-Regular.woff2`.

pub mod sfnt;
pub mod woff;
pub mod woff2;

use crate::naming::file_stem;
use crate::paths::Category;
use crate::sources::{self, SourceError};
use crate::task::{BuildContext, TaskOutput, passthrough, write_output};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed font: {0}")]
    Malformed(String),
    #[error("Unsupported font: {0}")]
    Unsupported(String),
}

/// Web font container a TTF is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontTarget {
    Woff,
    Woff2,
}

impl FontTarget {
    pub fn extension(self) -> &'static str {
        match self {
            FontTarget::Woff => "woff",
            FontTarget::Woff2 => "woff2",
        }
    }

    pub fn encode(self, ttf: &[u8]) -> Result<Vec<u8>, FontError> {
        match self {
            FontTarget::Woff => woff::encode(ttf),
            FontTarget::Woff2 => woff2::encode(ttf),
        }
    }
}

/// Pack every TTF source into `target`.
pub fn run(ctx: &BuildContext, target: FontTarget) -> Result<TaskOutput, SourceError> {
    let entry = ctx.registry.entry(Category::LegacyFonts);
    let files = sources::resolve(&entry.sources)?;

    Ok(passthrough(&files, |source| {
        let ttf = fs::read(&source.path)?;
        let packed = target.encode(&ttf)?;
        let name = format!("{}.{}", file_stem(&source.path), target.extension());
        let output = source.output_path(&entry.output, &name);
        write_output(&output, packed)?;
        Ok::<_, FontError>(vec![output])
    }))
}

/// Copy existing `.woff`/`.woff2` files unchanged.
pub fn run_copy(ctx: &BuildContext) -> Result<TaskOutput, SourceError> {
    let entry = ctx.registry.entry(Category::WebFonts);
    let files = sources::resolve(&entry.sources)?;

    Ok(passthrough(&files, |source| {
        let output = source.mirrored_path(&entry.output);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source.path, &output)?;
        Ok::<_, std::io::Error>(vec![output])
    }))
}
