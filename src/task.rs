//! Build tasks: the unit of work every pipeline is composed of.
//!
//! A task reads the sources of exactly one registry entry, runs them through
//! a fixed converter chain and writes into that entry's output directory.
//! Tasks never fail as a whole for a single bad file: per-file errors are
//! collected as [`FileFailure`]s and the remaining files still convert.
//!
//! ```text
//! TaskKind::ContentRaster
//!   sources: src/img/content_img/*.{jpg,jpeg,png}
//!   chain:   re-encode (keep smaller) → AVIF sibling
//!   output:  <tree>/img/content_img/
//! ```

use crate::config::ProjectConfig;
use crate::fonts::FontTarget;
use crate::paths::{Category, PathRegistry};
use crate::sources::SourceFile;
use crate::{fonts, images, scripts, sprite, styles, templates, vectors};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Build mode: selects the output tree and how strict the converters are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `build/`, readable output, live reload.
    Development,
    /// `dist/`, minified, purified and cache-busted output.
    Release,
}

impl Mode {
    pub fn is_release(self) -> bool {
        self == Mode::Release
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Release => "release",
        }
    }
}

/// Every task the pipelines can schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Templates,
    Styles,
    Scripts,
    BackgroundRaster,
    ContentRaster,
    ContentPassthrough,
    BackgroundVector,
    ContentVector,
    Sprite,
    TtfToWoff,
    TtfToWoff2,
    CopyWebFonts,
}

impl TaskKind {
    pub const ALL: [TaskKind; 12] = [
        TaskKind::Templates,
        TaskKind::Styles,
        TaskKind::Scripts,
        TaskKind::BackgroundRaster,
        TaskKind::ContentRaster,
        TaskKind::ContentPassthrough,
        TaskKind::BackgroundVector,
        TaskKind::ContentVector,
        TaskKind::Sprite,
        TaskKind::TtfToWoff,
        TaskKind::TtfToWoff2,
        TaskKind::CopyWebFonts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Templates => "templates",
            TaskKind::Styles => "styles",
            TaskKind::Scripts => "scripts",
            TaskKind::BackgroundRaster => "background images",
            TaskKind::ContentRaster => "content images",
            TaskKind::ContentPassthrough => "modern images",
            TaskKind::BackgroundVector => "background svg",
            TaskKind::ContentVector => "content svg",
            TaskKind::Sprite => "sprite",
            TaskKind::TtfToWoff => "woff",
            TaskKind::TtfToWoff2 => "woff2",
            TaskKind::CopyWebFonts => "web fonts",
        }
    }

    /// The registry entry this task reads and writes.
    pub fn category(self) -> Category {
        match self {
            TaskKind::Templates => Category::Templates,
            TaskKind::Styles => Category::Styles,
            TaskKind::Scripts => Category::Scripts,
            TaskKind::BackgroundRaster => Category::BackgroundImages,
            TaskKind::ContentRaster => Category::ContentImages,
            TaskKind::ContentPassthrough => Category::ContentModernImages,
            TaskKind::BackgroundVector => Category::BackgroundVectors,
            TaskKind::ContentVector => Category::ContentVectors,
            TaskKind::Sprite => Category::SpriteIcons,
            TaskKind::TtfToWoff | TaskKind::TtfToWoff2 => Category::LegacyFonts,
            TaskKind::CopyWebFonts => Category::WebFonts,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a task needs: mode, resolved paths and project config.
///
/// Cheap to share behind an `Arc`; never mutated once built.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub mode: Mode,
    pub registry: PathRegistry,
    pub config: ProjectConfig,
}

impl BuildContext {
    pub fn new(root: &Path, config: ProjectConfig, mode: Mode) -> Self {
        let registry = PathRegistry::new(root, &config.paths, mode);
        Self {
            mode,
            registry,
            config,
        }
    }
}

/// A source file that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// What a task body produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl TaskOutput {
    pub fn merge(&mut self, other: TaskOutput) {
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }
}

/// Outcome of one task run, as printed and counted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: TaskKind,
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub duration: Duration,
}

impl TaskReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Convert every source in parallel, collecting per-file failures.
///
/// `convert` returns the paths it wrote. An error for one file is recorded
/// against that file and never stops its siblings.
pub fn passthrough<F, E>(sources: &[SourceFile], convert: F) -> TaskOutput
where
    F: Fn(&SourceFile) -> Result<Vec<PathBuf>, E> + Sync,
    E: fmt::Display + Send,
{
    let results: Vec<_> = sources
        .par_iter()
        .map(|source| (source, convert(source)))
        .collect();

    let mut output = TaskOutput::default();
    for (source, result) in results {
        match result {
            Ok(paths) => output.written.extend(paths),
            Err(e) => output.failures.push(FileFailure::new(&source.path, e)),
        }
    }
    output
}

/// Run one task to completion.
///
/// Task-level errors (unreadable globs, a stylesheet that fails to compile)
/// are reported as a single failure against the task's source directory.
pub fn run(kind: TaskKind, ctx: &BuildContext) -> TaskReport {
    let started = Instant::now();
    let result = match kind {
        TaskKind::Templates => templates::run(ctx).map_err(|e| e.to_string()),
        TaskKind::Styles => styles::run(ctx).map_err(|e| e.to_string()),
        TaskKind::Scripts => scripts::run(ctx).map_err(|e| e.to_string()),
        TaskKind::BackgroundRaster => {
            images::run_raster(ctx, Category::BackgroundImages).map_err(|e| e.to_string())
        }
        TaskKind::ContentRaster => {
            images::run_raster(ctx, Category::ContentImages).map_err(|e| e.to_string())
        }
        TaskKind::ContentPassthrough => images::run_passthrough(ctx).map_err(|e| e.to_string()),
        TaskKind::BackgroundVector => {
            vectors::run(ctx, Category::BackgroundVectors).map_err(|e| e.to_string())
        }
        TaskKind::ContentVector => {
            vectors::run(ctx, Category::ContentVectors).map_err(|e| e.to_string())
        }
        TaskKind::Sprite => sprite::run(ctx)
            .map(TaskOutput::from)
            .map_err(|e| e.to_string()),
        TaskKind::TtfToWoff => fonts::run(ctx, FontTarget::Woff).map_err(|e| e.to_string()),
        TaskKind::TtfToWoff2 => fonts::run(ctx, FontTarget::Woff2).map_err(|e| e.to_string()),
        TaskKind::CopyWebFonts => fonts::run_copy(ctx).map_err(|e| e.to_string()),
    };

    let output = result.unwrap_or_else(|message| TaskOutput {
        written: Vec::new(),
        failures: vec![FileFailure::new(
            &ctx.registry.entry(kind.category()).sources.base,
            message,
        )],
    });
    TaskReport {
        task: kind,
        written: output.written,
        failures: output.failures,
        duration: started.elapsed(),
    }
}

/// Create the parent directory of `path`, then write `contents`.
pub fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
