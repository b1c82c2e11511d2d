//! # Asset Forge
//!
//! A front-end asset pipeline for static sites. Templates become HTML, SCSS
//! becomes prefixed (and, for release, purified and minified) CSS, images
//! are re-encoded, SVG icons are merged into a symbol sprite and TrueType
//! fonts are packed as WOFF and WOFF2. A development server with live reload
//! rebuilds on change.
//!
//! # Architecture: Registry → Tasks → Pipelines
//!
//! ```text
//! PathRegistry   category → (source globs, output dir) for one Mode
//!      │
//! TaskKind       one converter chain per category, per-file failures collected
//!      │
//! Step           Clean | Task | Series | Parallel, validated before running
//!      │
//! dev / img / sprite / font / js / dist
//! ```
//!
//! Development builds into `build/` and keeps output readable; release
//! builds into `dist/` with minification, CSS purification and cache
//! busting. The same task code serves both, parameterized by [`task::Mode`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `assets.toml` loading, validation, stock defaults and `gen-config` output |
//! | [`paths`] | Path registry: source globs and output directories per asset category |
//! | [`sources`] | Glob resolution of a category's source set |
//! | [`clean`] | Output directory purging (whole directory or matching files) |
//! | [`task`] | Task kinds, build context, per-file failure collection |
//! | [`templates`] | minijinja rendering of pages, with the cache-busting `asset()` function |
//! | [`styles`] | SCSS compile (grass), prefixing/minify/purify (lightningcss) |
//! | [`purify`] | Markup token scan and unused-selector detection |
//! | [`scripts`] | JavaScript copy or minify |
//! | [`minify`] | Whitespace/comment minifiers for HTML and JavaScript |
//! | [`images`] | Raster re-encoding with AVIF siblings, modern-format pass-through |
//! | [`imaging`] | Image backend trait and the pure-Rust implementation |
//! | [`vectors`] | Standalone SVG optimization |
//! | [`svg`] | quick-xml passes: optimize, strip presentation, split icons |
//! | [`sprite`] | Symbol sprite and generated stylesheet partial |
//! | [`fonts`] | sfnt parsing, WOFF/WOFF2 packing, web font copy |
//! | [`fingerprint`] | Source hashing for cache-busting query strings |
//! | [`naming`] | File naming rules: partials, `.min` infix, symbol ids |
//! | [`pipeline`] | Named pipelines, validation and parallel execution |
//! | [`reload`] | Live-reload version counter shared by watcher and server |
//! | [`server`] | Static file server with live-reload injection |
//! | [`watch`] | Debounced watching and per-task coalescing dispatch |
//! | [`dev`] | Development session: build, serve, watch |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Per-File Failures Are Values
//!
//! A broken image or icon must not cost the rest of the build. Converters
//! return a [`task::TaskOutput`] listing written files and failed ones; the
//! pipeline prints every failure once all parallel branches have settled and
//! the CLI exits non-zero if there were any.
//!
//! ## Pure-Rust Toolchain
//!
//! SCSS, CSS, images, SVG and fonts are all handled in-process by Rust
//! crates. There is no Node, no libvips, no `sass` binary to install; the
//! binary is self-contained.
//!
//! ## Generated Partial Lives in the Source Tree
//!
//! The sprite builder writes `src/styles/global/_sprite.scss` so hand-written
//! styles can `@use` it. It is reported as an explicit output and written
//! atomically, because the style task may read it concurrently in `dist`.
//!
//! ## Coalescing Watch Dispatch
//!
//! Each watched task has one worker thread. Changes arriving during a run
//! are merged into a single trailing re-run, so saving ten files at once
//! compiles the stylesheet twice at most, never ten times.

pub mod clean;
pub mod config;
pub mod dev;
pub mod fingerprint;
pub mod fonts;
pub mod images;
pub mod imaging;
pub mod minify;
pub mod naming;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod purify;
pub mod reload;
pub mod scripts;
pub mod server;
pub mod sources;
pub mod sprite;
pub mod styles;
pub mod svg;
pub mod task;
pub mod templates;
pub mod vectors;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
