//! Template task: render page templates to HTML.
//!
//! Every non-partial `src/templates/*.html` is rendered with minijinja into
//! `<tree>/<name>.html`. Partials (`_layout.html`, `_nav.html`) are only
//! reachable through `{% extends %}` / `{% include %}`, which resolve
//! against the templates directory.
//!
//! ## Template context
//!
//! | Name | Value |
//! |---|---|
//! | `page` | file stem of the page being rendered (`index`, `about`) |
//! | `mode` | `"development"` or `"release"` |
//! | `release` | `true` in release mode |
//! | `asset(path)` | `path`, plus `?v=<hash>` in release when cache busting is on |
//!
//! Release output is passed through [`minify_html`].
//!
//! Pages are rendered in memory first ([`render_pages`]) so the release
//! stylesheet can scan the final markup without waiting for this task to
//! write anything.

use crate::fingerprint::{AssetVersions, FingerprintError};
use crate::minify::minify_html;
use crate::naming::file_stem;
use crate::paths::Category;
use crate::sources::{self, SourceError, SourceFile};
use crate::task::{BuildContext, FileFailure, TaskOutput, write_output};
use minijinja::value::Value;
use minijinja::{Environment, context, path_loader};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error("Failed to fingerprint assets: {0}")]
    Fingerprint(#[from] FingerprintError),
}

/// One page rendered in memory.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub source: SourceFile,
    pub html: String,
}

/// Build the template environment for a build context.
pub fn environment(ctx: &BuildContext) -> Result<Environment<'static>, TemplateError> {
    let base = &ctx.registry.entry(Category::Templates).sources.base;
    let mut env = Environment::new();
    env.set_loader(path_loader(base));

    let release = ctx.mode.is_release();
    env.add_global("release", Value::from(release));
    env.add_global("mode", Value::from(ctx.mode.name()));

    // URLs are marked safe: auto-escaping would turn `/` into `&#x2f;`.
    if release && ctx.config.pipeline.cache_bust {
        let versions = AssetVersions::compute(&ctx.registry)?;
        env.add_function("asset", move |path: String| {
            Value::from_safe_string(versions.bust(&path))
        });
    } else {
        env.add_function("asset", |path: String| Value::from_safe_string(path));
    }
    Ok(env)
}

/// Render every page, collecting per-page failures.
pub fn render_pages(
    ctx: &BuildContext,
) -> Result<(Vec<RenderedPage>, Vec<FileFailure>), TemplateError> {
    let pages = sources::resolve(&ctx.registry.entry(Category::Templates).sources)?;
    let env = environment(ctx)?;

    let mut rendered = Vec::with_capacity(pages.len());
    let mut failures = Vec::new();
    for source in pages {
        let name = source.relative.to_string_lossy().replace('\\', "/");
        let result = env
            .get_template(&name)
            .and_then(|t| t.render(context! { page => file_stem(&source.path) }));
        match result {
            Ok(html) => {
                let html = if ctx.mode.is_release() {
                    minify_html(&html)
                } else {
                    html
                };
                rendered.push(RenderedPage { source, html });
            }
            Err(e) => failures.push(FileFailure::new(&source.path, e)),
        }
    }
    Ok((rendered, failures))
}

/// Render and write every page.
pub fn run(ctx: &BuildContext) -> Result<TaskOutput, TemplateError> {
    let output_dir = &ctx.registry.entry(Category::Templates).output;
    let (pages, failures) = render_pages(ctx)?;

    let mut output = TaskOutput {
        written: Vec::new(),
        failures,
    };
    for page in pages {
        let path = page.source.mirrored_path(output_dir);
        match write_output(&path, &page.html) {
            Ok(()) => output.written.push(path),
            Err(e) => output.failures.push(FileFailure::new(&page.source.path, e)),
        }
    }
    Ok(output)
}
