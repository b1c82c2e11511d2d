//! Style task: SCSS → CSS.
//!
//! ```text
//! src/styles/style.scss
//!   → grass (expanded)
//!   → lightningcss: vendor prefixes for the target browsers
//!   → release only: drop selectors unused by the markup, minify
//!   → <tree>/css/style.min.css
//! ```
//!
//! Development output is readable CSS; the `.min.css` name is kept so the
//! same `<link>` works in both trees. Compilation errors fail the task
//! with grass's message, which carries the offending file and line.

use crate::naming::{file_stem, min_name};
use crate::paths::{Category, absolute_glob};
use crate::purify::Purifier;
use crate::sources::{self, SourceError};
use crate::task::{BuildContext, FileFailure, TaskOutput, write_output};
use crate::templates::{self, TemplateError};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error("SCSS compile error: {0}")]
    Compile(String),
    #[error("CSS processing error: {0}")]
    Css(String),
    #[error("Failed to render templates for purification: {0}")]
    Templates(#[from] TemplateError),
    #[error("Invalid content glob {pattern:?}: {message}")]
    ContentGlob { pattern: String, message: String },
}

/// Browsers the generated CSS is prefixed for.
pub fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(80 << 16),
        edge: Some(80 << 16),
        firefox: Some(78 << 16),
        safari: Some(13 << 16),
        ios_saf: Some(13 << 16),
        ..Browsers::default()
    })
}

/// Compile one SCSS entry point. Imports resolve relative to the file.
pub fn compile_scss(path: &Path) -> Result<String, StyleError> {
    let options = grass::Options::default().style(grass::OutputStyle::Expanded);
    grass::from_path(path, &options).map_err(|e| StyleError::Compile(e.to_string()))
}

/// Prefix (and in release, purify and minify) compiled CSS.
pub fn process_css(
    css: &str,
    filename: &str,
    release: bool,
    unused_symbols: HashSet<String>,
) -> Result<String, StyleError> {
    let targets = browser_targets();
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| StyleError::Css(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            unused_symbols,
        })
        .map_err(|e| StyleError::Css(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: release,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Css(e.to_string()))?;
    Ok(printed.code)
}

/// Build a purifier from everything that may reference a class name.
///
/// Scans the in-memory render of every page, the raw template sources
/// (partials included) and the configured extra content globs.
pub fn markup_purifier(ctx: &BuildContext) -> Result<Purifier, StyleError> {
    let mut purifier = Purifier::new(ctx.config.styles.safelist.iter().cloned());

    // Pages that fail to render are reported by the template task.
    let (pages, _) = templates::render_pages(ctx)?;
    for page in &pages {
        purifier.scan(&page.html);
    }

    let templates_dir = &ctx.registry.entry(Category::Templates).sources.base;
    let mut patterns = vec![absolute_glob(templates_dir, "**/*.html")];
    patterns.extend(
        ctx.config
            .styles
            .purge_content
            .iter()
            .map(|p| absolute_glob(ctx.registry.root(), p)),
    );
    for pattern in patterns {
        let paths = glob::glob(&pattern).map_err(|e| StyleError::ContentGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        for path in paths.flatten().filter(|p| p.is_file()) {
            let bytes = fs::read(&path)?;
            purifier.scan(&String::from_utf8_lossy(&bytes));
        }
    }
    Ok(purifier)
}

pub fn run(ctx: &BuildContext) -> Result<TaskOutput, StyleError> {
    let entry = ctx.registry.entry(Category::Styles);
    let roots = sources::resolve(&entry.sources)?;
    let release = ctx.mode.is_release();
    let purifier = if release && !roots.is_empty() {
        Some(markup_purifier(ctx)?)
    } else {
        None
    };

    let mut output = TaskOutput::default();
    for source in roots {
        let result = compile_scss(&source.path).and_then(|css| {
            let unused = purifier
                .as_ref()
                .map(|p| p.unused(&css))
                .unwrap_or_default();
            let filename = source.relative.to_string_lossy();
            process_css(&css, &filename, release, unused)
        });
        let target = entry.output.join(min_name(&file_stem(&source.path), "css"));
        match result.and_then(|css| write_output(&target, css).map_err(StyleError::from)) {
            Ok(()) => output.written.push(target),
            Err(e) => output.failures.push(FileFailure::new(&source.path, e)),
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::task::Mode;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "src/styles/style.scss",
            "@use \"global/colors\";\n\
             .used { color: colors.$brand; }\n\
             .unused { color: blue; }\n\
             .from-script { display: none; }\n\
             .hover\\:text-white:hover { color: white; }\n\
             .flexy { user-select: none; }\n",
        );
        write(tmp.path(), "src/styles/global/_colors.scss", "$brand: #ff6600;\n");
        write(
            tmp.path(),
            "src/templates/index.html",
            "<p class=\"used flexy\">{% include \"_footer.html\" %}</p>",
        );
        write(tmp.path(), "src/templates/_footer.html", "<footer></footer>");
        write(tmp.path(), "src/js/script.js", "el.classList.add('from-script');");
        tmp
    }

    fn context(root: &Path, mode: Mode) -> BuildContext {
        let mut config = ProjectConfig::default();
        config.styles.purge_content = vec!["src/js/*.js".to_string()];
        BuildContext::new(root, config, mode)
    }

    #[test]
    fn development_output_keeps_every_rule() {
        let tmp = project();
        let output = run(&context(tmp.path(), Mode::Development)).unwrap();

        assert!(output.failures.is_empty());
        let css = fs::read_to_string(tmp.path().join("build/css/style.min.css")).unwrap();
        assert!(css.contains(".used"));
        assert!(css.contains(".unused"));
        assert!(css.contains('\n'));
    }

    #[test]
    fn output_is_vendor_prefixed() {
        let tmp = project();
        run(&context(tmp.path(), Mode::Development)).unwrap();
        let css = fs::read_to_string(tmp.path().join("build/css/style.min.css")).unwrap();
        assert!(css.contains("-webkit-user-select"));
    }

    #[test]
    fn release_purifies_and_minifies() {
        let tmp = project();
        let output = run(&context(tmp.path(), Mode::Release)).unwrap();

        assert!(output.failures.is_empty());
        let css = fs::read_to_string(tmp.path().join("dist/css/style.min.css")).unwrap();
        assert!(css.contains(".used{"));
        assert!(!css.contains(".unused"));
        assert!(css.contains(".from-script"));
        assert!(css.contains("hover\\:text-white"));
        assert!(!css.contains('\n'));
    }

    #[test]
    fn release_keeps_keyframes_named_like_an_unused_class() {
        let css = ".fade { color: red }\n\
                   .loader { animation: fade 1s }\n\
                   @keyframes fade { from { opacity: 0 } to { opacity: 1 } }\n";
        let mut purifier = Purifier::new(Vec::<String>::new());
        purifier.scan("<div class=\"loader\"></div>");

        let out = process_css(css, "style.scss", true, purifier.unused(css)).unwrap();

        assert!(out.contains("@keyframes fade"), "{out}");
        assert!(out.contains(".loader{"));
    }

    #[test]
    fn compiling_twice_is_byte_identical() {
        let tmp = project();
        let ctx = context(tmp.path(), Mode::Release);
        run(&ctx).unwrap();
        let first = fs::read(tmp.path().join("dist/css/style.min.css")).unwrap();
        run(&ctx).unwrap();
        let second = fs::read(tmp.path().join("dist/css/style.min.css")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn compile_error_is_reported_against_the_source() {
        let tmp = project();
        write(tmp.path(), "src/styles/style.scss", ".a { color: $missing; }");

        let output = run(&context(tmp.path(), Mode::Development)).unwrap();

        assert_eq!(output.failures.len(), 1);
        assert!(output.failures[0].message.contains("SCSS compile error"));
        assert!(!tmp.path().join("build/css/style.min.css").exists());
    }

    #[test]
    fn missing_root_stylesheet_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let output = run(&context(tmp.path(), Mode::Release)).unwrap();
        assert!(output.written.is_empty());
        assert!(output.failures.is_empty());
    }
}
