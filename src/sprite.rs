//! SVG symbol sprite builder.
//!
//! ```text
//! src/img/sprite/*.svg (sorted by path)
//!   → optimize → strip fill/stroke/style → `&gt;` patch → split root
//!   → <tree>/img/sprite/sprite.svg          one <symbol> per icon
//!   → src/styles/global/_sprite.scss        one rule per icon
//! ```
//!
//! Symbol ids come from the icon file stem ([`SymbolIds`]), so
//! `arrow right.svg` is referenced as `sprite.svg#arrow-right` and styled
//! with `.svg-arrow-right`.
//!
//! The stylesheet partial is rendered from
//! `src/styles/templates/_sprite_template.scss` when the project provides
//! one, otherwise from [`DEFAULT_PARTIAL_TEMPLATE`]. The template sees:
//!
//! | Name | Value |
//! |---|---|
//! | `sprite` | sprite URL relative to the stylesheet (`../img/sprite/sprite.svg`) |
//! | `icons` | list of `{ id, name, width, height }`; sizes come from the `viewBox` and may be absent |
//!
//! The partial lives in the *source* tree and is read by the style task,
//! so it is replaced atomically and only when its content changes.

use crate::naming::{SymbolIds, file_stem};
use crate::paths::Category;
use crate::sources::{self, SourceError, SourceFile};
use crate::svg::{self, IconMarkup, SvgError};
use crate::task::{BuildContext, FileFailure, TaskOutput, write_output};
use maud::{Markup, PreEscaped, html};
use minijinja::{AutoEscape, Environment, context};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the generated sprite inside the sprite output directory.
pub const SPRITE_FILENAME: &str = "sprite.svg";

/// Sprite URL as seen from `css/style.min.css`.
const SPRITE_HREF: &str = "../img/sprite/sprite.svg";

pub const DEFAULT_PARTIAL_TEMPLATE: &str = "\
// Generated from src/img/sprite/*.svg. Do not edit: rebuilt by `asset-forge sprite`.
$sprite: \"{{ sprite }}\";
{% for icon in icons %}
.svg-{{ icon.id }} {
  display: inline-block;
{%- if icon.width %}
  width: {{ icon.width }}px;
{%- endif %}
{%- if icon.height %}
  height: {{ icon.height }}px;
{%- endif %}
}
{% endfor %}";

#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error("Sprite template error: {0}")]
    Template(String),
}

/// One icon ready to be embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteIcon {
    pub id: String,
    pub name: String,
    pub markup: IconMarkup,
}

impl SpriteIcon {
    /// Width and height from the `viewBox`, when it has four numbers.
    pub fn size(&self) -> Option<(f64, f64)> {
        let view_box = self.markup.view_box.as_deref()?;
        let parts: Vec<f64> = view_box
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [_, _, w, h] => Some((*w, *h)),
            _ => None,
        }
    }
}

/// Both files a sprite build writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteOutput {
    pub sprite: PathBuf,
    pub partial: PathBuf,
    /// Symbol ids, in sprite order.
    pub ids: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl From<SpriteOutput> for TaskOutput {
    fn from(output: SpriteOutput) -> Self {
        TaskOutput {
            written: vec![output.sprite, output.partial],
            failures: output.failures,
        }
    }
}

#[derive(Serialize)]
struct PartialEntry<'a> {
    id: &'a str,
    name: &'a str,
    width: Option<String>,
    height: Option<String>,
}

/// Run one icon through the optimizer and presentation stripper.
pub fn prepare_icon(path: &Path) -> Result<IconMarkup, SvgError> {
    let source = fs::read_to_string(path)?;
    let optimized = svg::optimize(&source)?;
    let stripped = svg::unescape_gt(&svg::strip_presentation(&optimized)?);
    svg::parse_icon(&stripped)
}

/// Merge icons into one document of `<symbol>`s.
pub fn render_sprite(icons: &[SpriteIcon]) -> Markup {
    html! {
        svg xmlns="http://www.w3.org/2000/svg" style="display: none;" {
            @for icon in icons {
                symbol id=(icon.id) viewBox=[icon.markup.view_box.as_deref()] {
                    (PreEscaped(&icon.markup.inner))
                }
            }
        }
    }
}

/// Render the stylesheet partial from a template source.
pub fn render_partial(template: &str, icons: &[SpriteIcon]) -> Result<String, SpriteError> {
    // Sizes are pre-formatted: the template engine prints `24.0` for floats.
    let entries: Vec<PartialEntry> = icons
        .iter()
        .map(|icon| {
            let size = icon.size();
            PartialEntry {
                id: &icon.id,
                name: &icon.name,
                width: size.map(|(w, _)| w.to_string()),
                height: size.map(|(_, h)| h.to_string()),
            }
        })
        .collect();

    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.render_str(template, context! { sprite => SPRITE_HREF, icons => entries })
        .map_err(|e| SpriteError::Template(e.to_string()))
}

/// Replace `path` via a sibling temp file, skipping identical content.
fn replace_file(path: &Path, contents: &str) -> io::Result<()> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(());
    }
    let tmp = path.with_extension("scss.tmp");
    write_output(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Build the sprite and its stylesheet partial.
pub fn run(ctx: &BuildContext) -> Result<SpriteOutput, SpriteError> {
    let entry = ctx.registry.entry(Category::SpriteIcons);
    let files = sources::resolve(&entry.sources)?;

    let prepared: Vec<(&SourceFile, Result<IconMarkup, SvgError>)> = files
        .par_iter()
        .map(|file| (file, prepare_icon(&file.path)))
        .collect();

    let mut ids = SymbolIds::new();
    let mut icons = Vec::with_capacity(prepared.len());
    let mut failures = Vec::new();
    for (file, result) in prepared {
        match result {
            Ok(markup) => {
                let name = file_stem(&file.path);
                icons.push(SpriteIcon {
                    id: ids.allocate(&name),
                    name,
                    markup,
                });
            }
            Err(e) => failures.push(FileFailure::new(&file.path, e)),
        }
    }

    let sprite = entry.output.join(SPRITE_FILENAME);
    write_output(&sprite, render_sprite(&icons).into_string())?;

    let template_path = ctx.registry.sprite_template();
    let template = match fs::read_to_string(&template_path) {
        Ok(source) => source,
        Err(e) if e.kind() == io::ErrorKind::NotFound => DEFAULT_PARTIAL_TEMPLATE.to_string(),
        Err(e) => return Err(e.into()),
    };
    let partial = ctx.registry.sprite_partial();
    replace_file(&partial, &render_partial(&template, &icons)?)?;

    Ok(SpriteOutput {
        sprite,
        partial,
        ids: icons.into_iter().map(|icon| icon.id).collect(),
        failures,
    })
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
            "src/img/sprite/arrow right.svg",
            r##"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none"><title>Arrow</title><path stroke="#000" d="M4 12h16"/></svg>"##,
        );
        write(
            tmp.path(),
            "src/img/sprite/arrow-right.svg",
            r#"<svg width="16" height="16"><path style="fill:red" d="M0 0"/></svg>"#,
        );
        write(
            tmp.path(),
            "src/img/sprite/label.svg",
            r#"<svg viewBox="0 0 10 10"><text>1 &gt; 0</text></svg>"#,
        );
        tmp
    }

    fn context(root: &Path) -> BuildContext {
        BuildContext::new(root, ProjectConfig::default(), Mode::Development)
    }

    #[test]
    fn builds_one_symbol_per_icon_with_unique_ids() {
        let tmp = project();
        let output = run(&context(tmp.path())).unwrap();

        assert!(output.failures.is_empty());
        assert_eq!(output.ids, vec!["arrow-right", "arrow-right-2", "label"]);
        let sprite = fs::read_to_string(&output.sprite).unwrap();
        assert_eq!(sprite.matches("<symbol").count(), 3);
        assert!(sprite.contains(r#"<symbol id="arrow-right" viewBox="0 0 24 24"><path d="M4 12h16"/></symbol>"#));
        assert!(sprite.contains(r#"<symbol id="arrow-right-2" viewBox="0 0 16 16">"#));
    }

    #[test]
    fn sprite_has_no_escaped_gt_or_presentation_attributes() {
        let tmp = project();
        let output = run(&context(tmp.path())).unwrap();

        let sprite = fs::read_to_string(&output.sprite).unwrap();
        assert!(!sprite.contains("&gt;"));
        assert!(sprite.contains("<text>1 > 0</text>"));
        assert!(!sprite.contains("fill="));
        assert!(!sprite.contains("stroke="));
        assert!(!sprite.contains("<title>"));
    }

    #[test]
    fn writes_partial_with_one_rule_per_icon_into_source_tree() {
        let tmp = project();
        let output = run(&context(tmp.path())).unwrap();

        assert_eq!(output.partial, tmp.path().join("src/styles/global/_sprite.scss"));
        let partial = fs::read_to_string(&output.partial).unwrap();
        assert_eq!(partial.matches(".svg-").count(), 3);
        assert!(partial.contains(".svg-arrow-right {\n  display: inline-block;\n  width: 24px;\n  height: 24px;\n}"));
        assert!(partial.contains("$sprite: \"../img/sprite/sprite.svg\";"));
    }

    #[test]
    fn project_template_overrides_default() {
        let tmp = project();
        write(
            tmp.path(),
            "src/styles/templates/_sprite_template.scss",
            "{% for icon in icons %}%{{ icon.name }}|{{ icon.id }}\n{% endfor %}",
        );

        let output = run(&context(tmp.path())).unwrap();

        let partial = fs::read_to_string(output.partial).unwrap();
        assert_eq!(
            partial,
            "%arrow right|arrow-right\n%arrow-right|arrow-right-2\n%label|label\n"
        );
    }

    #[test]
    fn rerun_overwrites_both_outputs() {
        let tmp = project();
        let ctx = context(tmp.path());
        run(&ctx).unwrap();
        fs::remove_file(tmp.path().join("src/img/sprite/label.svg")).unwrap();

        let output = run(&ctx).unwrap();

        let sprite = fs::read_to_string(&output.sprite).unwrap();
        let partial = fs::read_to_string(&output.partial).unwrap();
        assert_eq!(sprite.matches("<symbol").count(), 2);
        assert!(!partial.contains(".svg-label"));
        assert!(!tmp.path().join("src/styles/global/_sprite.scss.tmp").exists());
    }

    #[test]
    fn broken_icon_is_skipped_and_reported() {
        let tmp = project();
        write(tmp.path(), "src/img/sprite/broken.svg", "<svg><g></svg>");

        let output = run(&context(tmp.path())).unwrap();

        assert_eq!(output.failures.len(), 1);
        assert!(output.failures[0].path.ends_with("broken.svg"));
        assert_eq!(output.ids.len(), 3);
    }

    #[test]
    fn size_parses_view_box() {
        let icon = SpriteIcon {
            id: "a".into(),
            name: "a".into(),
            markup: IconMarkup {
                view_box: Some("0,0, 32 20".into()),
                inner: String::new(),
            },
        };
        assert_eq!(icon.size(), Some((32.0, 20.0)));
    }
}
