//! Path registry: where every asset category is read from and written to.
//!
//! The registry is pure configuration. It is built once per invocation from
//! the project root, the `[paths]` config section and the build [`Mode`],
//! and never mutated afterwards.
//!
//! ```text
//! src/                                   build/ or dist/
//! ├── templates/*.html  (not _*.html)  → *.html
//! ├── styles/style.scss                → css/style.min.css
//! ├── js/*.js                          → js/*.min.js
//! ├── img/background_img/*.{jpg,png}   → img/background_img/
//! ├── img/content_img/*.{jpg,png}      → img/content_img/ (+ .avif siblings)
//! ├── img/content_img/*.{webp,avif}    → img/content_img/ (copied)
//! ├── img/background_svg/*.svg         → img/background_svg/
//! ├── img/content_svg/*.svg            → img/content_svg/
//! ├── img/sprite/*.svg                 → img/sprite/sprite.svg
//! │                                      + src/styles/global/_sprite.scss
//! ├── fonts/**/*.ttf                   → fonts/**/*.{woff,woff2}
//! └── fonts/**/*.{woff,woff2}          → fonts/** (copied)
//! ```

use crate::clean::CleanTarget;
use crate::config::PathsConfig;
use crate::task::Mode;
use std::path::{Path, PathBuf};

/// Logical asset categories, one registry entry each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Templates,
    Styles,
    Scripts,
    BackgroundImages,
    ContentImages,
    ContentModernImages,
    BackgroundVectors,
    ContentVectors,
    SpriteIcons,
    LegacyFonts,
    WebFonts,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Templates,
        Category::Styles,
        Category::Scripts,
        Category::BackgroundImages,
        Category::ContentImages,
        Category::ContentModernImages,
        Category::BackgroundVectors,
        Category::ContentVectors,
        Category::SpriteIcons,
        Category::LegacyFonts,
        Category::WebFonts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Templates => "templates",
            Category::Styles => "styles",
            Category::Scripts => "scripts",
            Category::BackgroundImages => "background images",
            Category::ContentImages => "content images",
            Category::ContentModernImages => "content images (modern)",
            Category::BackgroundVectors => "background svg",
            Category::ContentVectors => "content svg",
            Category::SpriteIcons => "sprite icons",
            Category::LegacyFonts => "ttf fonts",
            Category::WebFonts => "web fonts",
        }
    }

    /// Source directory, relative to the source tree.
    fn source_base(self) -> &'static str {
        match self {
            Category::Templates => "templates",
            Category::Styles => "styles",
            Category::Scripts => "js",
            Category::BackgroundImages => "img/background_img",
            Category::ContentImages | Category::ContentModernImages => "img/content_img",
            Category::BackgroundVectors => "img/background_svg",
            Category::ContentVectors => "img/content_svg",
            Category::SpriteIcons => "img/sprite",
            Category::LegacyFonts | Category::WebFonts => "fonts",
        }
    }

    fn include(self) -> &'static [&'static str] {
        match self {
            Category::Templates => &["*.html"],
            Category::Styles => &["style.scss"],
            Category::Scripts => &["*.js"],
            Category::BackgroundImages | Category::ContentImages => {
                &["*.jpg", "*.jpeg", "*.png"]
            }
            Category::ContentModernImages => &["*.webp", "*.avif"],
            Category::BackgroundVectors | Category::ContentVectors | Category::SpriteIcons => {
                &["*.svg"]
            }
            Category::LegacyFonts => &["**/*.ttf"],
            Category::WebFonts => &["**/*.woff", "**/*.woff2"],
        }
    }

    fn exclude(self) -> &'static [&'static str] {
        match self {
            Category::Templates => &["_*"],
            _ => &[],
        }
    }

    /// Output directory, relative to the output tree.
    fn output_subdir(self) -> &'static str {
        match self {
            Category::Templates => "",
            Category::Styles => "css",
            Category::Scripts => "js",
            Category::BackgroundImages => "img/background_img",
            Category::ContentImages | Category::ContentModernImages => "img/content_img",
            Category::BackgroundVectors => "img/background_svg",
            Category::ContentVectors => "img/content_svg",
            Category::SpriteIcons => "img/sprite",
            Category::LegacyFonts | Category::WebFonts => "fonts",
        }
    }

    /// Glob (relative to the source base) whose changes re-run this
    /// category in watch mode. Only the categories the dev pipeline builds
    /// are watched.
    fn watch_pattern(self) -> Option<&'static str> {
        match self {
            Category::Templates => Some("**/*.html"),
            Category::Styles => Some("**/*.scss"),
            Category::Scripts => Some("**/*.js"),
            _ => None,
        }
    }
}

/// The files a category reads: glob patterns relative to one base directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSet {
    pub base: PathBuf,
    pub include: Vec<&'static str>,
    pub exclude: Vec<&'static str>,
}

/// One category's source set and output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub category: Category,
    pub sources: SourceSet,
    pub output: PathBuf,
}

/// All registry entries for one project and one mode.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    root: PathBuf,
    source: PathBuf,
    tree: PathBuf,
    entries: Vec<RegistryEntry>,
}

impl PathRegistry {
    pub fn new(root: &Path, paths: &PathsConfig, mode: Mode) -> Self {
        let source = root.join(&paths.source);
        let tree = match mode {
            Mode::Development => root.join(&paths.build),
            Mode::Release => root.join(&paths.dist),
        };
        let entries = Category::ALL
            .iter()
            .map(|&category| RegistryEntry {
                category,
                sources: SourceSet {
                    base: source.join(category.source_base()),
                    include: category.include().to_vec(),
                    exclude: category.exclude().to_vec(),
                },
                output: join_subdir(&tree, category.output_subdir()),
            })
            .collect();
        Self {
            root: root.to_path_buf(),
            source,
            tree,
            entries,
        }
    }

    pub fn entry(&self, category: Category) -> &RegistryEntry {
        // Entries are built in `Category::ALL` order, which is declaration order.
        &self.entries[category as usize]
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> &Path {
        &self.source
    }

    /// Output tree for this mode (`build/` or `dist/`).
    pub fn tree(&self) -> &Path {
        &self.tree
    }

    /// Generated stylesheet partial. Lives in the *source* tree so
    /// hand-written styles can import it.
    pub fn sprite_partial(&self) -> PathBuf {
        self.source.join("styles/global/_sprite.scss")
    }

    /// Template the sprite partial is rendered from, when present.
    pub fn sprite_template(&self) -> PathBuf {
        self.source.join("styles/templates/_sprite_template.scss")
    }

    /// Absolute watch glob for a category, if it is watched.
    pub fn watch_glob(&self, category: Category) -> Option<String> {
        let pattern = category.watch_pattern()?;
        Some(absolute_glob(&self.entry(category).sources.base, pattern))
    }

    /// What to purge before rebuilding a category.
    ///
    /// Templates write into the tree root, which also holds every other
    /// category's directory, so only `*.html` files are removed there.
    pub fn clean_target(&self, category: Category) -> CleanTarget {
        let output = self.entry(category).output.clone();
        match category {
            Category::Templates => CleanTarget::matching(output, "*.html"),
            _ => CleanTarget::all(output),
        }
    }

    /// Purge the whole output tree.
    pub fn tree_clean_target(&self) -> CleanTarget {
        CleanTarget::all(self.tree.clone())
    }
}

fn join_subdir(tree: &Path, subdir: &str) -> PathBuf {
    if subdir.is_empty() {
        tree.to_path_buf()
    } else {
        tree.join(subdir)
    }
}

/// Join a literal directory and a glob pattern, escaping the directory part
/// so characters like `[` in the project path are not read as wildcards.
pub fn absolute_glob(base: &Path, pattern: &str) -> String {
    let escaped = glob::Pattern::escape(&base.to_string_lossy());
    format!("{}/{}", escaped.trim_end_matches('/'), pattern)
}
