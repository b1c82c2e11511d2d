//! Centralized filename conventions.
//!
//! Every source file name is interpreted the same way across tasks:
//!
//! - A leading underscore marks a **partial** (`_header.html`, `_mixins.scss`):
//!   included by other sources, never emitted on its own.
//! - Compiled stylesheets and scripts get a `.min` infix (`style.scss` →
//!   `style.min.css`) in both modes, so markup references stay stable
//!   whether or not the content is actually minified.
//! - Sprite symbols take their id from the icon file stem, restricted to
//!   characters that are safe in both `id` attributes and CSS class names.

use std::collections::HashSet;
use std::path::Path;

/// Whether a source file is a partial (leading underscore).
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Output file name with the `.min` infix: `("style", "css")` → `style.min.css`.
pub fn min_name(stem: &str, extension: &str) -> String {
    format!("{stem}.min.{extension}")
}

/// File stem as UTF-8, lossy for odd platform encodings.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sanitize an icon file stem into a symbol id.
///
/// - Characters outside `[A-Za-z0-9_-]` become `-`
/// - Runs of `-` collapse, leading/trailing `-` are dropped
/// - Ids that would not start with a letter get an `icon-` prefix
///
/// ```text
/// "arrow right"  → "arrow-right"
/// "Logo@2x"      → "Logo-2x"
/// "24-clock"     → "icon-24-clock"
/// ```
pub fn symbol_id(stem: &str) -> String {
    let mut id = String::with_capacity(stem.len());
    for c in stem.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && (id.is_empty() || id.ends_with('-')) {
            continue;
        }
        id.push(c);
    }
    while id.ends_with('-') {
        id.pop();
    }
    match id.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => id,
        Some(_) => format!("icon-{id}"),
        None => "icon".to_string(),
    }
}

/// Allocates unique symbol ids, suffixing `-2`, `-3`, ... on collisions.
#[derive(Debug, Default)]
pub struct SymbolIds {
    taken: HashSet<String>,
}

impl SymbolIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id for `stem`, returning the (possibly suffixed) id.
    pub fn allocate(&mut self, stem: &str) -> String {
        let base = symbol_id(stem);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
