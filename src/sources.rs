//! Source file discovery for a registry entry.
//!
//! Resolves a [`SourceSet`] into a sorted, de-duplicated list of files.
//! Each file keeps its path relative to the set's base directory so tasks
//! can mirror sub-directories into the output (`fonts/Inter/Inter.ttf` →
//! `fonts/Inter/Inter.woff2`).

use crate::paths::{SourceSet, absolute_glob};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid glob {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("Failed to read {0}")]
    Unreadable(String),
}

/// A file selected by a source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source set's base directory.
    pub relative: PathBuf,
}

impl SourceFile {
    /// Output location under `output_dir`, mirroring the relative path and
    /// swapping the file name.
    pub fn output_path(&self, output_dir: &Path, file_name: &str) -> PathBuf {
        match self.relative.parent() {
            Some(parent) => output_dir.join(parent).join(file_name),
            None => output_dir.join(file_name),
        }
    }

    /// Output location keeping the original file name.
    pub fn mirrored_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.relative)
    }
}

fn separator_aware() -> MatchOptions {
    MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    }
}

/// Resolve a source set to the files it selects, sorted by path.
///
/// A missing base directory selects nothing.
pub fn resolve(set: &SourceSet) -> Result<Vec<SourceFile>, SourceError> {
    let excludes = set
        .exclude
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| SourceError::Pattern {
                pattern: p.to_string(),
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut found = BTreeMap::new();
    for pattern in &set.include {
        let full = absolute_glob(&set.base, pattern);
        let paths = glob::glob_with(&full, separator_aware()).map_err(|e| {
            SourceError::Pattern {
                pattern: full.clone(),
                message: e.to_string(),
            }
        })?;
        for entry in paths {
            let path = entry.map_err(|e| SourceError::Unreadable(e.to_string()))?;
            if !path.is_file() {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&set.base).map(Path::to_path_buf) else {
                continue;
            };
            let file_name = relative
                .file_name()
                .map(Path::new)
                .unwrap_or(relative.as_path());
            let excluded = excludes.iter().any(|ex| {
                ex.matches_path_with(&relative, separator_aware())
                    || ex.matches_path_with(file_name, separator_aware())
            });
            if !excluded {
                found.insert(path.clone(), SourceFile { path, relative });
            }
        }
    }
    Ok(found.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn set(base: &Path, include: &[&'static str], exclude: &[&'static str]) -> SourceSet {
        SourceSet {
            base: base.to_path_buf(),
            include: include.to_vec(),
            exclude: exclude.to_vec(),
        }
    }

    #[test]
    fn resolves_sorted_and_excludes_partials() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("templates");
        touch(&base.join("index.html"));
        touch(&base.join("about.html"));
        touch(&base.join("_layout.html"));
        touch(&base.join("notes.txt"));

        let files = resolve(&set(&base, &["*.html"], &["_*"])).unwrap();

        let names: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(names, vec![PathBuf::from("about.html"), PathBuf::from("index.html")]);
    }

    #[test]
    fn single_star_does_not_descend() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("js");
        touch(&base.join("script.js"));
        touch(&base.join("vendor/lib.js"));

        let files = resolve(&set(&base, &["*.js"], &[])).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn double_star_keeps_relative_directories() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("fonts");
        touch(&base.join("Inter/Inter.ttf"));
        touch(&base.join("Mono.ttf"));

        let files = resolve(&set(&base, &["**/*.ttf"], &[])).unwrap();

        let rel: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("Inter/Inter.ttf"), PathBuf::from("Mono.ttf")]);
        assert_eq!(
            files[0].output_path(Path::new("/out"), "Inter.woff"),
            PathBuf::from("/out/Inter/Inter.woff")
        );
    }

    #[test]
    fn overlapping_patterns_are_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("img");
        touch(&base.join("a.jpg"));

        let files = resolve(&set(&base, &["*.jpg", "a.*"], &[])).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_base_selects_nothing() {
        let tmp = TempDir::new().unwrap();
        let files = resolve(&set(&tmp.path().join("missing"), &["*.svg"], &[])).unwrap();
        assert!(files.is_empty());
    }
}
