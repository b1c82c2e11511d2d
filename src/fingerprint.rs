//! Content fingerprints for cache-busting asset URLs.
//!
//! Release templates call `asset("css/style.min.css")` and get back
//! `css/style.min.css?v=3f9a0c12`. The version is derived from the
//! *sources* of the registry entry whose output directory contains the
//! requested path, so it is known before any output has been written and
//! does not depend on task ordering.
//!
//! ## Version keys
//!
//! - SHA-256 over each source's relative path and contents, in path order.
//!   Content-based rather than mtime-based so it survives `git checkout`.
//! - Entries sharing an output directory (content images and their modern
//!   pass-through siblings) are hashed together.
//! - The first 8 hex characters are used, which is plenty to bust caches.

use crate::paths::{Category, PathRegistry};
use crate::sources::{self, SourceError, SourceFile};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Hex characters kept from the digest.
const VERSION_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sources(#[from] SourceError),
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Short version string over a set of source files.
pub fn hash_sources(files: &[SourceFile]) -> io::Result<String> {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.relative.to_string_lossy().as_bytes());
        hasher.update([0]);
        hasher.update(fs::read(&file.path)?);
    }
    let hex = format!("{:x}", hasher.finalize());
    Ok(hex[..VERSION_LEN].to_string())
}

/// Source-derived versions for every output directory in the tree.
#[derive(Debug, Clone, Default)]
pub struct AssetVersions {
    /// Output directory relative to the tree root (`css`, `img/sprite`) → version.
    by_dir: BTreeMap<String, String>,
}

impl AssetVersions {
    /// Hash the sources of every category that writes below the tree root.
    ///
    /// Templates are skipped: they write the pages that reference assets.
    pub fn compute(registry: &PathRegistry) -> Result<Self, FingerprintError> {
        let mut grouped: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
        for entry in registry.entries() {
            if entry.category == Category::Templates {
                continue;
            }
            let Ok(dir) = entry.output.strip_prefix(registry.tree()) else {
                continue;
            };
            let key = url_path(dir);
            grouped
                .entry(key)
                .or_default()
                .extend(sources::resolve(&entry.sources)?);
        }

        let mut by_dir = BTreeMap::new();
        for (dir, mut files) in grouped {
            files.sort_by(|a, b| a.path.cmp(&b.path));
            by_dir.insert(dir, hash_sources(&files)?);
        }
        Ok(Self { by_dir })
    }

    /// Version for an asset URL, matched by the longest output directory
    /// that contains it. Leading `/` is ignored.
    pub fn version_for(&self, path: &str) -> Option<&str> {
        let path = path.trim_start_matches('/');
        self.by_dir
            .iter()
            .filter(|(dir, _)| {
                path.strip_prefix(dir.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(dir, _)| dir.len())
            .map(|(_, version)| version.as_str())
    }

    /// Append `?v=<version>` when the path belongs to a known directory.
    /// A `#fragment` stays at the end.
    pub fn bust(&self, path: &str) -> String {
        let (base, fragment) = match path.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (path, None),
        };
        let Some(version) = self.version_for(base) else {
            return path.to_string();
        };
        let sep = if base.contains('?') { '&' } else { '?' };
        match fragment {
            Some(fragment) => format!("{base}{sep}v={version}#{fragment}"),
            None => format!("{base}{sep}v={version}"),
        }
    }
}

fn url_path(dir: &Path) -> String {
    dir.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
