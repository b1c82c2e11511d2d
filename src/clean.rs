//! Output directory cleaning.
//!
//! A clean step deletes the *contents* of a directory (the directory itself
//! stays, so servers and watchers holding it keep working). A target can be
//! narrowed to top-level files whose name matches a glob, which is how the
//! tree root is cleaned of stale HTML without touching `css/`, `img/`, etc.
//!
//! Failures here are fatal to the pipeline that scheduled the clean: every
//! later write assumes an empty target.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Failed to clean {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid clean pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("Refusing to clean {0}: not a directory")]
    NotADirectory(PathBuf),
}

/// A directory whose contents are purged before a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTarget {
    pub dir: PathBuf,
    /// When set, only top-level files whose name matches this glob are removed.
    pub only: Option<String>,
}

impl CleanTarget {
    pub fn all(dir: PathBuf) -> Self {
        Self { dir, only: None }
    }

    pub fn matching(dir: PathBuf, pattern: &str) -> Self {
        Self {
            dir,
            only: Some(pattern.to_string()),
        }
    }

    /// Whether cleaning this target can delete files written into `dir`.
    pub fn covers(&self, dir: &Path) -> bool {
        match self.only {
            None => dir.starts_with(&self.dir),
            Some(_) => dir == self.dir,
        }
    }
}

/// What a clean step removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub dir: PathBuf,
    pub removed_files: usize,
}

/// Delete the contents of one target. A missing directory is already clean.
pub fn clean(target: &CleanTarget) -> Result<CleanReport, CleanError> {
    let dir = &target.dir;
    let io_err = |source: io::Error| CleanError::Io {
        path: dir.clone(),
        source,
    };

    match fs::metadata(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(CleanReport {
                dir: dir.clone(),
                removed_files: 0,
            });
        }
        Err(e) => return Err(io_err(e)),
        Ok(meta) if !meta.is_dir() => return Err(CleanError::NotADirectory(dir.clone())),
        Ok(_) => {}
    }

    let removed_files = match &target.only {
        Some(pattern) => remove_matching(dir, pattern)?,
        None => remove_contents(dir)?,
    };
    Ok(CleanReport {
        dir: dir.clone(),
        removed_files,
    })
}

fn remove_matching(dir: &Path, pattern: &str) -> Result<usize, CleanError> {
    let matcher = glob::Pattern::new(pattern).map_err(|e| CleanError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|source| CleanError::Io {
        path: dir.to_path_buf(),
        source,
    })? {
        let entry = entry.map_err(|source| CleanError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && matcher.matches(&entry.file_name().to_string_lossy()) {
            fs::remove_file(&path).map_err(|source| CleanError::Io { path, source })?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_contents(dir: &Path) -> Result<usize, CleanError> {
    let mut removed = 0;
    // contents_first: children are yielded before their parent directory.
    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| CleanError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
            source: e.into(),
        })?;
        let path = entry.path();
        let result = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            removed += 1;
            fs::remove_file(path)
        };
        result.map_err(|source| CleanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(removed)
}
