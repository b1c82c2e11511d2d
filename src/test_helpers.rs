//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_project();
//! let ctx = release_context(tmp.path());
//! let report = pipeline::run(PipelineName::Dist, &ctx, None).unwrap();
//! assert_written(tmp.path(), &["dist/css/style.min.css"]);
//! ```

use crate::config;
use crate::task::{BuildContext, Mode};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Contexts
// =========================================================================

/// Context for `root` with its `assets.toml` applied.
pub fn context(root: &Path, mode: Mode) -> BuildContext {
    let config = config::load_config(root).unwrap();
    BuildContext::new(root, config, mode)
}

pub fn dev_context(root: &Path) -> BuildContext {
    context(root, Mode::Development)
}

pub fn release_context(root: &Path) -> BuildContext {
    context(root, Mode::Release)
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert that every path (relative to `root`) exists as a file.
pub fn assert_written(root: &Path, paths: &[&str]) {
    let missing: Vec<&str> = paths
        .iter()
        .copied()
        .filter(|p| !root.join(p).is_file())
        .collect();
    assert!(missing.is_empty(), "missing outputs: {missing:?}");
}

/// Read an output file as UTF-8. Panics with the path on failure.
pub fn read(root: &Path, path: &str) -> String {
    std::fs::read_to_string(root.join(path))
        .unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}
