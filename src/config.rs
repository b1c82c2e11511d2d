//! Project configuration module.
//!
//! Handles loading, validating, and merging `assets.toml`. Stock defaults
//! are overridden by an optional `assets.toml` in the project root; the file
//! is sparse, so it only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! source = "src"            # Source tree (templates, styles, js, img, fonts)
//! build = "build"           # Development output tree
//! dist = "dist"             # Release output tree
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [watch]
//! debounce_ms = 100
//!
//! [images]
//! jpeg_quality = 80         # 1-100
//! png_level = 5             # 0-7, optipng-style optimization level
//! avif_quality = 80         # 1-100, AVIF siblings of content images
//! avif_speed = 6            # 1-10, encoder speed (10 = fastest)
//!
//! [styles]
//! purge_content = []        # Extra globs scanned for class names in release
//! safelist = ["sm:flex-row", "hover:bg-orange-700"]
//!
//! [pipeline]
//! dev_scripts = true        # Compile scripts in the dev pipeline
//! dist_scripts = true       # Compile scripts in the release pipeline
//! cache_bust = true         # Append ?v=<hash> to asset() URLs in release
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the project configuration file, looked up in the project root.
pub const CONFIG_FILENAME: &str = "assets.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `assets.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Source and output tree locations, relative to the project root.
    pub paths: PathsConfig,
    /// Development server binding.
    pub server: ServerConfig,
    /// File watcher settings.
    pub watch: WatchConfig,
    /// Raster image encoding settings.
    pub images: ImagesConfig,
    /// Release stylesheet purification settings.
    pub styles: StylesConfig,
    /// Pipeline composition switches.
    pub pipeline: PipelineConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ProjectConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ConfigError::Validation(
                "images.jpeg_quality must be 1-100".into(),
            ));
        }
        if !(1..=100).contains(&self.images.avif_quality) {
            return Err(ConfigError::Validation(
                "images.avif_quality must be 1-100".into(),
            ));
        }
        if self.images.png_level > 7 {
            return Err(ConfigError::Validation(
                "images.png_level must be 0-7".into(),
            ));
        }
        if !(1..=10).contains(&self.images.avif_speed) {
            return Err(ConfigError::Validation(
                "images.avif_speed must be 1-10".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be non-zero".into(),
            ));
        }
        let paths = [
            &self.paths.source,
            &self.paths.build,
            &self.paths.dist,
        ];
        if paths.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "paths.source, paths.build and paths.dist must not be empty".into(),
            ));
        }
        if self.paths.build == self.paths.dist || self.paths.source == self.paths.dist {
            return Err(ConfigError::Validation(
                "paths.dist must differ from paths.source and paths.build".into(),
            ));
        }
        if self.paths.source == self.paths.build {
            return Err(ConfigError::Validation(
                "paths.build must differ from paths.source".into(),
            ));
        }
        Ok(())
    }
}

/// Source and output tree locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub source: String,
    pub build: String,
    pub dist: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "src".to_string(),
            build: "build".to_string(),
            dist: "dist".to_string(),
        }
    }
}

/// Development server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Events closer together than this are delivered as one batch.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

/// Raster image encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub jpeg_quality: u32,
    pub png_level: u8,
    pub avif_quality: u32,
    pub avif_speed: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            png_level: 5,
            avif_quality: 80,
            avif_speed: 6,
        }
    }
}

/// Release stylesheet purification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesConfig {
    /// Extra globs, relative to the project root, scanned for class names
    /// on top of the templates.
    pub purge_content: Vec<String>,
    /// Class names never removed by purification. These are only reachable
    /// through breakpoint/state variants that markup scanning cannot see.
    pub safelist: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            purge_content: Vec::new(),
            safelist: default_safelist(),
        }
    }
}

fn default_safelist() -> Vec<String> {
    [
        "skills2:w-1/2",
        "sm:flex-row",
        "sm:w-1/3",
        "sm:pr-8",
        "sm:py-8",
        "sm:w-2/3",
        "sm:pl-8",
        "sm:border-l",
        "sm:border-t-0",
        "sm:mt-0",
        "sm:text-left",
        "sm:text-3xl",
        "sm:mx-auto",
        "sm:mb-2",
        "sm:w-10/12",
        "md:w-1/2",
        "lg:w-4/6",
        "lg:w-3/4",
        "lg:w-4/5",
        "lg:w-1/3",
        "lg:w-1/2",
        "xl:w-1/3",
        "hover:text-orange-600",
        "hover:bg-orange-700",
        "hover:text-white",
        "active:bg-orange-900",
        "active:text-orange-800",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Pipeline composition switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub dev_scripts: bool,
    pub dist_scripts: bool,
    pub cache_bust: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dev_scripts: true,
            dist_scripts: true,
            cache_bust: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ProjectConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `assets.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ProjectConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config from `assets.toml` in `root`.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `assets.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# asset-forge configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Tree locations, relative to the project root
# ---------------------------------------------------------------------------
[paths]
# Source tree: templates/, styles/, js/, img/, fonts/
source = "src"
# Development output, served by the dev server
build = "build"
# Release output, cleaned and rebuilt by `asset-forge dist`
dist = "dist"

# ---------------------------------------------------------------------------
# Development server
# ---------------------------------------------------------------------------
[server]
host = "127.0.0.1"
port = 3000

# ---------------------------------------------------------------------------
# File watching
# ---------------------------------------------------------------------------
[watch]
# Changes closer together than this are handled as one rebuild.
debounce_ms = 100

# ---------------------------------------------------------------------------
# Raster images
# ---------------------------------------------------------------------------
[images]
# JPEG re-encoding quality (1 = worst, 100 = best).
jpeg_quality = 80
# PNG optimization level, 0 (fastest) to 7 (smallest).
png_level = 5
# Quality of the AVIF siblings written next to content images.
avif_quality = 80
# AVIF encoder speed, 1 (slowest, smallest) to 10 (fastest).
avif_speed = 6

# ---------------------------------------------------------------------------
# Release stylesheet purification
# ---------------------------------------------------------------------------
[styles]
# Extra globs scanned for class names, on top of the templates.
purge_content = []
# Class names that are always kept. Breakpoint and state variants that the
# markup never spells out literally belong here.
safelist = [
    "skills2:w-1/2",
    "sm:flex-row",
    "sm:w-1/3",
    "sm:pr-8",
    "sm:py-8",
    "sm:w-2/3",
    "sm:pl-8",
    "sm:border-l",
    "sm:border-t-0",
    "sm:mt-0",
    "sm:text-left",
    "sm:text-3xl",
    "sm:mx-auto",
    "sm:mb-2",
    "sm:w-10/12",
    "md:w-1/2",
    "lg:w-4/6",
    "lg:w-3/4",
    "lg:w-4/5",
    "lg:w-1/3",
    "lg:w-1/2",
    "xl:w-1/3",
    "hover:text-orange-600",
    "hover:bg-orange-700",
    "hover:text-white",
    "active:bg-orange-900",
    "active:text-orange-800",
]

# ---------------------------------------------------------------------------
# Pipeline composition
# ---------------------------------------------------------------------------
[pipeline]
# Include the script task in the development pipeline and watcher.
dev_scripts = true
# Include the script task in the release pipeline.
dist_scripts = true
# Append ?v=<content hash> to asset() URLs in release templates.
cache_bust = true

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers. Omit to use all CPU cores.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_paths() {
        let config = ProjectConfig::default();
        assert_eq!(config.paths.source, "src");
        assert_eq!(config.paths.build, "build");
        assert_eq!(config.paths.dist, "dist");
    }

    #[test]
    fn default_config_image_settings() {
        let config = ProjectConfig::default();
        assert_eq!(config.images.jpeg_quality, 80);
        assert_eq!(config.images.png_level, 5);
        assert_eq!(config.images.avif_quality, 80);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn default_safelist_is_trimmed() {
        let config = ProjectConfig::default();
        assert!(config.styles.safelist.contains(&"hover:text-white".to_string()));
        assert!(config.styles.safelist.iter().all(|s| s.trim() == s));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[server]
port = 8080
"#;
        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.images.jpeg_quality, 80);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[images]
quality = 80
"#;
        let result: Result<ProjectConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.build, "build");
    }

    #[test]
    fn load_config_merges_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[pipeline]\ndist_scripts = false\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert!(!config.pipeline.dist_scripts);
        assert!(config.pipeline.dev_scripts);
        assert!(config.pipeline.cache_bust);
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[server\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn validate_rejects_png_level_out_of_range() {
        let mut config = ProjectConfig::default();
        config.images.png_level = 8;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_quality() {
        let mut config = ProjectConfig::default();
        config.images.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_shared_output_tree() {
        let mut config = ProjectConfig::default();
        config.paths.dist = "build".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_validates_merged_result() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[images]\navif_speed = 0\n").unwrap();
        let result = resolve_config(base, Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[images]
jpeg_quality = 80
png_level = 5
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[images]
png_level = 2
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let images = merged.get("images").unwrap();
        assert_eq!(images.get("png_level").unwrap().as_integer(), Some(2));
        assert_eq!(images.get("jpeg_quality").unwrap().as_integer(), Some(80));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str(r#"safelist = ["a", "b"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"safelist = ["c"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("safelist").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ProjectConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ProjectConfig::default();
        assert_eq!(config.images.png_level, defaults.images.png_level);
        assert_eq!(config.styles.safelist, defaults.styles.safelist);
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.processing.max_processes, None);
        config.validate().unwrap();
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[paths]",
            "[server]",
            "[watch]",
            "[images]",
            "[styles]",
            "[pipeline]",
            "[processing]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
