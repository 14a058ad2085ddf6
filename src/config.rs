//! Startup configuration.
//!
//! Loads settings from config.json once at startup: the OCR engine location,
//! the reference dataset path, the screen regions to scan, and tuning values
//! for preprocessing, matching and the overlay window.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// A rectangle in absolute screen pixels.
///
/// Serialized as `[x, y, width, height]` to match the config file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32, u32, u32)", into = "(i32, i32, u32, u32)")]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<(i32, i32, u32, u32)> for ScreenRect {
    fn from((x, y, width, height): (i32, i32, u32, u32)) -> Self {
        Self { x, y, width, height }
    }
}

impl From<ScreenRect> for (i32, i32, u32, u32) {
    fn from(rect: ScreenRect) -> Self {
        (rect.x, rect.y, rect.width, rect.height)
    }
}

/// A named screen area polled for text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    #[serde(rename = "box")]
    pub rect: ScreenRect,
}

/// Overlay window placement and sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Background opacity (0.0 = invisible, 1.0 = solid)
    pub opacity: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            width: 1200.0,
            min_height: 300.0,
            max_height: 1000.0,
            opacity: 0.85,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the Tesseract executable
    #[serde(default)]
    pub tesseract_path: PathBuf,
    /// Optional tessdata directory passed to Tesseract
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
    /// Reference dataset (category → subcategory → code → options)
    #[serde(default = "default_reference_path")]
    pub reference_path: PathBuf,
    /// Regions scanned each cycle, in order
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
    /// Pause between scan cycles (milliseconds)
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Pause before the first scan cycle (milliseconds)
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Luminance above this becomes white after auto-contrast
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,
    /// Candidates scoring below this are discarded (0-100)
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    /// Maximum number of ranked candidates kept per match
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    /// Tesseract `--psm` value
    #[serde(default = "default_page_segmentation_mode")]
    pub page_segmentation_mode: u8,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

fn default_reference_path() -> PathBuf {
    PathBuf::from("results.json")
}

fn default_scan_interval_ms() -> u64 {
    1000
}

fn default_startup_delay_ms() -> u64 {
    1000
}

fn default_binarize_threshold() -> u8 {
    crate::ocr::preprocess::DEFAULT_THRESHOLD
}

fn default_min_score() -> u8 {
    70
}

fn default_candidate_limit() -> usize {
    5
}

fn default_page_segmentation_mode() -> u8 {
    6
}

impl AppConfig {
    /// Parses a config document and checks the fields startup depends on.
    ///
    /// `base_dir` is the directory the config was read from; a relative
    /// `reference_path` is resolved against it.
    pub fn from_json(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut config: AppConfig =
            serde_json::from_str(contents).context("Failed to parse config.json")?;

        if config.tesseract_path.as_os_str().is_empty() {
            bail!("Tesseract path not set in config.json");
        }

        if config.reference_path.is_relative() {
            config.reference_path = base_dir.join(&config.reference_path);
        }

        config.validate_regions()?;
        Ok(config)
    }

    fn validate_regions(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.name.as_str()) {
                bail!("Duplicate region name in config.json: {}", region.name);
            }
            if region.rect.width == 0 || region.rect.height == 0 {
                bail!("Region {} has an empty box", region.name);
            }
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

/// Loads configuration from the first config.json found.
fn load_config() -> Result<AppConfig> {
    let candidates = crate::paths::config_candidates();

    let Some(config_path) = candidates.iter().find(|p| p.exists()) else {
        return Err(anyhow!(
            "config.json not found (looked in: {})",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    };

    crate::log(&format!("Loading config from: {}", config_path.display()));

    let contents = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let config = AppConfig::from_json(&contents, base_dir)?;

    if config.regions.is_empty() {
        crate::log("Warning: no regions configured, the overlay will stay empty");
    }

    crate::log(&format!(
        "Config loaded: {} region(s), tesseract at {}",
        config.regions.len(),
        config.tesseract_path.display()
    ));

    Ok(config)
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() -> Result<()> {
    let config = load_config()?;
    let _ = CONFIG.set(config);
    Ok(())
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "tesseract_path": "C:\\Program Files\\Tesseract-OCR\\tesseract.exe",
            "reference_path": "data/results.json",
            "regions": [
                { "name": "Event", "box": [100, 200, 640, 48] },
                { "name": "Second", "box": [-1920, 0, 300, 40] }
            ],
            "scan_interval_ms": 500,
            "min_score": 80
        }"#;

        let config = AppConfig::from_json(json, Path::new("/opt/overlay")).unwrap();

        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.regions[0].name, "Event");
        assert_eq!(
            config.regions[0].rect,
            ScreenRect { x: 100, y: 200, width: 640, height: 48 }
        );
        assert_eq!(config.regions[1].rect.x, -1920);
        assert_eq!(config.scan_interval(), Duration::from_millis(500));
        assert_eq!(config.min_score, 80);
        assert_eq!(
            config.reference_path,
            Path::new("/opt/overlay").join("data/results.json")
        );
    }

    #[test]
    fn test_defaults_applied() {
        let json = r#"{ "tesseract_path": "tesseract", "regions": [] }"#;
        let config = AppConfig::from_json(json, Path::new(".")).unwrap();

        assert_eq!(config.scan_interval_ms, 1000);
        assert_eq!(config.binarize_threshold, 125);
        assert_eq!(config.min_score, 70);
        assert_eq!(config.candidate_limit, 5);
        assert_eq!(config.overlay.width, 1200.0);
        assert!(config.tessdata_dir.is_none());
        assert!(config.reference_path.ends_with("results.json"));
    }

    #[test]
    fn test_missing_tesseract_path_is_fatal() {
        let json = r#"{ "regions": [ { "name": "Event", "box": [0, 0, 10, 10] } ] }"#;
        let err = AppConfig::from_json(json, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Tesseract path"));

        let json = r#"{ "tesseract_path": "" }"#;
        assert!(AppConfig::from_json(json, Path::new(".")).is_err());
    }

    #[test]
    fn test_duplicate_region_names_rejected() {
        let json = r#"{
            "tesseract_path": "tesseract",
            "regions": [
                { "name": "Event", "box": [0, 0, 10, 10] },
                { "name": "Event", "box": [0, 20, 10, 10] }
            ]
        }"#;
        let err = AppConfig::from_json(json, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Duplicate region"));
    }

    #[test]
    fn test_empty_box_rejected() {
        let json = r#"{
            "tesseract_path": "tesseract",
            "regions": [ { "name": "Event", "box": [0, 0, 0, 10] } ]
        }"#;
        assert!(AppConfig::from_json(json, Path::new(".")).is_err());
    }

    #[test]
    fn test_absolute_reference_path_kept() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("results.json");
        let json = serde_json::json!({
            "tesseract_path": "tesseract",
            "reference_path": reference,
        })
        .to_string();

        let config = AppConfig::from_json(&json, Path::new("/elsewhere")).unwrap();
        assert_eq!(config.reference_path, reference);
    }
}
