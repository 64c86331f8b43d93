use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context;
use dirs::home_dir;
use log::error;
use serde::{Deserialize, Serialize};

use crate::{
  map::{classify::Palette, coordinates::LatLngBounds},
  viz::{heatmap::HeatLayerOptions, popup::PopupLabels},
};

/// How region statistics are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
  /// Regions filled by palette bucket.
  #[default]
  Choropleth,
  /// One weighted point per region, blended into a heat layer.
  Heatmap,
}

impl RenderMode {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      RenderMode::Choropleth => "Choropleth",
      RenderMode::Heatmap => "Heatmap",
    }
  }

  #[must_use]
  pub fn all() -> &'static [RenderMode] {
    &[RenderMode::Choropleth, RenderMode::Heatmap]
  }
}

/// A named boundary document, a URL or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySource {
  pub name: String,
  pub location: String,
}

/// Inclusive range of selectable years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
  pub first: i32,
  pub last: i32,
}

impl Default for YearRange {
  fn default() -> Self {
    Self {
      first: 2020,
      last: 2024,
    }
  }
}

impl YearRange {
  #[must_use]
  pub fn contains(&self, year: i32) -> bool {
    (self.first..=self.last).contains(&year)
  }

  pub fn iter(&self) -> impl Iterator<Item = i32> {
    self.first..=self.last
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
  /// `[lat, lng]`
  pub center: [f64; 2],
  pub zoom: u8,
  pub min_zoom: u8,
  pub max_zoom: u8,
  pub max_bounds: LatLngBounds,
}

impl Default for ViewportConfig {
  fn default() -> Self {
    Self {
      center: [65., 150.],
      zoom: 3,
      min_zoom: 2,
      max_zoom: 18,
      max_bounds: LatLngBounds::default(),
    }
  }
}

/// Sizes and output location of the raster backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
  pub width: u32,
  pub height: u32,
  pub chart_width: u32,
  pub chart_height: u32,
  pub ring_size: u32,
  pub output_dir: PathBuf,
}

impl Default for RasterConfig {
  fn default() -> Self {
    Self {
      width: 1600,
      height: 900,
      chart_width: 480,
      chart_height: 240,
      ring_size: 240,
      output_dir: PathBuf::from("choromap-out"),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  /// Location of the statistics table.
  pub statistics: String,
  pub boundaries: Vec<BoundarySource>,
  pub years: YearRange,
  pub default_year: i32,
  pub mode: RenderMode,
  pub palette: Palette,
  pub heat_layer: HeatLayerOptions,
  pub labels: PopupLabels,
  pub viewport: ViewportConfig,
  pub raster: RasterConfig,
  /// Per-request timeout for remote sources. Requests wait forever when unset.
  pub fetch_timeout_secs: Option<u64>,
}

impl Config {
  /// Environment over config file over defaults.
  #[must_use]
  pub fn new() -> Self {
    let config_path = Self::config_dir();
    let from_file = config_path.as_deref().and_then(Self::from_file);
    let file_found = from_file.is_some();

    let mut merged = from_file.unwrap_or_default();
    merged.config_path = config_path;
    merged.apply_env();

    if !file_found {
      merged.init_cfg_file();
    }
    merged
  }

  /// Reads an explicit config file, environment overrides still apply.
  ///
  /// # Errors
  /// If the file cannot be read or parsed.
  pub fn load_from(path: &Path) -> anyhow::Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let mut config: Self = serde_json::from_str(&content)
      .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config.config_path = path.parent().map(Path::to_path_buf);
    config.apply_env();
    Ok(config)
  }

  #[must_use]
  pub fn fetch_timeout(&self) -> Option<Duration> {
    self.fetch_timeout_secs.map(Duration::from_secs)
  }

  fn config_dir() -> Option<PathBuf> {
    std::env::var("CHOROMAP_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("choromap")))
  }

  fn apply_env(&mut self) {
    if let Ok(statistics) = std::env::var("CHOROMAP_STATISTICS") {
      self.statistics = statistics;
    }
  }

  fn from_file(config_dir: &Path) -> Option<Self> {
    let config_path = config_dir.join("config.json");
    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()
  }

  fn init_cfg_file(&self) {
    let Some(path) = &self.config_path else {
      return;
    };
    if !path.exists() {
      let _ = std::fs::create_dir_all(path).inspect_err(|e| {
        error!("Failed to create config directory: {e}");
      });
    }

    let path = path.join("config.json");
    if path.exists() {
      return;
    }
    match serde_json::to_string_pretty(self) {
      Ok(config) => {
        let _ = std::fs::write(path, config).inspect_err(|e| {
          error!("Failed to write config file: {e}");
        });
      }
      Err(e) => error!("Failed to serialize config: {e}"),
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    let source = |name: &str, file: &str| BoundarySource {
      name: name.to_string(),
      location: format!("data/{file}"),
    };
    Self {
      config_path: None,
      statistics: "data/regions.json".to_string(),
      boundaries: vec![
        source("russia_regions", "russia_regions.geojson"),
        source("new_regions", "new_regions.geojson"),
      ],
      years: YearRange::default(),
      default_year: 2020,
      mode: RenderMode::default(),
      palette: Palette::default(),
      heat_layer: HeatLayerOptions::default(),
      labels: PopupLabels::default(),
      viewport: ViewportConfig::default(),
      raster: RasterConfig::default(),
      fetch_timeout_secs: None,
    }
  }
}
