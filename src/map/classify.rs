use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::color::Rgba;

#[derive(Debug, Error, PartialEq)]
pub enum PaletteError {
  #[error("palette needs {expected} colors for {thresholds} thresholds, got {actual}")]
  ColorCount {
    thresholds: usize,
    expected: usize,
    actual: usize,
  },
  #[error("palette thresholds must be strictly ascending, {previous} is followed by {next}")]
  Unsorted { previous: f64, next: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPalette {
  thresholds: Vec<f64>,
  colors: Vec<Rgba>,
}

/// Ascending thresholds splitting `[0, 100]` into buckets, one color per bucket.
///
/// Bucket `i < thresholds.len()` holds values strictly below `thresholds[i]` that did not fit
/// an earlier bucket, the last bucket holds everything from the last threshold up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPalette", into = "RawPalette")]
pub struct Palette {
  thresholds: Vec<f64>,
  colors: Vec<Rgba>,
}

impl TryFrom<RawPalette> for Palette {
  type Error = PaletteError;

  fn try_from(raw: RawPalette) -> Result<Self, Self::Error> {
    Self::new(raw.thresholds, raw.colors)
  }
}

impl From<Palette> for RawPalette {
  fn from(palette: Palette) -> Self {
    Self {
      thresholds: palette.thresholds,
      colors: palette.colors,
    }
  }
}

impl Palette {
  /// # Errors
  /// If there is not exactly one more color than thresholds or the thresholds are not
  /// strictly ascending.
  pub fn new(thresholds: Vec<f64>, colors: Vec<Rgba>) -> Result<Self, PaletteError> {
    if colors.len() != thresholds.len() + 1 {
      return Err(PaletteError::ColorCount {
        thresholds: thresholds.len(),
        expected: thresholds.len() + 1,
        actual: colors.len(),
      });
    }
    if let Some(pair) = thresholds.windows(2).find(|pair| pair[0] >= pair[1]) {
      return Err(PaletteError::Unsorted {
        previous: pair[0],
        next: pair[1],
      });
    }
    Ok(Self { thresholds, colors })
  }

  #[must_use]
  pub fn thresholds(&self) -> &[f64] {
    &self.thresholds
  }

  #[must_use]
  pub fn colors(&self) -> &[Rgba] {
    &self.colors
  }

  /// Index of the bucket `percentage` falls into. Values outside `[0, 100]` land in the
  /// outer buckets.
  #[must_use]
  pub fn bucket(&self, percentage: f64) -> usize {
    self
      .thresholds
      .iter()
      .position(|&threshold| percentage < threshold)
      .unwrap_or(self.thresholds.len())
  }

  #[must_use]
  pub fn classify(&self, percentage: f64) -> Rgba {
    self.colors[self.bucket(percentage)]
  }
}

impl Default for Palette {
  /// Light to dark green broadband penetration scale.
  fn default() -> Self {
    Self {
      thresholds: vec![60., 70., 75., 80., 85., 90., 95.],
      colors: vec![
        Rgba::rgb(212, 255, 100),
        Rgba::rgb(136, 255, 100),
        Rgba::rgb(86, 245, 96),
        Rgba::rgb(45, 218, 105),
        Rgba::rgb(12, 170, 78),
        Rgba::rgb(3, 138, 59),
        Rgba::rgb(0, 92, 54),
        Rgba::rgb(2, 68, 40),
      ],
    }
  }
}
