use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::binder::BoundRegion;

/// Fixed texts of the region popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupLabels {
  pub year: String,
  pub value: String,
  /// Followed by the selected year in parentheses.
  pub ring_title: String,
  pub line_title: String,
  pub no_data: String,
  /// Shown instead of a value when the selected year has none.
  pub placeholder: String,
}

impl Default for PopupLabels {
  fn default() -> Self {
    Self {
      year: "Год:".to_string(),
      value: "ШПД:".to_string(),
      ring_title: "Распространение ШПД".to_string(),
      line_title: "Динамика по годам".to_string(),
      no_data: "Данные отсутствуют".to_string(),
      placeholder: "—".to_string(),
    }
  }
}

impl PopupLabels {
  #[must_use]
  pub fn ring_title(&self, year: i32) -> String {
    format!("{} ({year})", self.ring_title)
  }

  /// `"60%"`, or the placeholder when there is no value.
  #[must_use]
  pub fn format_value(&self, percentage: Option<f64>) -> String {
    percentage.map_or_else(|| self.placeholder.clone(), |p| format!("{p}%"))
  }
}

/// Popup of a region with statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsPopup {
  pub title: String,
  pub info_element: String,
  pub year_label: String,
  pub year: i32,
  pub value_label: String,
  pub value: String,
  pub ring_title_element: String,
  pub ring_title: String,
  pub ring_element: String,
  pub line_title: String,
  pub chart_element: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupView {
  NoData { title: String, message: String },
  Stats(StatsPopup),
}

impl PopupView {
  #[must_use]
  pub fn build(region: &BoundRegion, year: i32, labels: &PopupLabels) -> Self {
    if !region.has_record() {
      return PopupView::NoData {
        title: region.name.clone(),
        message: labels.no_data.clone(),
      };
    }
    PopupView::Stats(StatsPopup {
      title: region.title().to_string(),
      info_element: region.info_element(),
      year_label: labels.year.clone(),
      year,
      value_label: labels.value.clone(),
      value: labels.format_value(region.percentage(year)),
      ring_title_element: region.ring_title_element(),
      ring_title: labels.ring_title(year),
      ring_element: region.ring_element(),
      line_title: labels.line_title.clone(),
      chart_element: region.chart_element(),
    })
  }

  #[must_use]
  pub fn title(&self) -> &str {
    match self {
      PopupView::NoData { title, .. } => title,
      PopupView::Stats(stats) => &stats.title,
    }
  }

  /// Value text of the info block, `None` for the no-data popup.
  #[must_use]
  pub fn value(&self) -> Option<&str> {
    match self {
      PopupView::NoData { .. } => None,
      PopupView::Stats(stats) => Some(&stats.value),
    }
  }
}

impl Display for PopupView {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PopupView::NoData { title, message } => write!(f, "{title}\n{message}"),
      PopupView::Stats(stats) => {
        writeln!(f, "{}", stats.title)?;
        writeln!(f, "{} {}", stats.year_label, stats.year)?;
        writeln!(f, "{} {}", stats.value_label, stats.value)?;
        writeln!(f, "{} [{}]", stats.ring_title, stats.ring_element)?;
        write!(f, "{} [{}]", stats.line_title, stats.chart_element)
      }
    }
  }
}
