use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
  binder::{BoundRegion, RegionId},
  map::color::Rgba,
};

#[derive(Debug, Error)]
pub enum ChartError {
  #[error("canvas {0} is not available")]
  MissingCanvas(String),
  #[error("failed to draw {canvas}: {message}")]
  Draw { canvas: String, message: String },
}

/// Time series of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChartSpec {
  pub canvas: String,
  /// Years, ascending.
  pub labels: Vec<i32>,
  pub values: Vec<f64>,
  pub border_color: Rgba,
  pub border_width: f32,
  pub tension: f32,
}

impl LineChartSpec {
  #[must_use]
  pub fn for_region(region: &BoundRegion) -> Self {
    let (labels, values): (Vec<i32>, Vec<f64>) = region
      .record
      .as_ref()
      .map(|record| (record.years().collect(), record.percentages().collect()))
      .unwrap_or_default();
    Self {
      canvas: region.chart_element(),
      labels,
      values,
      border_color: Rgba::rgb(0x22, 0xcc, 0x69),
      border_width: 2.,
      tension: 0.3,
    }
  }

  /// Only the first and the last year get an x-axis label.
  #[must_use]
  pub fn tick_label(&self, index: usize) -> Option<String> {
    let last = self.labels.len().checked_sub(1)?;
    (index == 0 || index == last).then(|| self.labels[index].to_string())
  }
}

/// Share of the current year against the remainder to 100.
#[derive(Debug, Clone, PartialEq)]
pub struct RingChartSpec {
  pub canvas: String,
  pub data: [f64; 2],
  /// Stops of the value arc.
  pub gradient: Vec<(f32, Rgba)>,
  pub remainder: Rgba,
  /// Inner radius relative to the outer one.
  pub cutout: f32,
}

impl RingChartSpec {
  #[must_use]
  pub fn for_region(region: &BoundRegion, year: i32) -> Self {
    Self {
      canvas: region.ring_element(),
      data: ring_data(region.percentage(year)),
      gradient: vec![
        (0., Rgba::rgb(0x22, 0xcc, 0xb4)),
        (0.5, Rgba::rgb(0x56, 0xf5, 0x60)),
        (1., Rgba::rgb(0xe7, 0xff, 0x4e)),
      ],
      remainder: Rgba::rgb(0xe5, 0xe5, 0xe5),
      cutout: 0.7,
    }
  }
}

/// `[value, 100 - value]`, a missing value draws an empty ring.
#[must_use]
pub fn ring_data(percentage: Option<f64>) -> [f64; 2] {
  let value = percentage.unwrap_or(0.);
  [value, (100. - value).max(0.)]
}

/// A chart drawn on a popup canvas.
pub trait ChartWidget {
  type Data;

  /// Replaces the data, visible after the next [`ChartWidget::update`].
  fn set_data(&mut self, data: Self::Data);

  /// Redraws with the current data.
  ///
  /// # Errors
  /// If the widget cannot be drawn.
  fn update(&mut self) -> Result<(), ChartError>;

  fn destroy(self);
}

/// Builds the chart widgets of a popup.
pub trait ChartFactory {
  type Line: ChartWidget<Data = Vec<f64>>;
  type Ring: ChartWidget<Data = [f64; 2]>;

  /// # Errors
  /// If the widget cannot be created on its canvas.
  fn line_chart(&mut self, spec: LineChartSpec) -> Result<Self::Line, ChartError>;

  /// # Errors
  /// If the widget cannot be created on its canvas.
  fn ring_chart(&mut self, spec: RingChartSpec) -> Result<Self::Ring, ChartError>;
}

struct ChartPair<F: ChartFactory> {
  line: F::Line,
  ring: F::Ring,
}

/// Owns the live chart widgets, at most one pair per region.
pub struct ChartLifecycle<F: ChartFactory> {
  factory: F,
  pairs: BTreeMap<RegionId, ChartPair<F>>,
}

impl<F: ChartFactory> ChartLifecycle<F> {
  pub fn new(factory: F) -> Self {
    Self {
      factory,
      pairs: BTreeMap::new(),
    }
  }

  pub fn factory(&self) -> &F {
    &self.factory
  }

  /// Creates the ring and the line widget of `region`, replacing a pair that is still alive.
  /// Regions without a record get no widgets.
  ///
  /// # Errors
  /// If a widget cannot be created. No widget of the region is alive afterwards.
  pub fn attach(&mut self, region: &BoundRegion, year: i32) -> Result<(), ChartError> {
    self.detach(region.id);
    if !region.has_record() {
      log::debug!("No charts for {} without statistics", region.name);
      return Ok(());
    }

    let ring = self
      .factory
      .ring_chart(RingChartSpec::for_region(region, year))?;
    let line = match self.factory.line_chart(LineChartSpec::for_region(region)) {
      Ok(line) => line,
      Err(e) => {
        ring.destroy();
        return Err(e);
      }
    };
    self.pairs.insert(region.id, ChartPair { line, ring });
    Ok(())
  }

  /// Destroys the widgets of `region`. Does nothing when there are none.
  pub fn detach(&mut self, region: RegionId) {
    if let Some(pair) = self.pairs.remove(&region) {
      pair.line.destroy();
      pair.ring.destroy();
    }
  }

  /// Feeds `year` into the live widgets of `region` and redraws them in place.
  ///
  /// # Errors
  /// If a widget fails to redraw.
  pub fn update(&mut self, region: &BoundRegion, year: i32) -> Result<(), ChartError> {
    let Some(pair) = self.pairs.get_mut(&region.id) else {
      return Ok(());
    };
    pair.line.set_data(LineChartSpec::for_region(region).values);
    pair.line.update()?;
    pair.ring.set_data(ring_data(region.percentage(year)));
    pair.ring.update()
  }

  #[must_use]
  pub fn is_attached(&self, region: RegionId) -> bool {
    self.pairs.contains_key(&region)
  }

  /// Number of regions with live widgets.
  #[must_use]
  pub fn live_pairs(&self) -> usize {
    self.pairs.len()
  }
}
