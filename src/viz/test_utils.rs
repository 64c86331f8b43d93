use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{binder::RegionId, map::geometry_collection::Style};

use super::{
  charts::{ChartError, ChartFactory, ChartWidget, LineChartSpec, RingChartSpec},
  heatmap::HeatLayer,
  popup::PopupView,
  surface::MapSurface,
};

/// Remembers the latest state the visualizer pushed.
#[derive(Debug, Default)]
pub struct RecordingSurface {
  pub styles: BTreeMap<RegionId, Style>,
  pub open_popups: BTreeMap<RegionId, PopupView>,
  pub heat_layer: Option<HeatLayer>,
  pub heat_layer_sets: usize,
  pub year_label: Option<String>,
}

impl MapSurface for RecordingSurface {
  fn set_style(&mut self, region: RegionId, style: Style) {
    self.styles.insert(region, style);
  }

  fn open_popup(&mut self, region: RegionId, popup: &PopupView) {
    self.open_popups.insert(region, popup.clone());
  }

  fn close_popup(&mut self, region: RegionId) {
    self.open_popups.remove(&region);
  }

  fn set_heat_layer(&mut self, layer: Option<&HeatLayer>) {
    self.heat_layer = layer.cloned();
    self.heat_layer_sets += 1;
  }

  fn set_year_label(&mut self, label: &str) {
    self.year_label = Some(label.to_string());
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
  Line,
  Ring,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChartLog {
  pub live_lines: usize,
  pub live_rings: usize,
  pub created_lines: usize,
  pub created_rings: usize,
  pub destroyed: usize,
  pub updates: usize,
  pub last_line: Option<Vec<f64>>,
  pub last_ring: Option<[f64; 2]>,
  /// Canvases in creation order.
  pub canvases: Vec<String>,
}

/// Counts live widgets. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct CountingCharts {
  log: Rc<RefCell<ChartLog>>,
  failing_on: Option<ChartKind>,
}

impl CountingCharts {
  #[must_use]
  pub fn failing_on(mut self, kind: ChartKind) -> Self {
    self.failing_on = Some(kind);
    self
  }

  #[must_use]
  pub fn log(&self) -> ChartLog {
    self.log.borrow().clone()
  }
}

pub struct CountingWidget<D> {
  log: Rc<RefCell<ChartLog>>,
  data: D,
}

impl ChartWidget for CountingWidget<Vec<f64>> {
  type Data = Vec<f64>;

  fn set_data(&mut self, data: Vec<f64>) {
    self.data = data;
  }

  fn update(&mut self) -> Result<(), ChartError> {
    let mut log = self.log.borrow_mut();
    log.updates += 1;
    log.last_line = Some(self.data.clone());
    Ok(())
  }

  fn destroy(self) {
    let mut log = self.log.borrow_mut();
    log.live_lines -= 1;
    log.destroyed += 1;
  }
}

impl ChartWidget for CountingWidget<[f64; 2]> {
  type Data = [f64; 2];

  fn set_data(&mut self, data: [f64; 2]) {
    self.data = data;
  }

  fn update(&mut self) -> Result<(), ChartError> {
    let mut log = self.log.borrow_mut();
    log.updates += 1;
    log.last_ring = Some(self.data);
    Ok(())
  }

  fn destroy(self) {
    let mut log = self.log.borrow_mut();
    log.live_rings -= 1;
    log.destroyed += 1;
  }
}

impl ChartFactory for CountingCharts {
  type Line = CountingWidget<Vec<f64>>;
  type Ring = CountingWidget<[f64; 2]>;

  fn line_chart(&mut self, spec: LineChartSpec) -> Result<Self::Line, ChartError> {
    if self.failing_on == Some(ChartKind::Line) {
      return Err(ChartError::MissingCanvas(spec.canvas));
    }
    let mut log = self.log.borrow_mut();
    log.live_lines += 1;
    log.created_lines += 1;
    log.last_line = Some(spec.values.clone());
    log.canvases.push(spec.canvas);
    Ok(CountingWidget {
      log: Rc::clone(&self.log),
      data: spec.values,
    })
  }

  fn ring_chart(&mut self, spec: RingChartSpec) -> Result<Self::Ring, ChartError> {
    if self.failing_on == Some(ChartKind::Ring) {
      return Err(ChartError::MissingCanvas(spec.canvas));
    }
    let mut log = self.log.borrow_mut();
    log.live_rings += 1;
    log.created_rings += 1;
    log.last_ring = Some(spec.data);
    log.canvases.push(spec.canvas);
    Ok(CountingWidget {
      log: Rc::clone(&self.log),
      data: spec.data,
    })
  }
}
