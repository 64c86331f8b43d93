use std::{
  f32::consts::{FRAC_PI_2, TAU},
  path::{Path, PathBuf},
};

use itertools::{Itertools, MinMaxResult};
use tiny_skia::{
  FillRule, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, SpreadMode, Stroke,
  Transform,
};

use super::{RenderError, create_dir, new_pixmap, write_png};
use crate::{
  config::RasterConfig,
  map::color::Rgba,
  viz::charts::{ChartError, ChartFactory, ChartWidget, LineChartSpec, RingChartSpec},
};

const MARGIN: f32 = 12.;
const POINT_RADIUS: f32 = 3.;
const TICK_LENGTH: f32 = 5.;
/// Segments of a full circle.
const ARC_STEPS: f32 = 180.;

fn chart_error(canvas: &str, e: &RenderError) -> ChartError {
  ChartError::Draw {
    canvas: canvas.to_string(),
    message: e.to_string(),
  }
}

/// Builds chart widgets that write `<canvas>.png` into an output directory on every redraw.
#[derive(Debug, Clone)]
pub struct RasterCharts {
  output_dir: PathBuf,
  line_size: (u32, u32),
  ring_size: u32,
}

impl RasterCharts {
  /// # Errors
  /// If the output directory cannot be created.
  pub fn new(config: &RasterConfig) -> Result<Self, RenderError> {
    create_dir(&config.output_dir)?;
    Ok(Self {
      output_dir: config.output_dir.clone(),
      line_size: (config.chart_width, config.chart_height),
      ring_size: config.ring_size,
    })
  }

  fn canvas_path(&self, canvas: &str) -> PathBuf {
    self.output_dir.join(format!("{canvas}.png"))
  }
}

impl ChartFactory for RasterCharts {
  type Line = RasterLineChart;
  type Ring = RasterRingChart;

  fn line_chart(&mut self, spec: LineChartSpec) -> Result<Self::Line, ChartError> {
    let (width, height) = self.line_size;
    let pixmap = new_pixmap(width, height).map_err(|e| chart_error(&spec.canvas, &e))?;
    let mut chart = RasterLineChart {
      path: self.canvas_path(&spec.canvas),
      spec,
      pixmap,
    };
    chart.update()?;
    Ok(chart)
  }

  fn ring_chart(&mut self, spec: RingChartSpec) -> Result<Self::Ring, ChartError> {
    let pixmap =
      new_pixmap(self.ring_size, self.ring_size).map_err(|e| chart_error(&spec.canvas, &e))?;
    let mut chart = RasterRingChart {
      path: self.canvas_path(&spec.canvas),
      spec,
      pixmap,
    };
    chart.update()?;
    Ok(chart)
  }
}

/// Line chart of a region's series.
#[derive(Debug)]
pub struct RasterLineChart {
  spec: LineChartSpec,
  path: PathBuf,
  pixmap: Pixmap,
}

impl RasterLineChart {
  #[must_use]
  pub fn path(&self) -> &Path {
    &self.path
  }

  #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
  fn points(&self) -> Vec<Point> {
    let width = self.pixmap.width() as f32 - 2. * MARGIN;
    let height = self.pixmap.height() as f32 - 2. * MARGIN - TICK_LENGTH;
    let (low, high) = match self.spec.values.iter().copied().minmax_by(f64::total_cmp) {
      MinMaxResult::NoElements => return Vec::new(),
      MinMaxResult::OneElement(v) => (v - 1., v + 1.),
      MinMaxResult::MinMax(low, high) if high - low < f64::EPSILON => (low - 1., high + 1.),
      MinMaxResult::MinMax(low, high) => (low, high),
    };
    let step = if self.spec.values.len() > 1 {
      width / (self.spec.values.len() - 1) as f32
    } else {
      0.
    };
    self
      .spec
      .values
      .iter()
      .enumerate()
      .map(|(i, v)| {
        let t = ((v - low) / (high - low)) as f32;
        Point::from_xy(MARGIN + step * i as f32, MARGIN + height * (1. - t))
      })
      .collect()
  }

  #[allow(clippy::cast_precision_loss)]
  fn draw(&mut self) {
    self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    let points = self.points();
    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color(self.spec.border_color.to_color(1.));

    if let Some(path) = spline(&points, self.spec.tension) {
      let stroke = Stroke {
        width: self.spec.border_width,
        ..Stroke::default()
      };
      self
        .pixmap
        .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    let mut dots = PathBuilder::new();
    for point in &points {
      dots.push_circle(point.x, point.y, POINT_RADIUS);
    }
    let baseline = self.pixmap.height() as f32 - MARGIN;
    let mut ticks = PathBuilder::new();
    for (i, point) in points.iter().enumerate() {
      if self.spec.tick_label(i).is_some() {
        ticks.move_to(point.x, baseline);
        ticks.line_to(point.x, baseline + TICK_LENGTH);
      }
    }
    if let Some(dots) = dots.finish() {
      self
        .pixmap
        .fill_path(&dots, &paint, FillRule::Winding, Transform::identity(), None);
    }
    if let Some(ticks) = ticks.finish() {
      paint.set_color(Rgba::GRAY.to_color(1.));
      self
        .pixmap
        .stroke_path(&ticks, &paint, &Stroke::default(), Transform::identity(), None);
    }
  }
}

/// Cubic segments through `points`, control points pulled towards the neighbours by `tension`.
fn spline(points: &[Point], tension: f32) -> Option<tiny_skia::Path> {
  let (first, rest) = points.split_first()?;
  if rest.is_empty() {
    return None;
  }
  let mut pb = PathBuilder::new();
  pb.move_to(first.x, first.y);

  let controls: Vec<(Point, Point)> = (0..points.len())
    .map(|i| {
      let previous = points[i.saturating_sub(1)];
      let current = points[i];
      let next = points[(i + 1).min(points.len() - 1)];
      let d01 = previous.distance(current);
      let d12 = current.distance(next);
      let total = d01 + d12;
      let (fa, fb) = if total > 0. {
        (tension * d01 / total, tension * d12 / total)
      } else {
        (0., 0.)
      };
      (
        Point::from_xy(
          current.x - fa * (next.x - previous.x),
          current.y - fa * (next.y - previous.y),
        ),
        Point::from_xy(
          current.x + fb * (next.x - previous.x),
          current.y + fb * (next.y - previous.y),
        ),
      )
    })
    .collect();

  for (i, point) in rest.iter().enumerate() {
    let out = controls[i].1;
    let into = controls[i + 1].0;
    pb.cubic_to(out.x, out.y, into.x, into.y, point.x, point.y);
  }
  pb.finish()
}

impl ChartWidget for RasterLineChart {
  type Data = Vec<f64>;

  fn set_data(&mut self, data: Vec<f64>) {
    self.spec.values = data;
  }

  fn update(&mut self) -> Result<(), ChartError> {
    self.draw();
    write_png(&self.pixmap, &self.path).map_err(|e| chart_error(&self.spec.canvas, &e))
  }

  fn destroy(self) {
    log::debug!("Released {}", self.spec.canvas);
  }
}

/// Ring showing the current value against the remainder to 100.
#[derive(Debug)]
pub struct RasterRingChart {
  spec: RingChartSpec,
  path: PathBuf,
  pixmap: Pixmap,
}

impl RasterRingChart {
  #[must_use]
  pub fn path(&self) -> &Path {
    &self.path
  }

  #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
  fn draw(&mut self) {
    self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    let size = self.pixmap.width() as f32;
    let center = size / 2.;
    let outer = center - 2.;
    let inner = outer * self.spec.cutout;

    let [value, remainder] = self.spec.data;
    let total = value + remainder;
    let share = if total > 0. { (value / total) as f32 } else { 0. };

    let stops = self
      .spec
      .gradient
      .iter()
      .map(|(stop, color)| GradientStop::new(*stop, color.to_color(1.)))
      .collect();
    let mut value_paint = Paint::default();
    value_paint.anti_alias = true;
    value_paint.shader = LinearGradient::new(
      Point::from_xy(0., 0.),
      Point::from_xy(size, size),
      stops,
      SpreadMode::Pad,
      Transform::identity(),
    )
    .unwrap_or_else(|| tiny_skia::Shader::SolidColor(Rgba::GRAY.to_color(1.)));

    let mut remainder_paint = Paint::default();
    remainder_paint.anti_alias = true;
    remainder_paint.set_color(self.spec.remainder.to_color(1.));

    let start = -FRAC_PI_2;
    let split = start + share * TAU;
    for (from, to, paint) in [
      (start, split, &value_paint),
      (split, start + TAU, &remainder_paint),
    ] {
      if let Some(path) = ring_segment(center, inner, outer, from, to) {
        self
          .pixmap
          .fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
      }
    }
  }
}

/// Closed band between radii `inner` and `outer` from angle `from` to `to`, clockwise on
/// screen.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ring_segment(center: f32, inner: f32, outer: f32, from: f32, to: f32) -> Option<tiny_skia::Path> {
  if to - from <= f32::EPSILON {
    return None;
  }
  let steps = ((to - from) / TAU * ARC_STEPS).ceil().max(1.) as usize;
  let at = |radius: f32, i: usize| {
    let angle = from + (to - from) * i as f32 / steps as f32;
    (center + radius * angle.cos(), center + radius * angle.sin())
  };

  let mut pb = PathBuilder::new();
  let (x, y) = at(outer, 0);
  pb.move_to(x, y);
  for i in 1..=steps {
    let (x, y) = at(outer, i);
    pb.line_to(x, y);
  }
  for i in (0..=steps).rev() {
    let (x, y) = at(inner, i);
    pb.line_to(x, y);
  }
  pb.close();
  pb.finish()
}

impl ChartWidget for RasterRingChart {
  type Data = [f64; 2];

  fn set_data(&mut self, data: [f64; 2]) {
    self.spec.data = data;
  }

  fn update(&mut self) -> Result<(), ChartError> {
    self.draw();
    write_png(&self.pixmap, &self.path).map_err(|e| chart_error(&self.spec.canvas, &e))
  }

  fn destroy(self) {
    log::debug!("Released {}", self.spec.canvas);
  }
}
