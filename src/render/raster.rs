use std::{collections::BTreeMap, path::Path};

use rayon::prelude::*;
use tiny_skia::{ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use super::{RenderError, new_pixmap, write_png};
use crate::{
  binder::{BoundRegion, RegionId},
  config::{RasterConfig, ViewportConfig},
  map::{
    color::{Rgba, gradient_at},
    coordinates::{BoundingBox, Coord, LatLngBounds, MercatorCoordinate, lng_lat},
    geometry_collection::{BASE_STYLE, Geometry, Style},
  },
  profile_scope,
  viz::{heatmap::HeatLayer, popup::PopupView, surface::MapSurface},
};

/// Degrees of margin around the regions.
const FRAME: f64 = 2.;
const POINT_RADIUS: f32 = 4.;

/// Maps coordinates of the normalized domain to pixels, Web Mercator scaled to fit a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
  min_x: f64,
  min_y: f64,
  scale: f64,
  offset_x: f64,
  offset_y: f64,
}

impl Projection {
  /// Fits `bounds` into a `width` x `height` canvas, centered, keeping the aspect ratio.
  #[must_use]
  pub fn fit(bounds: &LatLngBounds, width: u32, height: u32) -> Self {
    let north_west = MercatorCoordinate::from(lng_lat(bounds.west(), bounds.north()));
    let south_east = MercatorCoordinate::from(lng_lat(bounds.east(), bounds.south()));
    let span_x = (south_east.x - north_west.x).max(f64::EPSILON);
    let span_y = (south_east.y - north_west.y).max(f64::EPSILON);
    let (width, height) = (f64::from(width), f64::from(height));
    let scale = (width / span_x).min(height / span_y);
    Self {
      min_x: north_west.x,
      min_y: north_west.y,
      scale,
      offset_x: (width - span_x * scale) / 2.,
      offset_y: (height - span_y * scale) / 2.,
    }
  }

  #[must_use]
  #[allow(clippy::cast_possible_truncation)]
  pub fn project(&self, coord: Coord) -> (f32, f32) {
    let m = MercatorCoordinate::from(coord);
    (
      ((m.x - self.min_x) * self.scale + self.offset_x) as f32,
      ((m.y - self.min_y) * self.scale + self.offset_y) as f32,
    )
  }
}

/// A [`MapSurface`] drawing into a pixmap.
///
/// Popups are only recorded, there is no text rendering.
#[derive(Debug)]
pub struct RasterSurface {
  width: u32,
  height: u32,
  viewport: ViewportConfig,
  background: Rgba,
  styles: BTreeMap<RegionId, Style>,
  popups: BTreeMap<RegionId, PopupView>,
  heat_layer: Option<HeatLayer>,
  year_label: String,
}

impl RasterSurface {
  #[must_use]
  pub fn new(config: &RasterConfig, viewport: ViewportConfig) -> Self {
    Self {
      width: config.width,
      height: config.height,
      viewport,
      background: Rgba::WHITE,
      styles: BTreeMap::new(),
      popups: BTreeMap::new(),
      heat_layer: None,
      year_label: String::new(),
    }
  }

  #[must_use]
  pub fn year_label(&self) -> &str {
    &self.year_label
  }

  pub fn popups(&self) -> impl Iterator<Item = (RegionId, &PopupView)> {
    self.popups.iter().map(|(id, popup)| (*id, popup))
  }

  #[must_use]
  pub fn heat_layer(&self) -> Option<&HeatLayer> {
    self.heat_layer.as_ref()
  }

  /// Projection covering all regions plus a margin, never leaving the viewport's max bounds.
  #[must_use]
  pub fn projection(&self, regions: &[BoundRegion]) -> Projection {
    let mut data = regions
      .iter()
      .fold(BoundingBox::get_invalid(), |bb, region| {
        bb.extend(region.bounding_box())
      });
    let bounds = if data.is_valid() {
      data.frame(FRAME);
      LatLngBounds::from_box(&data).clamped_to(&self.viewport.max_bounds)
    } else {
      self.viewport.max_bounds
    };
    Projection::fit(&bounds, self.width, self.height)
  }

  /// Draws `regions` with their current styles, the heat layer on top.
  ///
  /// # Errors
  /// If the configured size is not a valid canvas.
  pub fn render(&self, regions: &[BoundRegion]) -> Result<Pixmap, RenderError> {
    profile_scope!("RasterSurface::render");
    let mut pixmap = new_pixmap(self.width, self.height)?;
    pixmap.fill(self.background.to_color(1.));
    let projection = self.projection(regions);

    for region in regions {
      let style = self.styles.get(&region.id).copied().unwrap_or(BASE_STYLE);
      draw_region(&mut pixmap, &projection, &region.geometry, &style);
    }

    if let Some(layer) = &self.heat_layer {
      self.draw_heat_layer(&mut pixmap, &projection, layer)?;
    }
    Ok(pixmap)
  }

  /// # Errors
  /// If rendering or writing fails.
  pub fn save_png(&self, regions: &[BoundRegion], path: &Path) -> Result<(), RenderError> {
    let pixmap = self.render(regions)?;
    write_png(&pixmap, path)?;
    log::info!("Wrote {}", path.display());
    Ok(())
  }

  /// Point alphas are composited and colored by the layer gradient. Each row is computed
  /// independently.
  #[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
  )]
  fn draw_heat_layer(
    &self,
    pixmap: &mut Pixmap,
    projection: &Projection,
    layer: &HeatLayer,
  ) -> Result<(), RenderError> {
    profile_scope!("RasterSurface::draw_heat_layer");
    let options = &layer.options;
    let zoom_steps = options
      .max_zoom
      .saturating_sub(self.viewport.zoom)
      .min(12);
    let zoom_factor = 1. / f64::from(1_u16 << zoom_steps);

    let sources: Vec<HeatSource> = layer
      .points
      .iter()
      .map(|point| {
        let (x, y) = projection.project(point.position);
        let alpha = (point.weight * zoom_factor / options.max) as f32;
        HeatSource {
          x,
          y,
          alpha: alpha.clamp(options.min_opacity, 1.),
        }
      })
      .collect();
    let reach = options.radius + options.blur;

    let mut overlay = new_pixmap(self.width, self.height)?;
    let width = self.width as usize;
    overlay
      .pixels_mut()
      .par_chunks_mut(width)
      .enumerate()
      .for_each(|(row, pixels)| {
        let y = row as f32 + 0.5;
        let near: Vec<&HeatSource> = sources
          .iter()
          .filter(|s| (s.y - y).abs() <= reach)
          .collect();
        if near.is_empty() {
          return;
        }
        for (column, pixel) in pixels.iter_mut().enumerate() {
          let x = column as f32 + 0.5;
          let transparency = near.iter().fold(1., |t, s| {
            let distance = (s.x - x).hypot(s.y - y);
            t * (1. - s.alpha * falloff(distance, options.radius, options.blur))
          });
          let intensity = 1. - transparency;
          if intensity <= 0. {
            continue;
          }
          let color = gradient_at(&options.gradient, intensity);
          *pixel = ColorU8::from_rgba(color.r, color.g, color.b, (intensity * 255.).round() as u8)
            .premultiply();
        }
      });

    pixmap.draw_pixmap(
      0,
      0,
      overlay.as_ref(),
      &PixmapPaint::default(),
      Transform::identity(),
      None,
    );
    Ok(())
  }
}

struct HeatSource {
  x: f32,
  y: f32,
  alpha: f32,
}

/// 1 within `radius - blur` of a point, 0 beyond `radius + blur`, smooth in between.
fn falloff(distance: f32, radius: f32, blur: f32) -> f32 {
  let inner = radius - blur;
  let outer = radius + blur;
  if distance <= inner {
    1.
  } else if distance >= outer {
    0.
  } else {
    let t = (outer - distance) / (outer - inner);
    t * t * (3. - 2. * t)
  }
}

fn region_path(projection: &Projection, geometry: &Geometry) -> Option<tiny_skia::Path> {
  let mut pb = PathBuilder::new();
  if let Geometry::Point(coord) = geometry {
    let (x, y) = projection.project(*coord);
    pb.push_circle(x, y, POINT_RADIUS);
  }
  let closed = !matches!(geometry, Geometry::Ring(_));
  for ring in geometry.rings() {
    let mut coords = ring.coords().map(|c| projection.project(*c));
    let Some((x, y)) = coords.next() else {
      continue;
    };
    pb.move_to(x, y);
    for (x, y) in coords {
      pb.line_to(x, y);
    }
    if closed {
      pb.close();
    }
  }
  pb.finish()
}

fn draw_region(pixmap: &mut Pixmap, projection: &Projection, geometry: &Geometry, style: &Style) {
  let Some(path) = region_path(projection, geometry) else {
    return;
  };
  let mut paint = Paint::default();
  paint.anti_alias = true;

  if !matches!(geometry, Geometry::Ring(_)) && style.fill_opacity() > 0. {
    paint.set_color(style.fill_color().to_color(style.fill_opacity()));
    pixmap.fill_path(
      &path,
      &paint,
      FillRule::EvenOdd,
      Transform::identity(),
      None,
    );
  }

  paint.set_color(style.color().to_color(style.opacity()));
  let stroke = Stroke {
    width: style.weight(),
    ..Stroke::default()
  };
  pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

impl MapSurface for RasterSurface {
  fn set_style(&mut self, region: RegionId, style: Style) {
    self.styles.insert(region, style);
  }

  fn open_popup(&mut self, region: RegionId, popup: &PopupView) {
    self.popups.insert(region, popup.clone());
  }

  fn close_popup(&mut self, region: RegionId) {
    self.popups.remove(&region);
  }

  fn set_heat_layer(&mut self, layer: Option<&HeatLayer>) {
    self.heat_layer = layer.cloned();
  }

  fn set_year_label(&mut self, label: &str) {
    self.year_label = label.to_string();
  }
}
