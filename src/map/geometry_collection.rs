use geo_types::{LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use super::{
  color::Rgba,
  coordinates::{BoundingBox, Coord, normalize_coord},
};

/// Path style of a region outline and fill. Unset fields fall back to the map widget's path
/// defaults, so a `Style` doubles as a partial patch for [`Style::overwrite_with`].
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
  #[serde(skip_serializing_if = "Option::is_none")]
  color: Option<Rgba>,
  #[serde(skip_serializing_if = "Option::is_none")]
  weight: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  opacity: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  fill_color: Option<Rgba>,
  #[serde(skip_serializing_if = "Option::is_none")]
  fill_opacity: Option<f32>,
}

/// Style every region starts with before any data is applied.
pub const BASE_STYLE: Style = Style {
  color: Some(Rgba::GRAY),
  weight: Some(2.),
  opacity: Some(0.8),
  fill_color: Some(Rgba::TRANSPARENT),
  fill_opacity: Some(0.),
};

/// Regions without a record, or without a value for the selected year.
pub const NO_DATA_STYLE: Style = Style {
  color: Some(Rgba::rgb(153, 153, 153)),
  weight: Some(1.),
  opacity: Some(0.3),
  fill_color: Some(Rgba::rgb(204, 204, 204)),
  fill_opacity: Some(0.3),
};

/// Outline patch applied to every region when another one gets activated.
pub const OUTLINE_STYLE: Style = Style {
  color: Some(Rgba::GRAY),
  weight: Some(1.),
  opacity: Some(0.7),
  fill_color: None,
  fill_opacity: None,
};

/// Outline patch of the activated region.
pub const HIGHLIGHT_STYLE: Style = Style {
  color: Some(Rgba::rgb(234, 59, 0)),
  weight: Some(3.),
  opacity: Some(1.),
  fill_color: None,
  fill_opacity: None,
};

const CLASSIFIED_OUTLINE: Rgba = Rgba::rgb(192, 255, 216);
const PATH_DEFAULT_COLOR: Rgba = Rgba::rgb(51, 136, 255);

impl Style {
  /// Style of a region whose value fell into the bucket colored `fill`.
  #[must_use]
  pub fn classified(fill: Rgba) -> Self {
    Self {
      color: Some(CLASSIFIED_OUTLINE),
      weight: Some(1.),
      opacity: Some(0.5),
      fill_color: Some(fill),
      fill_opacity: Some(0.7),
    }
  }

  #[must_use]
  pub fn with_color(mut self, color: Rgba) -> Self {
    self.color = Some(color);
    self
  }

  #[must_use]
  pub fn with_weight(mut self, weight: f32) -> Self {
    self.weight = Some(weight);
    self
  }

  #[must_use]
  pub fn with_opacity(mut self, opacity: f32) -> Self {
    self.opacity = Some(opacity);
    self
  }

  #[must_use]
  pub fn with_fill_color(mut self, fill_color: Rgba) -> Self {
    self.fill_color = Some(fill_color);
    self
  }

  #[must_use]
  pub fn with_fill_opacity(mut self, fill_opacity: f32) -> Self {
    self.fill_opacity = Some(fill_opacity);
    self
  }

  /// Returns `self` with every field that `patch` sets replaced.
  #[must_use]
  pub fn overwrite_with(&self, patch: &Style) -> Style {
    Style {
      color: patch.color.or(self.color),
      weight: patch.weight.or(self.weight),
      opacity: patch.opacity.or(self.opacity),
      fill_color: patch.fill_color.or(self.fill_color),
      fill_opacity: patch.fill_opacity.or(self.fill_opacity),
    }
  }

  #[must_use]
  pub fn color(&self) -> Rgba {
    self.color.unwrap_or(PATH_DEFAULT_COLOR)
  }

  #[must_use]
  pub fn weight(&self) -> f32 {
    self.weight.unwrap_or(3.)
  }

  #[must_use]
  pub fn opacity(&self) -> f32 {
    self.opacity.unwrap_or(1.)
  }

  #[must_use]
  pub fn fill_color(&self) -> Rgba {
    self.fill_color.unwrap_or_else(|| self.color())
  }

  #[must_use]
  pub fn fill_opacity(&self) -> f32 {
    self.fill_opacity.unwrap_or(0.2)
  }
}

/// Boundary geometry of a region.
#[derive(Clone, PartialEq, Debug)]
pub enum Geometry {
  Point(Coord),
  Ring(LineString<f64>),
  Polygon(Polygon<f64>),
  MultiPolygon(MultiPolygon<f64>),
}

fn normalize_ring(ring: LineString<f64>) -> LineString<f64> {
  ring.into_iter().map(normalize_coord).collect()
}

fn normalize_polygon(polygon: Polygon<f64>) -> Polygon<f64> {
  let (exterior, interiors) = polygon.into_inner();
  Polygon::new(
    normalize_ring(exterior),
    interiors.into_iter().map(normalize_ring).collect(),
  )
}

impl Geometry {
  /// Applies [`normalize_coord`] to every pair, keeping the shape.
  #[must_use]
  pub fn normalized(self) -> Self {
    match self {
      Geometry::Point(coord) => Geometry::Point(normalize_coord(coord)),
      Geometry::Ring(ring) => Geometry::Ring(normalize_ring(ring)),
      Geometry::Polygon(polygon) => Geometry::Polygon(normalize_polygon(polygon)),
      Geometry::MultiPolygon(polygons) => {
        Geometry::MultiPolygon(polygons.into_iter().map(normalize_polygon).collect())
      }
    }
  }

  /// Nesting depth of the GeoJSON coordinate array this geometry came from.
  #[must_use]
  pub fn depth(&self) -> usize {
    match self {
      Geometry::Point(_) => 1,
      Geometry::Ring(_) => 2,
      Geometry::Polygon(_) => 3,
      Geometry::MultiPolygon(_) => 4,
    }
  }

  /// Number of coordinate pairs.
  #[must_use]
  pub fn leaf_count(&self) -> usize {
    match self {
      Geometry::Point(_) => 1,
      _ => self.rings().iter().map(|ring| ring.0.len()).sum(),
    }
  }

  /// All rings, exteriors and holes alike.
  #[must_use]
  pub fn rings(&self) -> Vec<&LineString<f64>> {
    match self {
      Geometry::Point(_) => Vec::new(),
      Geometry::Ring(ring) => vec![ring],
      Geometry::Polygon(polygon) => std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect(),
      Geometry::MultiPolygon(polygons) => polygons
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .collect(),
    }
  }

  pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
    let point = match self {
      Geometry::Point(coord) => Some(*coord),
      _ => None,
    };
    point
      .into_iter()
      .chain(self.rings().into_iter().flat_map(|ring| ring.0.iter().copied()))
  }

  #[must_use]
  pub fn bounding_box(&self) -> BoundingBox {
    BoundingBox::from_iterator(self.coords())
  }
}

/// A named region boundary as read from a boundary source.
#[derive(Clone, PartialEq, Debug)]
pub struct GeometryFeature {
  pub name: String,
  pub geometry: Geometry,
}

impl GeometryFeature {
  #[must_use]
  pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
    Self {
      name: name.into(),
      geometry,
    }
  }

  #[must_use]
  pub fn normalized(self) -> Self {
    Self {
      name: self.name,
      geometry: self.geometry.normalized(),
    }
  }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct FeatureCollection {
  pub features: Vec<GeometryFeature>,
}

impl FeatureCollection {
  #[must_use]
  pub fn len(&self) -> usize {
    self.features.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use assert_approx_eq::assert_approx_eq;
  use geo_types::{line_string, polygon};

  use super::*;
  use crate::map::coordinates::lng_lat;

  fn chukotka() -> Polygon<f64> {
    polygon![
      (x: 176.0, y: 64.0),
      (x: -178.0, y: 64.0),
      (x: -178.0, y: 66.0),
      (x: 176.0, y: 66.0),
      (x: 176.0, y: 64.0),
    ]
  }

  #[test]
  fn test_multipolygon_normalization_keeps_shape() {
    let geometry = Geometry::MultiPolygon(MultiPolygon(vec![
      chukotka(),
      polygon![
        (x: 20.0, y: 54.0),
        (x: 22.0, y: 54.0),
        (x: 22.0, y: 55.0),
        (x: 20.0, y: 54.0),
      ],
    ]));
    let depth = geometry.depth();
    let leaves = geometry.leaf_count();

    let normalized = geometry.normalized();
    assert_eq!(normalized.depth(), depth);
    assert_eq!(normalized.leaf_count(), leaves);

    let bb = normalized.bounding_box();
    assert_approx_eq!(bb.min().x, 20.);
    assert_approx_eq!(bb.max().x, 182.);
    assert!(normalized.coords().all(|c| c.x >= 0.));
  }

  #[test]
  fn test_polygon_with_hole_normalization() {
    let polygon = Polygon::new(
      line_string![
        (x: -10.0, y: 0.0),
        (x: 10.0, y: 0.0),
        (x: 10.0, y: 10.0),
        (x: -10.0, y: 0.0),
      ],
      vec![line_string![
        (x: -1.0, y: 1.0),
        (x: 1.0, y: 1.0),
        (x: 1.0, y: 2.0),
        (x: -1.0, y: 1.0),
      ]],
    );
    let normalized = Geometry::Polygon(polygon).normalized();
    let Geometry::Polygon(normalized) = normalized else {
      panic!("shape must not change");
    };
    assert_approx_eq!(normalized.exterior().0[0].x, 350.);
    assert_approx_eq!(normalized.interiors()[0].0[0].x, 359.);
    assert_approx_eq!(normalized.interiors()[0].0[1].x, 1.);
  }

  #[test]
  fn test_point_normalization() {
    let point = Geometry::Point(lng_lat(-170., 65.)).normalized();
    assert_eq!(point, Geometry::Point(lng_lat(190., 65.)));
    assert_eq!(point.depth(), 1);
    assert_eq!(point.leaf_count(), 1);
  }

  #[test]
  fn test_style_overwrite() {
    let highlighted = Style::classified(Rgba::rgb(3, 138, 59)).overwrite_with(&HIGHLIGHT_STYLE);
    assert_eq!(highlighted.fill_color(), Rgba::rgb(3, 138, 59));
    assert_approx_eq!(highlighted.fill_opacity(), 0.7);
    assert_eq!(highlighted.color(), Rgba::rgb(234, 59, 0));
    assert_approx_eq!(highlighted.weight(), 3.);
    assert_approx_eq!(highlighted.opacity(), 1.);

    let reset = highlighted.overwrite_with(&OUTLINE_STYLE);
    assert_eq!(reset.color(), Rgba::GRAY);
    assert_eq!(reset.fill_color(), Rgba::rgb(3, 138, 59));
  }

  #[test]
  fn test_unset_style_falls_back_to_path_defaults() {
    let style = Style::default();
    assert_approx_eq!(style.weight(), 3.);
    assert_eq!(style.fill_color(), style.color());
  }
}
