use serde::{Deserialize, Serialize};

use crate::{
  binder::BoundRegion,
  map::{color::Rgba, coordinates::Coord},
};

/// Weighted point of the heat layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
  pub position: Coord,
  /// Percentage scaled to `[0, 1]`.
  pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatLayerOptions {
  /// Point radius in pixels.
  pub radius: f32,
  pub blur: f32,
  /// Zoom at which points reach full intensity.
  pub max_zoom: u8,
  pub min_opacity: f32,
  /// Weight mapped to the top of the gradient.
  pub max: f64,
  pub gradient: Vec<(f32, Rgba)>,
}

impl Default for HeatLayerOptions {
  fn default() -> Self {
    Self {
      radius: 40.,
      blur: 5.,
      max_zoom: 10,
      min_opacity: 0.3,
      max: 1.,
      gradient: vec![
        (0.1, Rgba::rgb(212, 255, 100)),
        (0.3, Rgba::rgb(136, 255, 100)),
        (0.5, Rgba::rgb(86, 245, 96)),
        (0.7, Rgba::rgb(45, 218, 105)),
        (0.9, Rgba::rgb(14, 178, 109)),
      ],
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatLayer {
  pub points: Vec<HeatPoint>,
  pub options: HeatLayerOptions,
}

/// One point per region with a value for `year`, anchored at the center of its bounds.
#[must_use]
pub fn heat_points(regions: &[BoundRegion], year: i32) -> Vec<HeatPoint> {
  regions
    .iter()
    .filter_map(|region| {
      let percentage = region.percentage(year)?;
      Some(HeatPoint {
        position: region.bounding_box().center(),
        weight: percentage / 100.,
      })
    })
    .collect()
}

/// The heat layer for `year`, `None` if no region has a value.
#[must_use]
pub fn build_heat_layer(
  regions: &[BoundRegion],
  year: i32,
  options: &HeatLayerOptions,
) -> Option<HeatLayer> {
  let points = heat_points(regions, year);
  (!points.is_empty()).then(|| HeatLayer {
    points,
    options: options.clone(),
  })
}

#[cfg(test)]
mod tests {
  use assert_approx_eq::assert_approx_eq;
  use geo_types::polygon;

  use super::*;
  use crate::{
    binder::bind,
    map::geometry_collection::{FeatureCollection, Geometry, GeometryFeature},
    stats::StatisticsIndex,
  };

  fn regions() -> Vec<BoundRegion> {
    let index = StatisticsIndex::from_json(
      br#"{
        "a": {"region": "A", "data": {"2020": [80], "2021": [90]}},
        "b": {"region": "B", "data": {"2021": [50]}}
      }"#,
    )
    .unwrap();
    let square = |x: f64| {
      Geometry::Polygon(polygon![
        (x: x, y: 60.0),
        (x: x + 10.0, y: 60.0),
        (x: x + 10.0, y: 70.0),
        (x: x, y: 60.0),
      ])
    };
    let collection = FeatureCollection {
      features: vec![
        GeometryFeature::new("A", square(170.)),
        GeometryFeature::new("B", square(30.)),
        GeometryFeature::new("C", square(50.)),
      ],
    };
    bind(collection, &index)
  }

  #[test]
  fn test_points_at_bounds_center() {
    let points = heat_points(&regions(), 2020);
    assert_eq!(points.len(), 1);
    assert_approx_eq!(points[0].position.x, 175.);
    assert_approx_eq!(points[0].position.y, 65.);
    assert_approx_eq!(points[0].weight, 0.8);
  }

  #[test]
  fn test_layer_per_year() {
    let options = HeatLayerOptions::default();
    let layer = build_heat_layer(&regions(), 2021, &options).unwrap();
    let weights: Vec<_> = layer.points.iter().map(|p| p.weight).collect();
    assert_eq!(weights, [0.9, 0.5]);
    assert!(build_heat_layer(&regions(), 2023, &options).is_none());
  }

  #[test]
  fn test_default_options() {
    let options = HeatLayerOptions::default();
    assert_approx_eq!(options.radius, 40.);
    assert_approx_eq!(options.blur, 5.);
    assert_eq!(options.max_zoom, 10);
    assert_approx_eq!(options.min_opacity, 0.3);
    assert_eq!(options.gradient.len(), 5);
  }
}
