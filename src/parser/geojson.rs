use geo_types::{LineString, MultiPolygon, Polygon};
use serde_json::Value;
use thiserror::Error;

use crate::{
  map::{
    coordinates::{Coord, lng_lat},
    geometry_collection::{FeatureCollection, Geometry, GeometryFeature},
  },
  profile_scope,
};

#[derive(Debug, Error)]
pub enum GeoJsonError {
  #[error("malformed JSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error("expected a FeatureCollection, got {0}")]
  NotFeatureCollection(String),
  #[error("FeatureCollection has no features array")]
  MissingFeatures,
}

/// Reads a `GeoJSON` `FeatureCollection` of region boundaries.
///
/// Features that cannot be read are logged and skipped, only a document that is not a feature
/// collection at all is an error.
#[derive(Debug, Clone)]
pub struct GeoJsonParser {
  source: String,
}

impl Default for GeoJsonParser {
  fn default() -> Self {
    Self::new("geojson")
  }
}

impl GeoJsonParser {
  /// `source` names the document in diagnostics.
  #[must_use]
  pub fn new(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
    }
  }

  /// # Errors
  /// If `bytes` is not JSON or not a feature collection.
  pub fn parse(&self, bytes: &[u8]) -> Result<FeatureCollection, GeoJsonError> {
    let value: Value = serde_json::from_slice(bytes)?;
    self.parse_value(&value)
  }

  /// # Errors
  /// If `value` is not a feature collection.
  pub fn parse_value(&self, value: &Value) -> Result<FeatureCollection, GeoJsonError> {
    profile_scope!("GeoJsonParser::parse_value");
    let geotype = value.get("type").and_then(Value::as_str).unwrap_or("nothing");
    if geotype != "FeatureCollection" {
      return Err(GeoJsonError::NotFeatureCollection(geotype.to_string()));
    }
    let features = value
      .get("features")
      .and_then(Value::as_array)
      .ok_or(GeoJsonError::MissingFeatures)?;

    let features = features
      .iter()
      .enumerate()
      .filter_map(|(i, feature)| {
        Self::parse_feature(feature)
          .inspect_err(|e| log::warn!("{}: skipping feature {i}: {e}", self.source))
          .ok()
      })
      .collect();
    Ok(FeatureCollection { features })
  }

  fn parse_feature(feature: &Value) -> Result<GeometryFeature, String> {
    let obj = feature.as_object().ok_or("feature must be an object")?;
    let name = Self::feature_name(obj.get("properties"));
    let geometry = obj
      .get("geometry")
      .filter(|g| !g.is_null())
      .ok_or_else(|| format!("feature '{name}' has no geometry"))?;
    let geometry = Self::parse_geometry(geometry).map_err(|e| format!("feature '{name}': {e}"))?;
    Ok(GeometryFeature::new(name, geometry))
  }

  /// `properties.name`, falling back to `properties.region`. The first non-empty one wins.
  fn feature_name(properties: Option<&Value>) -> String {
    ["name", "region"]
      .iter()
      .find_map(|key| properties?.get(key)?.as_str().filter(|s| !s.is_empty()))
      .unwrap_or_default()
      .to_string()
  }

  fn parse_geometry(geometry: &Value) -> Result<Geometry, String> {
    let geom_type = geometry
      .get("type")
      .and_then(Value::as_str)
      .ok_or("geometry without type")?;
    let coordinates = geometry
      .get("coordinates")
      .ok_or_else(|| format!("{geom_type} without coordinates"))?;

    let parsed = match geom_type {
      "Point" => Self::parse_coordinate(coordinates).map(Geometry::Point),
      "LineString" => Self::parse_ring(coordinates).map(Geometry::Ring),
      "Polygon" => Self::parse_polygon(coordinates).map(Geometry::Polygon),
      "MultiPolygon" => coordinates
        .as_array()
        .and_then(|polygons| {
          polygons
            .iter()
            .map(Self::parse_polygon)
            .collect::<Option<Vec<_>>>()
        })
        .map(|polygons| Geometry::MultiPolygon(MultiPolygon(polygons))),
      other => return Err(format!("unsupported geometry type {other}")),
    };
    parsed.ok_or_else(|| format!("invalid {geom_type} coordinates"))
  }

  fn parse_coordinate(value: &Value) -> Option<Coord> {
    match value.as_array()?.as_slice() {
      [lng, lat, ..] => Some(lng_lat(lng.as_f64()?, lat.as_f64()?)),
      _ => None,
    }
  }

  fn parse_ring(value: &Value) -> Option<LineString<f64>> {
    value
      .as_array()?
      .iter()
      .map(Self::parse_coordinate)
      .collect::<Option<Vec<_>>>()
      .filter(|coords| coords.len() >= 2)
      .map(LineString::from)
  }

  fn parse_polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value
      .as_array()?
      .iter()
      .map(Self::parse_ring)
      .collect::<Option<Vec<_>>>()?
      .into_iter();
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
  }
}
