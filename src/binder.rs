use std::{collections::HashMap, fmt::Display, sync::Arc};

use crate::{
  map::{
    coordinates::BoundingBox,
    geometry_collection::{FeatureCollection, Geometry},
  },
  profile_scope,
  stats::{StatRecord, StatisticsIndex, YearValue},
};

/// Strips every character that is not a Unicode letter or digit. Names made only of other
/// characters become `"unknown"`.
///
/// Names differing only in punctuation or whitespace collide.
#[must_use]
pub fn safe_id(name: &str) -> String {
  let id: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
  if id.is_empty() {
    "unknown".to_string()
  } else {
    id
  }
}

/// Dense index of a region in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub usize);

impl Display for RegionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A boundary joined with the statistics record of the same name, if there is one.
#[derive(Debug, Clone)]
pub struct BoundRegion {
  pub id: RegionId,
  pub name: String,
  pub geometry: Geometry,
  pub record: Option<Arc<StatRecord>>,
  pub safe_id: String,
  bounding_box: BoundingBox,
}

impl BoundRegion {
  #[must_use]
  pub fn has_record(&self) -> bool {
    self.record.is_some()
  }

  #[must_use]
  pub fn value(&self, year: i32) -> Option<YearValue> {
    self.record.as_ref()?.value(year)
  }

  #[must_use]
  pub fn percentage(&self, year: i32) -> Option<f64> {
    self.value(year).map(|v| v.percentage)
  }

  /// Record label when resolved, otherwise the feature name.
  #[must_use]
  pub fn title(&self) -> &str {
    self
      .record
      .as_ref()
      .map_or(self.name.as_str(), |record| record.region_label.as_str())
  }

  #[must_use]
  pub fn bounding_box(&self) -> &BoundingBox {
    &self.bounding_box
  }

  #[must_use]
  pub fn info_element(&self) -> String {
    format!("info-{}", self.safe_id)
  }

  #[must_use]
  pub fn chart_element(&self) -> String {
    format!("chart-{}", self.safe_id)
  }

  #[must_use]
  pub fn ring_element(&self) -> String {
    format!("ring-{}", self.safe_id)
  }

  #[must_use]
  pub fn ring_title_element(&self) -> String {
    format!("ring-title-{}", self.safe_id)
  }
}

/// Joins every feature with the first statistics record carrying its name.
#[must_use]
pub fn bind(collection: FeatureCollection, index: &StatisticsIndex) -> Vec<BoundRegion> {
  profile_scope!("bind");
  let mut seen_ids: HashMap<String, String> = HashMap::new();
  let regions: Vec<BoundRegion> = collection
    .features
    .into_iter()
    .enumerate()
    .map(|(i, feature)| {
      let record = index.find_by_label(&feature.name);
      if record.is_none() {
        log::debug!("No statistics for region '{}'", feature.name);
      }
      let safe_id = safe_id(&feature.name);
      if let Some(other) = seen_ids.insert(safe_id.clone(), feature.name.clone())
        && other != feature.name
      {
        log::warn!(
          "Regions '{other}' and '{}' share the element id '{safe_id}'",
          feature.name
        );
      }
      BoundRegion {
        id: RegionId(i),
        bounding_box: feature.geometry.bounding_box(),
        name: feature.name,
        geometry: feature.geometry,
        record,
        safe_id,
      }
    })
    .collect();

  log::info!(
    "Bound {} regions, {} with statistics",
    regions.len(),
    regions.iter().filter(|r| r.has_record()).count()
  );
  regions
}
