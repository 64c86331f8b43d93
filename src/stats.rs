use std::{collections::BTreeMap, sync::Arc};

use thiserror::Error;

use crate::parser::StatisticsParser;

#[derive(Debug, Error)]
pub enum StatisticsError {
  #[error("malformed statistics JSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error("statistics must be an object keyed by record id")]
  NotATable,
}

/// Statistic of one region in one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearValue {
  /// Broadband penetration in percent.
  pub percentage: f64,
  pub households: Option<f64>,
}

/// Yearly series of one region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatRecord {
  /// Display name, the key boundary features are joined on.
  pub region_label: String,
  pub series: BTreeMap<i32, YearValue>,
}

impl StatRecord {
  #[must_use]
  pub fn value(&self, year: i32) -> Option<YearValue> {
    self.series.get(&year).copied()
  }

  #[must_use]
  pub fn percentage(&self, year: i32) -> Option<f64> {
    self.value(year).map(|v| v.percentage)
  }

  /// All years with a value, ascending.
  pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
    self.series.keys().copied()
  }

  /// Percentages in year order.
  pub fn percentages(&self) -> impl Iterator<Item = f64> + '_ {
    self.series.values().map(|v| v.percentage)
  }
}

/// Statistics table in document order.
///
/// Records are shared, every region bound to a record holds the same allocation.
#[derive(Debug, Clone, Default)]
pub struct StatisticsIndex {
  entries: Vec<(String, Arc<StatRecord>)>,
}

impl StatisticsIndex {
  #[must_use]
  pub fn from_entries(entries: Vec<(String, StatRecord)>) -> Self {
    Self {
      entries: entries
        .into_iter()
        .map(|(id, record)| (id, Arc::new(record)))
        .collect(),
    }
  }

  /// # Errors
  /// If `bytes` is not a statistics table.
  pub fn from_json(bytes: &[u8]) -> Result<Self, StatisticsError> {
    let index = Self::from_entries(StatisticsParser.parse(bytes)?);
    log::debug!("Loaded {} statistics records", index.len());
    Ok(index)
  }

  /// First record whose label equals `label` byte for byte.
  #[must_use]
  pub fn find_by_label(&self, label: &str) -> Option<Arc<StatRecord>> {
    self
      .entries
      .iter()
      .find(|(_, record)| record.region_label == label)
      .map(|(_, record)| Arc::clone(record))
  }

  #[must_use]
  pub fn get(&self, id: &str) -> Option<Arc<StatRecord>> {
    self
      .entries
      .iter()
      .find(|(entry_id, _)| entry_id == id)
      .map(|(_, record)| Arc::clone(record))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &StatRecord)> {
    self
      .entries
      .iter()
      .map(|(id, record)| (id.as_str(), record.as_ref()))
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
