use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
  profile_scope,
  stats::{StatRecord, StatisticsError, YearValue},
};

/// Reads the statistics table `{id: {region, data: {"<year>": [percentage, households?]}}}`.
///
/// Entries keep the order of the document. Records without a `region` label are skipped, years
/// that are not integers or carry no percentage are dropped from their record.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticsParser;

impl StatisticsParser {
  /// # Errors
  /// If `bytes` is not a JSON object.
  pub fn parse(self, bytes: &[u8]) -> Result<Vec<(String, StatRecord)>, StatisticsError> {
    profile_scope!("StatisticsParser::parse");
    let table: Map<String, Value> = match serde_json::from_slice(bytes)? {
      Value::Object(table) => table,
      _ => return Err(StatisticsError::NotATable),
    };

    Ok(
      table
        .into_iter()
        .filter_map(|(id, entry)| match Self::parse_record(&entry) {
          Some(record) => Some((id, record)),
          None => {
            log::warn!("Skipping statistics entry {id}: no region label");
            None
          }
        })
        .collect(),
    )
  }

  fn parse_record(entry: &Value) -> Option<StatRecord> {
    let region_label = entry.get("region")?.as_str()?.to_string();
    let series: BTreeMap<i32, YearValue> = entry
      .get("data")
      .and_then(Value::as_object)
      .map(|data| {
        data
          .iter()
          .filter_map(|(year, value)| {
            let parsed = year
              .trim()
              .parse::<i32>()
              .ok()
              .zip(Self::parse_year_value(value));
            if parsed.is_none() {
              log::debug!("{region_label}: ignoring year entry {year} = {value}");
            }
            parsed
          })
          .collect()
      })
      .unwrap_or_default();
    Some(StatRecord {
      region_label,
      series,
    })
  }

  fn parse_year_value(value: &Value) -> Option<YearValue> {
    let values = value.as_array()?;
    Some(YearValue {
      percentage: values.first()?.as_f64()?,
      households: values.get(1).and_then(Value::as_f64),
    })
  }
}
