mod geojson;
pub use geojson::{GeoJsonError, GeoJsonParser};
mod statistics;
pub use statistics::StatisticsParser;

#[cfg(test)]
pub mod test_utils;
